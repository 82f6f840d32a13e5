//! Application configuration.

use std::path::{Path, PathBuf};

use avsrt_model::{BlockConfig, GateConfig};
use serde::{Deserialize, Serialize};

use crate::error::{AvsrtError, AvsrtResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Language of the recognized speech (BCP 47 tag, e.g. "ja").
    pub language: String,

    /// Segment gate thresholds.
    pub gate: GateConfig,

    /// Block building and wrapping limits.
    pub blocks: BlockConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "avsrt_pipeline=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: "ja".to_string(),
            gate: GateConfig::default(),
            blocks: BlockConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Unlike [`AppConfig::load`], any
    /// failure is an error.
    pub fn load_from(path: &Path) -> AvsrtResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AvsrtError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            AvsrtError::config(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section for values the pipeline cannot work with.
    pub fn validate(&self) -> AvsrtResult<()> {
        if self.language.trim().is_empty() {
            return Err(AvsrtError::config("language must not be empty"));
        }
        self.gate
            .validate()
            .map_err(|e| AvsrtError::config(e.to_string()))?;
        self.blocks
            .validate()
            .map_err(|e| AvsrtError::config(e.to_string()))?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("avsrt").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"language": "en", "blocks": {"chars_per_line": 42}}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.language, "en");
        assert_eq!(config.blocks.chars_per_line, 42);
        assert_eq!(config.blocks.max_lines, 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_explicit_file_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            AppConfig::load_from(&missing),
            Err(AvsrtError::Config { .. })
        ));

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, r#"{"blocks": {"max_lines": 0}}"#).unwrap();
        assert!(matches!(
            AppConfig::load_from(&invalid),
            Err(AvsrtError::Config { .. })
        ));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(AppConfig::default().validate().is_ok());
    }
}
