//! Append-only workspace run log.
//!
//! Each line is `[<RFC 3339 UTC timestamp>] <message>`. The log survives
//! across runs and is never truncated.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use avsrt_common::AvsrtResult;
use chrono::{SecondsFormat, Utc};

/// Writer for `run.log`.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line.
    pub fn append(&self, message: impl AsRef<str>) -> AvsrtResult<()> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{timestamp}] {}", message.as_ref())?;
        Ok(())
    }

    /// Messages logged so far, without their timestamps.
    pub fn messages(&self) -> AvsrtResult<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(content
            .lines()
            .map(|line| match line.split_once("] ") {
                Some((_, message)) if line.starts_with('[') => message.to_string(),
                _ => line.to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_is_timestamped_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new(dir.path().join("run.log"));
        log.append("gate: start").unwrap();
        log.append("gate: ok -> segments.gated.json").unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        let first = raw.lines().next().unwrap();
        assert!(first.starts_with('['));
        assert!(first.contains("Z] gate: start"));

        assert_eq!(
            log.messages().unwrap(),
            vec!["gate: start", "gate: ok -> segments.gated.json"]
        );
    }

    #[test]
    fn test_missing_log_has_no_messages() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new(dir.path().join("run.log"));
        assert!(log.messages().unwrap().is_empty());
    }
}
