//! Error types shared across avsrt crates.

use std::path::PathBuf;

use avsrt_model::ModelError;

/// Top-level error type for avsrt operations.
#[derive(Debug, thiserror::Error)]
pub enum AvsrtError {
    #[error("{stage}: missing upstream artifact {}", path.display())]
    MissingUpstreamArtifact { stage: String, path: PathBuf },

    #[error("{stage}: invalid artifact {}: {message}", path.display())]
    SchemaValidation {
        stage: String,
        path: PathBuf,
        message: String,
    },

    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Translation error: {message}")]
    Translation { message: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using AvsrtError.
pub type AvsrtResult<T> = Result<T, AvsrtError>;

impl AvsrtError {
    pub fn missing_upstream(stage: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingUpstreamArtifact {
            stage: stage.into(),
            path: path.into(),
        }
    }

    pub fn schema(
        stage: impl Into<String>,
        path: impl Into<PathBuf>,
        msg: impl Into<String>,
    ) -> Self {
        Self::SchemaValidation {
            stage: stage.into(),
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn translation(msg: impl Into<String>) -> Self {
        Self::Translation {
            message: msg.into(),
        }
    }

    /// Whether this error aborts a stage because of a bad or absent
    /// artifact, as opposed to an environmental failure.
    pub fn is_artifact_error(&self) -> bool {
        matches!(
            self,
            Self::MissingUpstreamArtifact { .. } | Self::SchemaValidation { .. }
        )
    }
}
