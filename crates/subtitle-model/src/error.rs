//! Errors raised while validating model values or parsing subtitle text.

/// Errors that can occur when working with model data.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid segment {seg_id}: {message}")]
    InvalidSegment { seg_id: u64, message: String },

    #[error("Duplicate seg_id {seg_id}")]
    DuplicateSegment { seg_id: u64 },

    #[error("Segment {seg_id} starts at {start_ms}ms, before the previous segment ends at {previous_end_ms}ms")]
    OverlappingSegment {
        seg_id: u64,
        start_ms: u64,
        previous_end_ms: u64,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Subtitle parse error at line {line}: {message}")]
    SubtitleParse { line: usize, message: String },

    #[error("Invalid timestamp `{value}`")]
    InvalidTimestamp { value: String },
}

impl ModelError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: msg.into(),
        }
    }

    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::SubtitleParse {
            line,
            message: msg.into(),
        }
    }
}
