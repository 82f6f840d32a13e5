//! Recognized speech segments.
//!
//! Segments arrive from the external recognition stage as a JSON array
//! (`segments.asr.json`) and leave the gate in the same shape
//! (`segments.gated.json`).

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelError;

/// A timestamped span of recognized speech.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Identifier, unique within one artifact.
    pub seg_id: u64,

    /// Start time (ms).
    pub start_ms: u64,

    /// End time (ms), strictly after `start_ms`.
    pub end_ms: u64,

    /// Recognized text. A `null` or missing value reads as empty.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub text: String,
}

impl Segment {
    pub fn new(seg_id: u64, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            seg_id,
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Duration in seconds, floored at one microsecond so rates stay finite.
    pub fn duration_secs(&self) -> f64 {
        (self.duration_ms() as f64 / 1000.0).max(1e-6)
    }
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Check that segments are well-formed, unique by id, and non-overlapping
/// in the order given.
pub fn validate_segments(segments: &[Segment]) -> Result<(), ModelError> {
    let mut seen = HashSet::with_capacity(segments.len());
    let mut previous_end: Option<u64> = None;

    for seg in segments {
        if seg.end_ms <= seg.start_ms {
            return Err(ModelError::InvalidSegment {
                seg_id: seg.seg_id,
                message: format!(
                    "end_ms ({}) must be greater than start_ms ({})",
                    seg.end_ms, seg.start_ms
                ),
            });
        }
        if !seen.insert(seg.seg_id) {
            return Err(ModelError::DuplicateSegment { seg_id: seg.seg_id });
        }
        if let Some(prev) = previous_end {
            if seg.start_ms < prev {
                return Err(ModelError::OverlappingSegment {
                    seg_id: seg.seg_id,
                    start_ms: seg.start_ms,
                    previous_end_ms: prev,
                });
            }
        }
        previous_end = Some(seg.end_ms);
    }

    Ok(())
}

/// Sort segments by `(start_ms, end_ms)`.
pub fn sort_segments(segments: &mut [Segment]) {
    segments.sort_by_key(|seg| (seg.start_ms, seg.end_ms));
}
