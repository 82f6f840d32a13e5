//! Subtitle blocks and their on-disk records.

use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// A display-ready subtitle unit assembled from one or more segments.
///
/// `start_ms`/`end_ms` always match the first/last constituent segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub segments: Vec<Segment>,
}

impl Block {
    /// A block holding a single segment.
    pub fn from_segment(segment: Segment) -> Self {
        Self {
            start_ms: segment.start_ms,
            end_ms: segment.end_ms,
            text: segment.text.clone(),
            segments: vec![segment],
        }
    }

    /// Build a block over an ordered, non-empty run of segments.
    pub fn from_segments(segments: Vec<Segment>, joiner: &str) -> Option<Self> {
        let start_ms = segments.first()?.start_ms;
        let end_ms = segments.iter().map(|s| s.end_ms).max()?;
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(joiner);
        Some(Self {
            start_ms,
            end_ms,
            text,
            segments,
        })
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Concatenate `other` after `self`.
    pub fn merged_with(&self, other: &Block, joiner: &str) -> Block {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Block {
            start_ms: self.start_ms,
            end_ms: self.end_ms.max(other.end_ms),
            text: join_texts(&self.text, &other.text, joiner),
            segments,
        }
    }
}

/// Join two texts, skipping the separator when either side is empty.
pub fn join_texts(left: &str, right: &str, joiner: &str) -> String {
    if left.is_empty() {
        return right.to_string();
    }
    if right.is_empty() {
        return left.to_string();
    }
    format!("{left}{joiner}{right}")
}

/// One entry of the `subtitle_blocks*.json` artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// 1-based position in the artifact.
    pub block_id: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    #[serde(default)]
    pub text: String,
}

impl BlockRecord {
    /// Number sorted blocks from 1.
    pub fn number(blocks: &[Block]) -> Vec<BlockRecord> {
        blocks
            .iter()
            .enumerate()
            .map(|(idx, block)| BlockRecord {
                block_id: idx as u32 + 1,
                start_ms: block.start_ms,
                end_ms: block.end_ms,
                text: block.text.clone(),
            })
            .collect()
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}
