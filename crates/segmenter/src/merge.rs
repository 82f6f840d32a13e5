//! Phase A: greedy forward merge of gated segments into candidate blocks.

use avsrt_model::{Block, BlockConfig, Segment};

use crate::text::{chars_per_sec, visible_char_count};

/// Reading-rate overshoot tolerated while merging. Phase B later enforces
/// the strict target.
pub const MERGE_RATE_TOLERANCE: f64 = 1.2;

/// Merge sorted segments left to right in a single pass.
///
/// The open block absorbs the next segment only when the gap, merged
/// duration, merged character count and merged reading rate all stay
/// within limits; otherwise it is closed and the segment opens a new one.
pub fn greedy_merge(segments: &[Segment], config: &BlockConfig, joiner: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current: Option<Block> = None;

    for seg in segments {
        let Some(open) = current.take() else {
            current = Some(Block::from_segment(seg.clone()));
            continue;
        };

        let next = Block::from_segment(seg.clone());
        if can_extend(&open, seg, config) {
            current = Some(open.merged_with(&next, joiner));
        } else {
            blocks.push(open);
            current = Some(next);
        }
    }

    blocks.extend(current);
    blocks
}

fn can_extend(open: &Block, seg: &Segment, config: &BlockConfig) -> bool {
    let gap = seg.start_ms.saturating_sub(open.end_ms);
    let merged_end = open.end_ms.max(seg.end_ms);
    let merged_duration = merged_end.saturating_sub(open.start_ms);
    let merged_chars = visible_char_count(&open.text) + visible_char_count(&seg.text);
    let merged_rate = chars_per_sec(merged_chars, merged_duration);

    gap <= config.merge_gap_ms
        && merged_duration <= config.max_block_ms
        && merged_chars <= config.max_chars_per_block()
        && merged_rate <= config.target_chars_per_sec * MERGE_RATE_TOLERANCE
}
