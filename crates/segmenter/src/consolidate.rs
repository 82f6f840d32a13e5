//! Phase C: fold blocks shorter than `min_block_ms` into a neighbour.

use std::collections::VecDeque;

use avsrt_model::{Block, BlockConfig};

use crate::text::needs_split;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Previous,
    Next,
}

/// Merge each short block into the adjacent block with the smaller gap
/// (the previous one on a tie).
///
/// A merge happens only when the gap is within `merge_gap_ms` and the
/// merged block breaks no ceiling. The merged block is examined again, so
/// a run of short fragments can collapse into one. A short block with no
/// eligible neighbour is kept.
pub fn consolidate_short_blocks(
    blocks: Vec<Block>,
    config: &BlockConfig,
    joiner: &str,
) -> Vec<Block> {
    let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
    let mut pending: VecDeque<Block> = blocks.into();

    while let Some(block) = pending.pop_front() {
        if block.duration_ms() >= config.min_block_ms {
            out.push(block);
            continue;
        }

        let mut sides: Vec<(u64, Side)> = Vec::with_capacity(2);
        if let Some(prev) = out.last() {
            sides.push((block.start_ms.saturating_sub(prev.end_ms), Side::Previous));
        }
        if let Some(next) = pending.front() {
            sides.push((next.start_ms.saturating_sub(block.end_ms), Side::Next));
        }
        // Stable sort keeps the previous neighbour first on equal gaps.
        sides.sort_by_key(|(gap, _)| *gap);

        let mut merged = None;
        for (gap, side) in sides {
            if gap > config.merge_gap_ms {
                continue;
            }
            let candidate = match side {
                Side::Previous => out.last().map(|prev| prev.merged_with(&block, joiner)),
                Side::Next => pending.front().map(|next| block.merged_with(next, joiner)),
            };
            if let Some(candidate) = candidate.filter(|c| !needs_split(c, config)) {
                merged = Some((candidate, side));
                break;
            }
        }

        match merged {
            Some((candidate, Side::Previous)) => {
                out.pop();
                pending.push_front(candidate);
            }
            Some((candidate, Side::Next)) => {
                pending.pop_front();
                pending.push_front(candidate);
            }
            None => out.push(block),
        }
    }

    out
}
