//! Phase B: split blocks until every ceiling holds.
//!
//! Splitting runs off an explicit work-list so pathological inputs cannot
//! exhaust the call stack. A block is split on a segment boundary when it
//! has several segments, otherwise inside its text. Blocks spanning one
//! millisecond or less cannot be divided and are kept as they are.

use std::collections::VecDeque;

use avsrt_model::{join_texts, Block, BlockConfig, Segment};

use crate::builder::BuildWarning;
use crate::text::{
    choose_split_point, ends_with_split_punctuation, needs_split, visible_char_count,
};

/// Score bonus for a boundary whose left half ends in split punctuation.
const PUNCTUATION_BONUS: f64 = 0.5;

/// Where a block was divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKind {
    SegmentBoundary,
    InText,
}

/// Outcome of the constraint-enforcement pass.
#[derive(Debug, Clone, Default)]
pub struct Enforced {
    /// Blocks in timeline order.
    pub blocks: Vec<Block>,
    /// Unsplittable blocks and in-text fallbacks, in the order met.
    pub warnings: Vec<BuildWarning>,
}

/// Score of every constituent boundary of `block`, indexed by the number
/// of segments on the left. Lower is better: the visible-character
/// imbalance of the two halves, less a bonus when the joined left text
/// ends in split punctuation.
fn boundary_scores(block: &Block, joiner: &str) -> Vec<(usize, f64)> {
    let counts: Vec<usize> = block
        .segments
        .iter()
        .map(|seg| visible_char_count(&seg.text))
        .collect();
    let total: usize = counts.iter().sum();

    let mut scores = Vec::with_capacity(block.segments.len().saturating_sub(1));
    let mut left_chars = 0usize;
    let mut left_text = String::new();
    for idx in 1..block.segments.len() {
        left_chars += counts[idx - 1];
        left_text = join_texts(&left_text, &block.segments[idx - 1].text, joiner);
        let right_chars = total - left_chars;
        let mut score = left_chars.abs_diff(right_chars) as f64;
        if ends_with_split_punctuation(&left_text) {
            score -= PUNCTUATION_BONUS;
        }
        scores.push((idx, score));
    }
    scores
}

/// Split `block` on the constituent boundary that best balances the
/// visible characters of the two halves.
pub fn split_on_segment_boundary(block: &Block, joiner: &str) -> Option<(Block, Block)> {
    if block.segments.len() < 2 {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, score) in boundary_scores(block, joiner) {
        if best.map_or(true, |(_, best_score)| score < best_score) {
            best = Some((idx, score));
        }
    }

    let (idx, _) = best?;
    let left = Block::from_segments(block.segments[..idx].to_vec(), joiner)?;
    let right = Block::from_segments(block.segments[idx..].to_vec(), joiner)?;
    Some((left, right))
}

/// Split `block` inside its text and divide its time span in proportion
/// to the visible characters on each side.
///
/// Returns `None` when the text is a single character, when either half
/// would be blank, or when the span is too short to leave both halves at
/// least one millisecond long.
pub fn split_inside_text(block: &Block) -> Option<(Block, Block)> {
    let chars: Vec<char> = block.text.chars().collect();
    if chars.len() <= 1 {
        return None;
    }

    let mut split_idx = choose_split_point(&chars);
    if split_idx == 0 || split_idx >= chars.len() {
        split_idx = chars.len() / 2;
    }
    let left_text: String = chars[..split_idx].iter().collect::<String>().trim().to_string();
    let right_text: String = chars[split_idx..].iter().collect::<String>().trim().to_string();
    if left_text.is_empty() || right_text.is_empty() {
        return None;
    }

    let total = visible_char_count(&block.text);
    let ratio = if total == 0 {
        0.5
    } else {
        visible_char_count(&left_text) as f64 / total as f64
    };

    let (start, end) = (block.start_ms, block.end_ms);
    let proportional = start + (block.duration_ms() as f64 * ratio) as u64;
    let split_ms = proportional.min(end.saturating_sub(1)).max(start + 1);
    if split_ms <= start || split_ms >= end {
        return None;
    }

    let left_id = block.segments.first().map_or(0, |seg| seg.seg_id);
    let right_id = block.segments.last().map_or(left_id, |seg| seg.seg_id);
    Some((
        Block::from_segment(Segment::new(left_id, start, split_ms, left_text)),
        Block::from_segment(Segment::new(right_id, split_ms, end, right_text)),
    ))
}

/// Split on a segment boundary when possible, otherwise inside the text.
pub fn split_block(block: &Block, joiner: &str) -> Option<(Block, Block, SplitKind)> {
    if let Some((left, right)) = split_on_segment_boundary(block, joiner) {
        return Some((left, right, SplitKind::SegmentBoundary));
    }
    split_inside_text(block).map(|(left, right)| (left, right, SplitKind::InText))
}

/// Split every block that breaks a ceiling until none does or none can.
pub fn enforce_constraints(blocks: Vec<Block>, config: &BlockConfig, joiner: &str) -> Enforced {
    let mut enforced = Enforced::default();
    let mut pending: VecDeque<Block> = blocks.into();

    while let Some(block) = pending.pop_front() {
        if !needs_split(&block, config) {
            enforced.blocks.push(block);
            continue;
        }

        match split_block(&block, joiner) {
            Some((left, right, kind)) => {
                if kind == SplitKind::InText {
                    enforced.warnings.push(BuildWarning::BoundaryFallback {
                        start_ms: block.start_ms,
                        end_ms: block.end_ms,
                    });
                }
                pending.push_front(right);
                pending.push_front(left);
            }
            None => {
                let chars = visible_char_count(&block.text);
                tracing::warn!(
                    start_ms = block.start_ms,
                    end_ms = block.end_ms,
                    chars,
                    "block exceeds limits but cannot be split"
                );
                enforced.warnings.push(BuildWarning::Unsplittable {
                    start_ms: block.start_ms,
                    end_ms: block.end_ms,
                    chars,
                });
                enforced.blocks.push(block);
            }
        }
    }

    enforced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(segments: Vec<Segment>) -> Block {
        Block::from_segments(segments, "").unwrap()
    }

    #[test]
    fn test_boundary_split_balances_characters() {
        let b = block(vec![
            Segment::new(0, 0, 1000, "ああ"),
            Segment::new(1, 1000, 2000, "いいい"),
            Segment::new(2, 2000, 3000, "うう"),
            Segment::new(3, 3000, 4000, "えええ"),
        ]);
        let (left, right) = split_on_segment_boundary(&b, "").unwrap();
        assert_eq!(left.text, "ああいいい");
        assert_eq!(right.text, "ううえええ");
        assert_eq!((left.start_ms, left.end_ms), (0, 2000));
        assert_eq!((right.start_ms, right.end_ms), (2000, 4000));
    }

    #[test]
    fn test_boundary_split_punctuation_breaks_tie() {
        // Both boundaries leave a 2|4 imbalance; the punctuated one wins.
        let b = block(vec![
            Segment::new(0, 0, 1000, "ああ"),
            Segment::new(1, 1000, 2000, "い。"),
            Segment::new(2, 2000, 3000, "うう"),
        ]);
        let (left, right) = split_on_segment_boundary(&b, "").unwrap();
        assert_eq!(left.text, "ああい。");
        assert_eq!(right.text, "うう");

        // Without punctuation the first boundary wins.
        let plain = block(vec![
            Segment::new(0, 0, 1000, "ああ"),
            Segment::new(1, 1000, 2000, "いい"),
            Segment::new(2, 2000, 3000, "うう"),
        ]);
        let (left, _) = split_on_segment_boundary(&plain, "").unwrap();
        assert_eq!(left.text, "ああ");
    }

    #[test]
    fn test_punctuation_bonus_looks_through_blank_segments() {
        let b = block(vec![
            Segment::new(0, 0, 1000, "ああ。"),
            Segment::new(1, 1000, 1500, "  "),
            Segment::new(2, 1500, 2500, "いい"),
        ]);
        let scores = boundary_scores(&b, " ");
        assert_eq!(scores, vec![(1, 0.5), (2, 0.5)]);
    }

    #[test]
    fn test_boundary_split_requires_two_segments() {
        let b = block(vec![Segment::new(0, 0, 1000, "ああああ")]);
        assert!(split_on_segment_boundary(&b, "").is_none());
    }

    #[test]
    fn test_in_text_split_at_punctuation_with_proportional_time() {
        let b = block(vec![Segment::new(2, 3000, 9000, "かかかかか。きききききき")]);
        let (left, right) = split_inside_text(&b).unwrap();
        assert_eq!(left.text, "かかかかか。");
        assert_eq!(right.text, "きききききき");
        assert_eq!((left.start_ms, left.end_ms), (3000, 6000));
        assert_eq!((right.start_ms, right.end_ms), (6000, 9000));
        assert_eq!(left.segments[0].seg_id, 2);
    }

    #[test]
    fn test_in_text_split_clamps_to_one_millisecond() {
        let b = block(vec![Segment::new(0, 0, 2, "あいうえおかきくけこ")]);
        let (left, right) = split_inside_text(&b).unwrap();
        assert_eq!((left.start_ms, left.end_ms), (0, 1));
        assert_eq!((right.start_ms, right.end_ms), (1, 2));
    }

    #[test]
    fn test_in_text_split_refuses_collapsed_span() {
        let b = block(vec![Segment::new(0, 0, 1, "あいうえおかきくけこ")]);
        assert!(split_inside_text(&b).is_none());

        let single = block(vec![Segment::new(0, 0, 9000, "あ")]);
        assert!(split_inside_text(&single).is_none());
    }

    #[test]
    fn test_enforce_keeps_unsplittable_block() {
        let config = BlockConfig {
            max_lines: 2,
            chars_per_line: 10,
            ..Default::default()
        };
        let text = "あ".repeat(100);
        let b = block(vec![Segment::new(0, 0, 1, &text)]);
        let enforced = enforce_constraints(vec![b.clone()], &config, "");
        assert_eq!(enforced.blocks, vec![b]);
        assert_eq!(
            enforced.warnings,
            vec![BuildWarning::Unsplittable {
                start_ms: 0,
                end_ms: 1,
                chars: 100
            }]
        );
    }

    #[test]
    fn test_enforce_splits_long_block_recursively() {
        let config = BlockConfig {
            max_block_ms: 2000,
            target_chars_per_sec: 100.0,
            ..Default::default()
        };
        let text = "あいうえおかきくけこさしすせそたちつてと";
        let b = block(vec![Segment::new(0, 0, 8000, text)]);
        let enforced = enforce_constraints(vec![b], &config, "");
        assert!(enforced.blocks.len() >= 4);
        assert!(enforced
            .warnings
            .iter()
            .all(|w| matches!(w, BuildWarning::BoundaryFallback { .. })));
        for out in &enforced.blocks {
            assert!(out.duration_ms() <= 2000);
        }
        let joined: String = enforced.blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(joined, "あいうえおかきくけこさしすせそたちつてと");
        for pair in enforced.blocks.windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
        }
    }
}
