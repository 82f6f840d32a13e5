//! Character-level helpers shared by the gate, builder and wrapper.
//!
//! Lengths are counted in `char`s, never bytes.

use avsrt_model::{Block, BlockConfig};

/// Marks after which text may be broken.
pub const SPLIT_PUNCTUATION: [char; 8] = ['。', '！', '？', '、', ',', '.', '!', '?'];

pub fn is_split_punctuation(ch: char) -> bool {
    SPLIT_PUNCTUATION.contains(&ch)
}

/// Non-whitespace characters in `text`.
pub fn visible_char_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Characters per second over `duration_ms`, with the duration floored at
/// one microsecond.
pub fn chars_per_sec(chars: usize, duration_ms: u64) -> f64 {
    let secs = (duration_ms as f64 / 1000.0).max(1e-6);
    chars as f64 / secs
}

/// Whether the text, ignoring trailing whitespace, ends in split punctuation.
pub fn ends_with_split_punctuation(text: &str) -> bool {
    text.trim_end()
        .chars()
        .last()
        .is_some_and(is_split_punctuation)
}

/// Offset (in chars) at which to cut `chars` in two.
///
/// Picks the split mark nearest the midpoint, preferring one at or before
/// the midpoint on equal distance, and cuts just after it. Without any
/// mark the cut falls exactly on the midpoint. The final character is
/// never a candidate, so both halves are non-empty for inputs longer than
/// one character.
pub fn choose_split_point(chars: &[char]) -> usize {
    if chars.is_empty() {
        return 0;
    }
    let midpoint = chars.len() / 2;

    let best = chars[..chars.len() - 1]
        .iter()
        .enumerate()
        .filter(|(_, ch)| is_split_punctuation(**ch))
        .map(|(idx, _)| idx)
        .min_by_key(|&idx| (idx.abs_diff(midpoint), usize::from(idx > midpoint)));

    match best {
        Some(idx) if idx + 1 < chars.len() => idx + 1,
        _ => midpoint,
    }
}

/// Visible characters in a block.
pub fn block_chars(block: &Block) -> usize {
    visible_char_count(&block.text)
}

/// Reading rate of a block in visible characters per second.
pub fn block_chars_per_sec(block: &Block) -> f64 {
    chars_per_sec(block_chars(block), block.duration_ms())
}

/// Whether a block breaks any strict ceiling: duration, capacity or the
/// target reading rate (no tolerance).
pub fn needs_split(block: &Block, config: &BlockConfig) -> bool {
    block.duration_ms() > config.max_block_ms
        || block_chars(block) > config.max_chars_per_block()
        || block_chars_per_sec(block) > config.target_chars_per_sec
}
