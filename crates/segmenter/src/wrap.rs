//! Fixed-width line wrapping.

use crate::text::is_split_punctuation;

/// How many characters at the end of a full line are searched for a
/// punctuation mark to break after.
const PUNCTUATION_LOOKBACK: usize = 4;

/// Wrapped lines for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedText {
    pub lines: Vec<String>,
    /// Text was left over after `max_lines` lines and was appended to the
    /// last line, which therefore exceeds `chars_per_line`.
    pub overflowed: bool,
}

impl WrappedText {
    /// Whether every line fits within `chars_per_line`.
    pub fn fits(&self, chars_per_line: usize) -> bool {
        self.lines
            .iter()
            .all(|line| line.chars().count() <= chars_per_line)
    }
}

/// Greedily wrap `text` into at most `max_lines` lines of at most
/// `chars_per_line` characters.
///
/// A full line breaks just after the latest punctuation mark within its
/// last few characters, or exactly at the width otherwise. Anything left
/// after `max_lines` lines is appended to the last line rather than
/// dropped, and the result is flagged as overflowed.
pub fn wrap_text(text: &str, chars_per_line: usize, max_lines: usize) -> WrappedText {
    let chars: Vec<char> = text.chars().collect();
    let width = chars_per_line.max(1);
    let max_lines = max_lines.max(1);

    let mut lines: Vec<String> = Vec::new();
    let mut pos = 0;
    while pos < chars.len() && lines.len() < max_lines {
        let remaining = &chars[pos..];
        if remaining.len() <= width {
            lines.push(remaining.iter().collect());
            pos = chars.len();
            break;
        }

        let window_start = width.saturating_sub(PUNCTUATION_LOOKBACK).max(1);
        let cut = (window_start..width)
            .rev()
            .find(|&idx| is_split_punctuation(remaining[idx]))
            .map_or(width, |idx| idx + 1);
        lines.push(remaining[..cut].iter().collect());
        pos += cut;
    }

    let overflowed = pos < chars.len();
    if overflowed {
        let rest: String = chars[pos..].iter().collect();
        if let Some(last) = lines.last_mut() {
            last.push_str(&rest);
        }
    }

    WrappedText { lines, overflowed }
}
