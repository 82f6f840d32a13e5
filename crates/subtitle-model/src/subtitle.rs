//! The SRT subtitle track format.
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:02,500
//! first line
//! second line
//!
//! 2
//! ...
//! ```
//!
//! Rendering and parsing are exact inverses for well-formed entries
//! (lines non-blank and free of newlines).

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A single cue of a subtitle track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    /// 1-based cue number.
    pub index: u32,

    /// Start timestamp, `HH:MM:SS,mmm`.
    pub start_ts: String,

    /// End timestamp, `HH:MM:SS,mmm`.
    pub end_ts: String,

    /// Display lines, top to bottom.
    pub lines: Vec<String>,
}

impl SubtitleEntry {
    /// Build an entry from millisecond timings.
    pub fn from_millis(index: u32, start_ms: i64, end_ms: i64, lines: Vec<String>) -> Self {
        Self {
            index,
            start_ts: format_timestamp(start_ms),
            end_ts: format_timestamp(end_ms),
            lines,
        }
    }
}

/// Format milliseconds as `HH:MM:SS,mmm`. Negative input clamps to zero.
pub fn format_timestamp(ms: i64) -> String {
    let total_ms = ms.max(0);
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Parse `HH:MM:SS,mmm` (or `.mmm`) back into milliseconds.
pub fn parse_timestamp(value: &str) -> Result<u64, ModelError> {
    let invalid = || ModelError::InvalidTimestamp {
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let (clock, millis) = trimmed
        .rsplit_once(|c: char| c == ',' || c == '.')
        .ok_or_else(invalid)?;
    let mut parts = clock.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let field = |text: &str| text.parse::<u64>().map_err(|_| invalid());
    let (hours, minutes, seconds, millis) = (field(h)?, field(m)?, field(s)?, field(millis)?);
    if minutes >= 60 || seconds >= 60 || millis >= 1000 {
        return Err(invalid());
    }

    Ok(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

/// Render entries as SRT text ending with exactly one newline.
pub fn render_subtitles(entries: &[SubtitleEntry]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for entry in entries {
        lines.push(entry.index.to_string());
        lines.push(format!("{} --> {}", entry.start_ts, entry.end_ts));
        lines.extend(entry.lines.iter().cloned());
        lines.push(String::new());
    }

    let mut output = lines.join("\n").trim_end_matches('\n').to_string();
    output.push('\n');
    output
}

/// Parse SRT text into entries.
///
/// Accepts LF or CRLF line endings and a leading byte-order mark. Errors
/// name the 1-based line that broke the format.
pub fn parse_subtitles(text: &str) -> Result<Vec<SubtitleEntry>, ModelError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text.lines().collect();
    let mut entries = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        while idx < lines.len() && lines[idx].trim().is_empty() {
            idx += 1;
        }
        if idx >= lines.len() {
            break;
        }

        let index_line = lines[idx].trim();
        let index: u32 = index_line.parse().map_err(|_| {
            ModelError::parse(idx + 1, format!("invalid index line `{index_line}`"))
        })?;
        idx += 1;

        let Some(timing) = lines.get(idx).map(|line| line.trim()) else {
            return Err(ModelError::parse(idx, "unexpected end of input after index line"));
        };
        let Some((start_ts, end_ts)) = timing.split_once("-->") else {
            return Err(ModelError::parse(
                idx + 1,
                format!("invalid timing line `{timing}`"),
            ));
        };
        idx += 1;

        let mut text_lines = Vec::new();
        while idx < lines.len() && !lines[idx].trim().is_empty() {
            text_lines.push(lines[idx].to_string());
            idx += 1;
        }

        entries.push(SubtitleEntry {
            index,
            start_ts: start_ts.trim().to_string(),
            end_ts: end_ts.trim().to_string(),
            lines: text_lines,
        });
    }

    Ok(entries)
}
