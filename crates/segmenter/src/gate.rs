//! Segment gate: drop recognized segments unlikely to be genuine speech.
//!
//! Rules are evaluated in a fixed order and the first match wins:
//!
//! 1. `empty`: blank or whitespace-only text
//! 2. `punct-only`: nothing alphanumeric (when enabled)
//! 3. `too-short`: fewer than `min_text_chars` visible characters over a
//!    segment lasting at least one second
//! 4. `too-fast`: reading rate above `max_chars_per_sec`
//! 5. `low-script-ratio`: too few characters of the language's script
//! 6. `repeated-char`: one character dominates the text
//!
//! Survivors keep their text verbatim and their input order.

use std::collections::HashMap;
use std::fmt;

use avsrt_model::{GateConfig, Script, Segment};
use serde::Serialize;

use crate::text::visible_char_count;

/// Why a segment was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DropReason {
    Empty,
    PunctOnly,
    TooShort,
    TooFast,
    LowScriptRatio,
    RepeatedChar,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Empty => "empty",
            DropReason::PunctOnly => "punct-only",
            DropReason::TooShort => "too-short",
            DropReason::TooFast => "too-fast",
            DropReason::LowScriptRatio => "low-script-ratio",
            DropReason::RepeatedChar => "repeated-char",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A segment removed by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedSegment {
    pub seg_id: u64,
    pub reason: DropReason,
}

/// Result of gating a run of segments.
#[derive(Debug, Clone, Default)]
pub struct GateOutcome {
    /// Surviving segments, in input order.
    pub kept: Vec<Segment>,
    /// Dropped segments, in input order.
    pub dropped: Vec<DroppedSegment>,
}

impl GateOutcome {
    pub fn total(&self) -> usize {
        self.kept.len() + self.dropped.len()
    }
}

/// The segment gate.
pub struct SegmentGate {
    config: GateConfig,
    script: Option<Script>,
}

impl SegmentGate {
    /// Create a gate for segments in `language`.
    pub fn new(config: GateConfig, language: &str) -> Self {
        Self {
            config,
            script: Script::for_language(language),
        }
    }

    /// Create a gate with default thresholds.
    pub fn with_defaults(language: &str) -> Self {
        Self::new(GateConfig::default(), language)
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Gate every segment, preserving order.
    pub fn apply(&self, segments: &[Segment]) -> GateOutcome {
        let mut outcome = GateOutcome::default();
        for seg in segments {
            match self.evaluate(seg) {
                Some(reason) => outcome.dropped.push(DroppedSegment {
                    seg_id: seg.seg_id,
                    reason,
                }),
                None => outcome.kept.push(seg.clone()),
            }
        }
        outcome
    }

    /// First rule the segment violates, if any.
    pub fn evaluate(&self, segment: &Segment) -> Option<DropReason> {
        let text = segment.text.as_str();
        if text.trim().is_empty() {
            return Some(DropReason::Empty);
        }

        if self.config.drop_if_only_punctuation && !text.chars().any(char::is_alphanumeric) {
            return Some(DropReason::PunctOnly);
        }

        let visible = visible_char_count(text);
        let duration_secs = segment.duration_secs();
        if visible < self.config.min_text_chars && duration_secs >= 1.0 {
            return Some(DropReason::TooShort);
        }

        if visible as f64 / duration_secs > self.config.max_chars_per_sec {
            return Some(DropReason::TooFast);
        }

        if let Some(script) = self.script {
            if script_char_ratio(text, script) < self.config.min_script_char_ratio {
                return Some(DropReason::LowScriptRatio);
            }
        }

        if repeated_char_ratio(text) > self.config.max_repeated_char_ratio {
            return Some(DropReason::RepeatedChar);
        }

        None
    }
}

/// Share of `script` characters among all alphanumeric characters.
/// Returns 0.0 when the text has no alphanumerics.
pub fn script_char_ratio(text: &str, script: Script) -> f64 {
    let mut matching = 0usize;
    let mut total = 0usize;
    for ch in text.chars() {
        if script.contains(ch) {
            matching += 1;
            total += 1;
        } else if ch.is_alphanumeric() {
            total += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    matching as f64 / total as f64
}

/// Share of the most frequent character among non-whitespace characters.
pub fn repeated_char_ratio(text: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for ch in text.chars().filter(|c| !c.is_whitespace()) {
        *counts.entry(ch).or_insert(0) += 1;
        total += 1;
    }
    match counts.values().max() {
        Some(&max) if total > 0 => max as f64 / total as f64,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(seg_id: u64, start_ms: u64, end_ms: u64, text: &str) -> Segment {
        Segment::new(seg_id, start_ms, end_ms, text)
    }

    #[test]
    fn test_basic_gating_japanese() {
        let gate = SegmentGate::with_defaults("ja");
        let segments = vec![
            seg(0, 0, 1000, "   "),
            seg(1, 1000, 2000, "!!!"),
            seg(2, 2000, 4000, "aaaaaaa"),
            seg(3, 4000, 4100, "fasttext"),
            seg(4, 4100, 6000, "今日は大丈夫？"),
        ];

        let outcome = gate.apply(&segments);
        let kept: Vec<u64> = outcome.kept.iter().map(|s| s.seg_id).collect();
        assert_eq!(kept, vec![4]);
        assert_eq!(outcome.kept[0].text, "今日は大丈夫？");

        let reasons: Vec<DropReason> = outcome.dropped.iter().map(|d| d.reason).collect();
        assert_eq!(
            reasons,
            vec![
                DropReason::Empty,
                DropReason::PunctOnly,
                DropReason::LowScriptRatio,
                DropReason::TooFast,
            ]
        );
    }

    #[test]
    fn test_preserves_order_for_unscripted_language() {
        let config = GateConfig {
            min_text_chars: 1,
            max_chars_per_sec: 100.0,
            ..Default::default()
        };
        let gate = SegmentGate::new(config, "en");
        let segments = vec![
            seg(0, 0, 1000, ""),
            seg(1, 1000, 2000, "keep"),
            seg(2, 2000, 3000, ""),
            seg(3, 3000, 4000, "also keep"),
        ];
        let kept: Vec<u64> = gate.apply(&segments).kept.iter().map(|s| s.seg_id).collect();
        assert_eq!(kept, vec![1, 3]);
    }

    #[test]
    fn test_too_short_exempts_sub_second_segments() {
        let config = GateConfig {
            min_text_chars: 3,
            ..Default::default()
        };
        let gate = SegmentGate::new(config, "en");
        assert_eq!(
            gate.evaluate(&seg(0, 0, 1500, "ab")),
            Some(DropReason::TooShort)
        );
        assert_eq!(gate.evaluate(&seg(1, 0, 900, "ab")), None);
    }

    #[test]
    fn test_repeated_char_rule() {
        let gate = SegmentGate::with_defaults("en");
        assert_eq!(
            gate.evaluate(&seg(0, 0, 2000, "ooooooh")),
            Some(DropReason::RepeatedChar)
        );
        assert_eq!(gate.evaluate(&seg(1, 0, 2000, "hello")), None);
    }

    #[test]
    fn test_punct_only_can_be_disabled() {
        let config = GateConfig {
            drop_if_only_punctuation: false,
            max_repeated_char_ratio: 1.0,
            min_text_chars: 1,
            ..Default::default()
        };
        let gate = SegmentGate::new(config, "en");
        assert_eq!(gate.evaluate(&seg(0, 0, 1000, "!!!")), None);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // Both too fast and repeated; too-fast is checked first.
        let gate = SegmentGate::with_defaults("en");
        assert_eq!(
            gate.evaluate(&seg(0, 0, 100, "aaaaaaaaaa")),
            Some(DropReason::TooFast)
        );
    }

    #[test]
    fn test_ratios() {
        assert!((script_char_ratio("日本abc", Script::Japanese) - 0.4).abs() < 1e-9);
        assert_eq!(script_char_ratio("!!", Script::Japanese), 0.0);
        assert!((repeated_char_ratio("aab b") - 0.5).abs() < 1e-9);
        assert_eq!(repeated_char_ratio("   "), 0.0);
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(DropReason::LowScriptRatio.to_string(), "low-script-ratio");
        assert_eq!(DropReason::PunctOnly.as_str(), "punct-only");
    }
}
