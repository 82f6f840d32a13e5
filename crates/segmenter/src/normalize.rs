//! Canonical punctuation and whitespace for block text.
//!
//! Normalization is idempotent: running it over already-normalized text
//! changes nothing.

use std::sync::OnceLock;

use regex::Regex;

use avsrt_model::is_unspaced;

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn spaced_full_width_mark() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*([、。！？])\s*").unwrap())
}

fn full_width(ch: char) -> char {
    match ch {
        ',' => '、',
        '.' => '。',
        '?' => '？',
        '!' => '！',
        other => other,
    }
}

/// Normalize `text` for display in `language`.
///
/// Every language gets whitespace runs collapsed to one space and the
/// ends trimmed. Unspaced languages (Japanese, Chinese) also get ASCII
/// `, . ? !` replaced by their full-width forms and lose any whitespace
/// around full-width marks.
pub fn normalize_text(text: &str, language: &str) -> String {
    if !is_unspaced(language) {
        return whitespace_run().replace_all(text, " ").trim().to_string();
    }

    let converted: String = text.chars().map(full_width).collect();
    let collapsed = whitespace_run().replace_all(&converted, " ");
    spaced_full_width_mark()
        .replace_all(&collapsed, "$1")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_japanese_punctuation_becomes_full_width() {
        assert_eq!(
            normalize_text("  こんにちは , 世界 .  元気? はい!", "ja"),
            "こんにちは、世界。元気？はい！"
        );
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(normalize_text("今日は\n\t晴れ", "ja"), "今日は 晴れ");
        assert_eq!(normalize_text("  hello \n  world  ", "en"), "hello world");
    }

    #[test]
    fn test_spaced_language_keeps_ascii_punctuation() {
        assert_eq!(normalize_text("Hello, world. OK?", "en"), "Hello, world. OK?");
    }

    #[test]
    fn test_region_subtag_is_ignored() {
        assert_eq!(normalize_text("はい.", "ja-JP"), "はい。");
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(normalize_text("   ", "ja"), "");
    }

    proptest! {
        #[test]
        fn test_idempotent_ja(text in "[ぁ-ん一-龥a-z ,.!?、。！？\t\n]{0,40}") {
            let once = normalize_text(&text, "ja");
            prop_assert_eq!(normalize_text(&once, "ja"), once);
        }

        #[test]
        fn test_idempotent_en(text in "[a-zA-Z ,.!?\t\n]{0,40}") {
            let once = normalize_text(&text, "en");
            prop_assert_eq!(normalize_text(&once, "en"), once);
        }
    }
}
