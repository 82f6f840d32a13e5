//! Language tags and the writing systems the pipeline knows about.
//!
//! Only the primary subtag matters here: `ja`, `ja-JP` and `JA_jp` all
//! resolve to Japanese.

/// Writing system used for the script-ratio quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    /// Kana plus CJK ideographs and half-width katakana.
    Japanese,
    /// CJK ideographs.
    Han,
    /// Hangul syllables and jamo.
    Hangul,
}

impl Script {
    /// Script expected for a language, if the pipeline checks one.
    pub fn for_language(language: &str) -> Option<Self> {
        match primary_subtag(language).as_str() {
            "ja" => Some(Script::Japanese),
            "zh" => Some(Script::Han),
            "ko" => Some(Script::Hangul),
            _ => None,
        }
    }

    /// Whether `ch` belongs to this script.
    pub fn contains(self, ch: char) -> bool {
        match self {
            Script::Japanese => matches!(
                ch,
                '\u{3040}'..='\u{30FF}'
                    | '\u{3400}'..='\u{4DBF}'
                    | '\u{4E00}'..='\u{9FFF}'
                    | '\u{F900}'..='\u{FAFF}'
                    | '\u{FF66}'..='\u{FF9F}'
            ),
            Script::Han => matches!(
                ch,
                '\u{3400}'..='\u{4DBF}'
                    | '\u{4E00}'..='\u{9FFF}'
                    | '\u{F900}'..='\u{FAFF}'
                    | '\u{20000}'..='\u{2A6DF}'
            ),
            Script::Hangul => matches!(
                ch,
                '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}' | '\u{AC00}'..='\u{D7AF}'
            ),
        }
    }
}

/// Lowercased primary subtag of a BCP 47-ish tag (`"ja-JP"` -> `"ja"`).
pub fn primary_subtag(language: &str) -> String {
    language
        .split(|c: char| c == '-' || c == '_')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Languages written without spaces between words.
///
/// Segment texts are concatenated directly for these; every other
/// language joins them with a single space.
pub fn is_unspaced(language: &str) -> bool {
    matches!(primary_subtag(language).as_str(), "ja" | "zh")
}

/// Separator placed between segment texts when they merge into a block.
pub fn text_joiner(language: &str) -> &'static str {
    if is_unspaced(language) {
        ""
    } else {
        " "
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_subtag() {
        assert_eq!(primary_subtag("ja"), "ja");
        assert_eq!(primary_subtag("ja-JP"), "ja");
        assert_eq!(primary_subtag("ZH_tw"), "zh");
        assert_eq!(primary_subtag(""), "");
    }

    #[test]
    fn test_script_lookup() {
        assert_eq!(Script::for_language("ja-JP"), Some(Script::Japanese));
        assert_eq!(Script::for_language("zh-TW"), Some(Script::Han));
        assert_eq!(Script::for_language("ko"), Some(Script::Hangul));
        assert_eq!(Script::for_language("en"), None);
    }

    #[test]
    fn test_script_membership() {
        assert!(Script::Japanese.contains('あ'));
        assert!(Script::Japanese.contains('カ'));
        assert!(Script::Japanese.contains('日'));
        assert!(!Script::Japanese.contains('a'));
        assert!(!Script::Japanese.contains('？'));
        assert!(Script::Han.contains('中'));
        assert!(!Script::Han.contains('あ'));
        assert!(Script::Hangul.contains('한'));
    }

    #[test]
    fn test_joiner() {
        assert_eq!(text_joiner("ja"), "");
        assert_eq!(text_joiner("zh-Hant"), "");
        assert_eq!(text_joiner("en"), " ");
    }
}
