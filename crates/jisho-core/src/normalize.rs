//! Text canonicalization shared by deduplication and linking.
//!
//! `normalize` strips all whitespace and applies NFKC, so full-width ASCII and
//! half-width katakana fold onto one form. It is deterministic and idempotent.

use std::fmt;

use unicode_normalization::UnicodeNormalization;

/// NFKC can expose new whitespace (U+00A8 → space + combining diaeresis) and
/// stripping that whitespace can enable a new composition, so the pass repeats
/// until nothing changes. Real input settles in one or two rounds.
const MAX_ROUNDS: usize = 8;

/// Text that has gone through [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn normalize(text: &str) -> NormalizedText {
    let mut current = strip_whitespace(text);
    for _ in 0..MAX_ROUNDS {
        let next = strip_whitespace(&current.nfkc().collect::<String>());
        if next == current {
            break;
        }
        current = next;
    }
    NormalizedText(current)
}

/// Identity of a word: `normalize(surface) + ":" + normalize(reading)`.
/// A missing surface or reading contributes the empty string.
pub fn identity_key(surface: Option<&str>, reading: Option<&str>) -> String {
    let surface = normalize(surface.unwrap_or(""));
    let reading = normalize(reading.unwrap_or(""));
    format!("{surface}:{reading}")
}

/// Key used to drop duplicate senses when merging: normalized gloss text plus
/// the part-of-speech list.
pub fn sense_key(gloss: &str, part_of_speech: &str) -> String {
    format!("{}:{}", normalize(gloss), part_of_speech)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_interior_whitespace() {
        assert_eq!(normalize("  思い 遣り\t").as_str(), "思い遣り");
        assert_eq!(normalize("食べ　る").as_str(), "食べる");
    }

    #[test]
    fn folds_width_variants() {
        assert_eq!(normalize("ＡＢＣ１２３").as_str(), "ABC123");
        assert_eq!(normalize("ｶﾀｶﾅ").as_str(), "カタカナ");
    }

    #[test]
    fn empty_and_blank() {
        assert!(normalize("").is_empty());
        assert!(normalize(" \u{3000}\n").is_empty());
    }

    #[test]
    fn identity_key_uses_empty_for_missing_parts() {
        assert_eq!(identity_key(Some("漢字"), Some("かんじ")), "漢字:かんじ");
        assert_eq!(identity_key(None, Some("かんじ")), ":かんじ");
        assert_eq!(identity_key(Some("ｶﾝｼﾞ"), None), "カンジ:");
    }

    #[test]
    fn sense_key_normalizes_gloss_only() {
        assert_eq!(sense_key(" to eat ", "v1"), "toeat:v1");
    }

    #[test]
    fn diaeresis_settles() {
        let once = normalize("a\u{00A8}");
        assert_eq!(normalize(once.as_str()), once);
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "\\PC*") {
            let once = normalize(&s);
            let twice = normalize(once.as_str());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalized_text_has_no_whitespace(s in "\\PC*") {
            prop_assert!(!normalize(&s).as_str().chars().any(char::is_whitespace));
        }
    }
}
