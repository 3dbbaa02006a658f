use serde::{Deserialize, Serialize};

use crate::normalize::{identity_key, sense_key};

/// Which corpus a word came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordSource {
    Edict,
    Jmdict,
}

impl WordSource {
    pub fn as_str(self) -> &'static str {
        match self {
            WordSource::Edict => "edict",
            WordSource::Jmdict => "jmdict",
        }
    }
}

/// One meaning unit of a word. Gloss order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sense {
    pub glosses: Vec<String>,
    pub parts_of_speech: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub misc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dialect: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl Sense {
    /// Glosses joined the way EDICT writes them inside one sense.
    pub fn gloss_text(&self) -> String {
        self.glosses.join("/")
    }

    pub fn dedup_key(&self) -> String {
        sense_key(&self.gloss_text(), &self.parts_of_speech.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    /// Kanji or surface headword; `None` for reading-only entries.
    pub surface: Option<String>,
    pub reading: Option<String>,
    pub senses: Vec<Sense>,
    /// External entry id (`EntL1309180X`) when the source carries one.
    pub external_id: Option<String>,
    /// Marked with the `(P)` priority flag.
    pub common: bool,
    pub source: WordSource,
}

impl WordEntry {
    pub fn identity(&self) -> String {
        identity_key(self.surface.as_deref(), self.reading.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KanjiEntry {
    pub character: String,
    /// Four-digit JIS code from column 1, kept as written.
    pub legacy_code: Option<String>,
    /// Hex codepoint from the `U` field.
    pub codepoint: Option<String>,
    pub grade: Option<u8>,
    pub stroke_count: Option<u8>,
    pub frequency: Option<u32>,
    pub on_readings: Vec<String>,
    pub kun_readings: Vec<String>,
    pub nanori: Vec<String>,
    pub meanings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleEntry {
    pub sentence: String,
    pub translation: String,
    pub corpus_id: Option<String>,
    /// Raw annotated breakdown, parsed only when linking or rendering.
    pub breakdown: String,
}

/// A furigana unit: base text and its optional reading.
///
/// `rt` is never the empty string; `ruby` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub ruby: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rt: Option<String>,
}

impl Segment {
    pub fn plain(ruby: impl Into<String>) -> Self {
        Self {
            ruby: ruby.into(),
            rt: None,
        }
    }

    pub fn with_reading(ruby: impl Into<String>, rt: impl Into<String>) -> Self {
        Self {
            ruby: ruby.into(),
            rt: Some(rt.into()),
        }
    }
}

/// Pre-segmented furigana for a (text, reading) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuriganaEntry {
    pub text: String,
    pub reading: String,
    pub segments: Vec<Segment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sense_dedup_key_joins_glosses_and_pos() {
        let sense = Sense {
            glosses: vec!["consideration".into(), "thoughtfulness".into()],
            parts_of_speech: vec!["n".into()],
            ..Default::default()
        };
        assert_eq!(sense.dedup_key(), "consideration/thoughtfulness:n");
    }

    #[test]
    fn word_identity_normalizes_parts() {
        let word = WordEntry {
            surface: Some("ｶﾀｶﾅ".into()),
            reading: Some("かたかな ".into()),
            senses: Vec::new(),
            external_id: None,
            common: false,
            source: WordSource::Jmdict,
        };
        assert_eq!(word.identity(), "カタカナ:かたかな");
    }

    #[test]
    fn segment_serializes_without_missing_rt() {
        let json = serde_json::to_string(&Segment::plain("は")).unwrap();
        assert_eq!(json, r#"{"ruby":"は"}"#);
        let json = serde_json::to_string(&Segment::with_reading("君", "きみ")).unwrap();
        assert_eq!(json, r#"{"ruby":"君","rt":"きみ"}"#);
    }
}
