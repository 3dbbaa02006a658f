//! Line-delimited word records, one JSON object per line:
//! `{"r": [...], "k": [...], "s": [{"g": [...], "pos": [...], ...}]}`.

use std::collections::HashSet;

use serde::Deserialize;

use super::{RecordParser, RejectReason};
use crate::entry::{Sense, WordEntry, WordSource};
use crate::normalize::identity_key;

pub struct JsonlParser;

/// A validated word record. Readings and senses are never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    pub readings: Vec<String>,
    pub kanji: Vec<String>,
    pub senses: Vec<Sense>,
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    r: Vec<String>,
    #[serde(default)]
    k: Option<Vec<String>>,
    #[serde(default)]
    s: Vec<RawSense>,
}

#[derive(Deserialize)]
struct RawSense {
    #[serde(default)]
    g: Vec<String>,
    #[serde(default)]
    pos: Vec<String>,
    #[serde(default)]
    field: Option<Vec<String>>,
    #[serde(default)]
    misc: Option<Vec<String>>,
    #[serde(default)]
    info: Option<String>,
    /// Gloss type (`lit`, `fig`, `expl`).
    #[serde(default)]
    gt: Option<String>,
}

fn clean(values: impl IntoIterator<Item = String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl RawSense {
    fn into_sense(self) -> Option<Sense> {
        let glosses = clean(self.g);
        if glosses.is_empty() {
            return None;
        }
        let mut misc = clean(self.misc.unwrap_or_default());
        if let Some(gt) = self.gt.map(|g| g.trim().to_string()).filter(|g| !g.is_empty()) {
            misc.push(gt);
        }
        Some(Sense {
            glosses,
            parts_of_speech: clean(self.pos),
            field: clean(self.field.unwrap_or_default()),
            misc,
            dialect: Vec::new(),
            info: self.info.map(|i| i.trim().to_string()).filter(|i| !i.is_empty()),
        })
    }
}

impl RecordParser for JsonlParser {
    type Entry = WordRecord;

    fn parse(&self, raw: &str) -> Result<WordRecord, RejectReason> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RejectReason::Blank);
        }
        let record: RawRecord =
            serde_json::from_str(raw).map_err(|e| RejectReason::Json(e.to_string()))?;

        let readings = clean(record.r);
        if readings.is_empty() {
            return Err(RejectReason::NoReadings);
        }
        let senses: Vec<Sense> = record
            .s
            .into_iter()
            .filter_map(RawSense::into_sense)
            .collect();
        if senses.is_empty() {
            return Err(RejectReason::NoGlosses);
        }

        Ok(WordRecord {
            readings,
            kanji: clean(record.k.unwrap_or_default()),
            senses,
        })
    }

    fn is_comment(&self, line: &str) -> bool {
        line.trim_start().starts_with("//")
    }
}

/// Expands word records into word entries: one reading-only entry per
/// reading, then one entry per (kanji, reading) pair.
///
/// Identities already produced earlier in the run are suppressed here, at
/// generation time, rather than left for a later merge pass.
#[derive(Default)]
pub struct WordExpander {
    seen: HashSet<String>,
    suppressed: usize,
}

impl WordExpander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expand(&mut self, record: &WordRecord) -> Vec<WordEntry> {
        let mut out = Vec::new();
        let pairs = record
            .readings
            .iter()
            .map(|r| (None, r))
            .chain(
                record
                    .kanji
                    .iter()
                    .flat_map(|k| record.readings.iter().map(move |r| (Some(k), r))),
            );

        for (kanji, reading) in pairs {
            let key = identity_key(kanji.map(String::as_str), Some(reading));
            if !self.seen.insert(key) {
                self.suppressed += 1;
                continue;
            }
            out.push(WordEntry {
                surface: kanji.cloned(),
                reading: Some(reading.clone()),
                senses: record.senses.clone(),
                external_id: None,
                common: false,
                source: WordSource::Jmdict,
            });
        }
        out
    }

    /// Entries dropped because their identity was already generated.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABERU: &str = r#"{"r":["たべる"],"k":["食べる","喰べる"],"s":[{"g":["to eat"],"pos":["v1","vt"]},{"g":["to live on"],"pos":["v1"],"misc":["col"],"gt":"fig","info":"usu. as 食べていく"}]}"#;

    #[test]
    fn parses_full_record() {
        let rec = JsonlParser.parse(TABERU).unwrap();
        assert_eq!(rec.readings, vec!["たべる"]);
        assert_eq!(rec.kanji, vec!["食べる", "喰べる"]);
        assert_eq!(rec.senses.len(), 2);
        assert_eq!(rec.senses[0].parts_of_speech, vec!["v1", "vt"]);
        assert_eq!(rec.senses[1].misc, vec!["col", "fig"]);
        assert_eq!(rec.senses[1].info.as_deref(), Some("usu. as 食べていく"));
    }

    #[test]
    fn kanji_list_is_optional() {
        let rec = JsonlParser
            .parse(r#"{"r":["すごい"],"s":[{"g":["amazing"],"pos":["adj-i"]}]}"#)
            .unwrap();
        assert!(rec.kanji.is_empty());
    }

    #[test]
    fn rejects_invalid_records() {
        assert!(matches!(
            JsonlParser.parse("{not json"),
            Err(RejectReason::Json(_))
        ));
        assert_eq!(
            JsonlParser.parse(r#"{"r":[],"s":[{"g":["x"]}]}"#),
            Err(RejectReason::NoReadings)
        );
        assert_eq!(
            JsonlParser.parse(r#"{"r":["あ"],"s":[{"g":[" "]}]}"#),
            Err(RejectReason::NoGlosses)
        );
        assert!(matches!(
            JsonlParser.parse(r#"{"r":"あ","s":[]}"#),
            Err(RejectReason::Json(_))
        ));
    }

    #[test]
    fn comment_lines() {
        assert!(JsonlParser.is_comment("// generated file"));
        assert!(!JsonlParser.is_comment(r#"{"r":["あ"]}"#));
    }

    #[test]
    fn expands_readings_and_pairs() {
        let rec = JsonlParser.parse(TABERU).unwrap();
        let mut expander = WordExpander::new();
        let words = expander.expand(&rec);
        let ids: Vec<String> = words.iter().map(WordEntry::identity).collect();
        assert_eq!(ids, vec![":たべる", "食べる:たべる", "喰べる:たべる"]);
        assert!(words.iter().all(|w| w.senses.len() == 2));
    }

    #[test]
    fn suppresses_identities_seen_earlier_in_run() {
        let mut expander = WordExpander::new();
        let first = JsonlParser
            .parse(r#"{"r":["はし"],"k":["橋"],"s":[{"g":["bridge"]}]}"#)
            .unwrap();
        let second = JsonlParser
            .parse(r#"{"r":["はし"],"k":["箸"],"s":[{"g":["chopsticks"]}]}"#)
            .unwrap();
        assert_eq!(expander.expand(&first).len(), 2);
        let words = expander.expand(&second);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].surface.as_deref(), Some("箸"));
        assert_eq!(expander.suppressed(), 1);
    }
}
