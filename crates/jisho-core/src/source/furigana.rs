//! Furigana mapping source: one JSON array of
//! `{ "text": ..., "reading": ..., "furigana": [{"ruby": ..., "rt": ...}, ...] }`.
//!
//! Elements are validated one by one so a bad element never loses the rest
//! of the file. Rejections carry the 1-based element index as their line.

use std::io::BufRead;

use serde_json::Value;
use tracing::warn;

use super::{RecordParser, RecordStream, RejectReason, SourceError};
use crate::annotation;
use crate::entry::FuriganaEntry;

pub struct FuriganaParser;

fn required_str<'a>(item: &'a Value, field: &'static str) -> Result<&'a str, RejectReason> {
    item.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(RejectReason::MissingField(field))
}

impl FuriganaParser {
    /// Validate one decoded array element.
    pub fn parse_value(&self, item: &Value) -> Result<FuriganaEntry, RejectReason> {
        let text = required_str(item, "text")?;
        let reading = required_str(item, "reading")?;
        let segments = annotation::segments_or_tokens(item.get("furigana"), text);
        if segments.is_empty() {
            return Err(RejectReason::NoSegments);
        }
        Ok(FuriganaEntry {
            text: text.to_string(),
            reading: reading.to_string(),
            segments,
        })
    }
}

impl RecordParser for FuriganaParser {
    type Entry = FuriganaEntry;

    /// Parse a single JSON object.
    fn parse(&self, raw: &str) -> Result<FuriganaEntry, RejectReason> {
        let raw = raw.trim().trim_end_matches(',');
        if raw.is_empty() {
            return Err(RejectReason::Blank);
        }
        let item: Value = serde_json::from_str(raw).map_err(|e| RejectReason::Json(e.to_string()))?;
        self.parse_value(&item)
    }

    fn is_comment(&self, _line: &str) -> bool {
        false
    }

    fn parse_stream<'a, R: BufRead + 'a>(&'a self, mut reader: R) -> RecordStream<'a, FuriganaEntry> {
        let mut bytes = Vec::new();
        if let Err(e) = reader.read_to_end(&mut bytes) {
            return Box::new(std::iter::once(Err(SourceError::Io(e))));
        }
        let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
        if had_errors {
            warn!("furigana source contains undecodable bytes");
        }
        if text.trim().is_empty() {
            return Box::new(std::iter::empty());
        }

        let items = match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                return Box::new(std::iter::once(Err(SourceError::Malformed {
                    line: 1,
                    reason: RejectReason::Json("expected a top-level array".into()),
                })))
            }
            Err(e) => {
                return Box::new(std::iter::once(Err(SourceError::Malformed {
                    line: e.line(),
                    reason: RejectReason::Json(e.to_string()),
                })))
            }
        };

        Box::new(items.into_iter().enumerate().map(move |(i, item)| {
            self.parse_value(&item)
                .map_err(|reason| SourceError::Malformed { line: i + 1, reason })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Segment;

    fn collect(input: &str) -> Vec<Result<FuriganaEntry, SourceError>> {
        FuriganaParser.parse_stream(input.as_bytes()).collect()
    }

    #[test]
    fn parses_structured_elements() {
        let input = r#"[
            {"text": "大人しい", "reading": "おとなしい", "furigana": [{"ruby": "大人", "rt": "おとな"}, {"ruby": "しい"}]},
            {"text": "犬", "reading": "いぬ", "furigana": [{"ruby": "犬", "rt": "いぬ"}]}
        ]"#;
        let items = collect(input);
        assert_eq!(items.len(), 2);
        let first = items[0].as_ref().unwrap();
        assert_eq!(first.text, "大人しい");
        assert_eq!(
            first.segments,
            vec![Segment::with_reading("大人", "おとな"), Segment::plain("しい")]
        );
    }

    #[test]
    fn invalid_segment_list_falls_back_to_text() {
        let entry = FuriganaParser
            .parse(r#"{"text": "猫", "reading": "ねこ", "furigana": [{"rt": "ねこ"}]}"#)
            .unwrap();
        assert_eq!(entry.segments, vec![Segment::plain("猫")]);
    }

    #[test]
    fn string_furigana_is_tokenized() {
        let entry = FuriganaParser
            .parse(r#"{"text": "猫", "reading": "ねこ", "furigana": "猫(ねこ)"}"#)
            .unwrap();
        assert_eq!(entry.segments, vec![Segment::with_reading("猫", "ねこ")]);
    }

    #[test]
    fn bad_elements_do_not_stop_the_file() {
        let input = r#"[{"reading": "いぬ"}, {"text": "犬", "reading": ""}, 42, {"text": "犬", "reading": "いぬ"}]"#;
        let items = collect(input);
        assert_eq!(items.len(), 4);
        assert!(matches!(
            &items[0],
            Err(SourceError::Malformed { line: 1, reason: RejectReason::MissingField("text") })
        ));
        assert!(matches!(
            &items[1],
            Err(SourceError::Malformed { line: 2, reason: RejectReason::MissingField("reading") })
        ));
        assert!(items[2].is_err());
        assert_eq!(items[3].as_ref().unwrap().segments, vec![Segment::plain("犬")]);
    }

    #[test]
    fn undecodable_bytes_are_replaced() {
        let mut input = r#"[{"text": "犬", "reading": "いぬ"}, {"text": "x"#.as_bytes().to_vec();
        input.push(0xff);
        input.extend_from_slice(r#"", "reading": "えっくす"}]"#.as_bytes());
        let items: Vec<_> = FuriganaParser.parse_stream(&input[..]).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().text, "犬");
        assert_eq!(items[1].as_ref().unwrap().text, "x\u{FFFD}");
    }

    #[test]
    fn document_level_errors() {
        let items = collect("{\"text\": \"x\"}");
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
        assert_eq!(collect("[1, 2").len(), 1);
        assert!(collect("  \n").is_empty());
    }
}
