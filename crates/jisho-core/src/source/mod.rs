//! Format parsers for the raw corpora.
//!
//! Each parser turns one raw record into one structured entry or a
//! [`RejectReason`]. Streaming goes through [`RecordParser::parse_stream`],
//! which skips blank and comment lines and tags rejections with their line
//! number. Streams are restartable only by re-opening the source.

mod edict;
mod examples;
mod furigana;
mod jsonl;
mod kanjidic;
pub mod tags;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;

use encoding_rs::Encoding;
use tracing::warn;

pub use edict::{EdictParser, EdictRecord};
pub use examples::{ExampleParser, ExampleStream};
pub use furigana::FuriganaParser;
pub use jsonl::{JsonlParser, WordExpander, WordRecord};
pub use kanjidic::KanjidicParser;

/// The five input corpora.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Edict,
    Jmdict,
    Kanjidic,
    Examples,
    Furigana,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Edict,
        SourceKind::Jmdict,
        SourceKind::Kanjidic,
        SourceKind::Examples,
        SourceKind::Furigana,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Edict => "edict",
            SourceKind::Jmdict => "jmdict",
            SourceKind::Kanjidic => "kanjidic",
            SourceKind::Examples => "examples",
            SourceKind::Furigana => "furigana",
        }
    }

    /// Look up a source by name. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

/// Why a single record was rejected. Never fatal to the surrounding parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("blank record")]
    Blank,
    #[error("missing /.../ meaning block")]
    MissingMeanings,
    #[error("unterminated [reading] bracket")]
    UnterminatedReading,
    #[error("empty headword")]
    EmptyHeadword,
    #[error("no glosses")]
    NoGlosses,
    #[error("no readings")]
    NoReadings,
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("unterminated {{meaning}} group")]
    UnterminatedMeaning,
    #[error("missing kanji character")]
    MissingCharacter,
    #[error("primary line has no translation")]
    MissingTranslation,
    #[error("breakdown line without a primary line")]
    OrphanBreakdown,
    #[error("primary line without a breakdown line")]
    MissingBreakdown,
    #[error("unrecognised line: {0}")]
    UnexpectedLine(String),
    #[error("missing or empty field `{0}`")]
    MissingField(&'static str),
    #[error("no furigana segments")]
    NoSegments,
    #[error("invalid UTF-8 at byte {0} of the line")]
    InvalidUtf8(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: RejectReason },
}

/// Lazy sequence of parse results. Not seekable.
pub type RecordStream<'a, T> = Box<dyn Iterator<Item = Result<T, SourceError>> + 'a>;

/// A line-oriented source format.
pub trait RecordParser {
    type Entry;

    /// Parse one raw record.
    fn parse(&self, raw: &str) -> Result<Self::Entry, RejectReason>;

    /// Lines the format treats as comments.
    fn is_comment(&self, line: &str) -> bool;

    /// Parse every record of `reader` in order, one record per line.
    fn parse_stream<'a, R: BufRead + 'a>(&'a self, reader: R) -> RecordStream<'a, Self::Entry>
    where
        Self: Sized,
    {
        Box::new(LineRecords {
            parser: self,
            lines: SourceLines::new(reader),
            line_no: 0,
            done: false,
        })
    }
}

/// Physical lines of a source with the line terminator removed.
///
/// Unlike [`BufRead::lines`], a line that is not valid UTF-8 comes back as
/// an inner `Err` and the iterator keeps going; only a failed read is an
/// outer `Err`.
pub(crate) struct SourceLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> SourceLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for SourceLines<R> {
    type Item = io::Result<Result<String, RejectReason>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                let line = String::from_utf8(std::mem::take(&mut self.buf))
                    .map_err(|e| RejectReason::InvalidUtf8(e.utf8_error().valid_up_to()));
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

struct LineRecords<'a, P, R> {
    parser: &'a P,
    lines: SourceLines<R>,
    line_no: usize,
    done: bool,
}

impl<P: RecordParser, R: BufRead> Iterator for LineRecords<'_, P, R> {
    type Item = Result<P::Entry, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(SourceError::Io(e)));
                }
            };
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(reason) => {
                    return Some(Err(SourceError::Malformed {
                        line: self.line_no,
                        reason,
                    }))
                }
            };
            let line = line.strip_prefix('\u{FEFF}').unwrap_or(&line);
            if line.trim().is_empty() || self.parser.is_comment(line) {
                continue;
            }
            return Some(self.parser.parse(line).map_err(|reason| SourceError::Malformed {
                line: self.line_no,
                reason,
            }));
        }
    }
}

/// Open a text source, decoding it to UTF-8 when `encoding` is not UTF-8.
///
/// Non-UTF-8 files are decoded in full up front; replacement characters are
/// reported once per file and left in place.
pub fn open_text_source(path: &Path, encoding: &'static Encoding) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if encoding == encoding_rs::UTF_8 {
        return Ok(Box::new(BufReader::new(file)));
    }

    let mut bytes = Vec::new();
    BufReader::new(file).read_to_end(&mut bytes)?;
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(
            path = %path.display(),
            encoding = used.name(),
            "source contains undecodable bytes"
        );
    }
    Ok(Box::new(Cursor::new(text.into_owned().into_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UpperParser;

    impl RecordParser for UpperParser {
        type Entry = String;

        fn parse(&self, raw: &str) -> Result<String, RejectReason> {
            if raw.starts_with('!') {
                return Err(RejectReason::UnexpectedLine(raw.to_string()));
            }
            Ok(raw.to_uppercase())
        }

        fn is_comment(&self, line: &str) -> bool {
            line.starts_with('#')
        }
    }

    #[test]
    fn stream_skips_comments_and_reports_line_numbers() {
        let input = "\u{FEFF}abc\n# comment\n\n!bad\ndef\n";
        let parser = UpperParser;
        let results: Vec<_> = parser.parse_stream(input.as_bytes()).collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), "ABC");
        match &results[1] {
            Err(SourceError::Malformed { line, .. }) => assert_eq!(*line, 4),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(results[2].as_ref().unwrap(), "DEF");
    }

    #[test]
    fn undecodable_line_is_rejected_and_stream_continues() {
        let mut input = b"abc\n".to_vec();
        input.extend_from_slice(b"d\xff\xfe\r\n");
        input.extend_from_slice("def\r\nかな".as_bytes());
        let parser = UpperParser;
        let results: Vec<_> = parser.parse_stream(&input[..]).collect();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap(), "ABC");
        match &results[1] {
            Err(SourceError::Malformed { line, reason }) => {
                assert_eq!(*line, 2);
                assert_eq!(*reason, RejectReason::InvalidUtf8(1));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(results[2].as_ref().unwrap(), "DEF");
        assert_eq!(results[3].as_ref().unwrap(), "かな");
    }

    #[test]
    fn source_kind_names_round_trip() {
        for kind in SourceKind::ALL {
            assert_eq!(SourceKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(SourceKind::from_name("mozc"), None);
    }

    #[test]
    fn open_text_source_decodes_euc_jp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edict");
        let (bytes, _, _) = encoding_rs::EUC_JP.encode("犬 [いぬ] /(n) dog/\n");
        std::fs::write(&path, &bytes).unwrap();

        let reader = open_text_source(&path, encoding_rs::EUC_JP).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["犬 [いぬ] /(n) dog/"]);
    }
}
