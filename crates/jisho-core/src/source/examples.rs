//! Paired-line example corpus:
//!
//! ```text
//! A: 彼は忙しい生活の中で家族と会うことがない。	He doesn't see his family in his busy life.#ID=303645_494293
//! B: 彼(かれ)[01] は 忙しい 生活 の 中 で 家族 と 会う 事(こと){こと} が 無い{ない}
//! ```
//!
//! The `B:` breakdown is stored verbatim; annotation parsing happens later.

use std::io::BufRead;

use super::{RecordParser, RecordStream, RejectReason, SourceError, SourceLines};
use crate::entry::ExampleEntry;

const PRIMARY_PREFIX: &str = "A:";
const SECONDARY_PREFIX: &str = "B:";
const ID_MARKER: &str = "#ID=";

pub struct ExampleParser;

struct Primary {
    sentence: String,
    translation: String,
    corpus_id: Option<String>,
}

impl Primary {
    fn with_breakdown(self, breakdown: &str) -> ExampleEntry {
        ExampleEntry {
            sentence: self.sentence,
            translation: self.translation,
            corpus_id: self.corpus_id,
            breakdown: breakdown.trim().to_string(),
        }
    }
}

/// Sentence and translation are separated by a tab, or failing that by the
/// first run of two or more spaces.
fn split_primary(body: &str) -> Option<(&str, &str)> {
    if let Some((left, right)) = body.split_once('\t') {
        return Some((left, right));
    }
    let gap = body.find("  ")?;
    Some((&body[..gap], &body[gap..]))
}

fn parse_primary(line: &str) -> Result<Primary, RejectReason> {
    let body = line
        .strip_prefix(PRIMARY_PREFIX)
        .ok_or_else(|| RejectReason::UnexpectedLine(line.to_string()))?;
    let (sentence, rest) = split_primary(body.trim()).ok_or(RejectReason::MissingTranslation)?;

    let (translation, corpus_id) = match rest.rfind(ID_MARKER) {
        Some(idx) => {
            let id = rest[idx + ID_MARKER.len()..].trim();
            (&rest[..idx], (!id.is_empty()).then(|| id.to_string()))
        }
        None => (rest, None),
    };

    let sentence = sentence.trim();
    let translation = translation.trim();
    if sentence.is_empty() || translation.is_empty() {
        return Err(RejectReason::MissingTranslation);
    }
    Ok(Primary {
        sentence: sentence.to_string(),
        translation: translation.to_string(),
        corpus_id,
    })
}

impl RecordParser for ExampleParser {
    type Entry = ExampleEntry;

    /// Parse one `A:` line and its `B:` line, joined by a newline.
    fn parse(&self, raw: &str) -> Result<ExampleEntry, RejectReason> {
        let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
        let first = lines.next().ok_or(RejectReason::Blank)?;
        if first.starts_with(SECONDARY_PREFIX) {
            return Err(RejectReason::OrphanBreakdown);
        }
        let primary = parse_primary(first)?;
        let breakdown = lines
            .next()
            .and_then(|l| l.strip_prefix(SECONDARY_PREFIX))
            .ok_or(RejectReason::MissingBreakdown)?;
        Ok(primary.with_breakdown(breakdown))
    }

    fn is_comment(&self, line: &str) -> bool {
        line.starts_with('#')
    }

    fn parse_stream<'a, R: BufRead + 'a>(&'a self, reader: R) -> RecordStream<'a, ExampleEntry> {
        Box::new(ExampleStream::new(reader))
    }
}

/// Pairs `A:`/`B:` lines in order. Unpaired lines surface as rejections and
/// never stop the stream.
pub struct ExampleStream<R> {
    lines: SourceLines<R>,
    line_no: usize,
    pending: Option<(usize, Primary)>,
    /// Set after a rejected `A:` line so its `B:` line is not reported twice.
    discard_breakdown: bool,
    /// A second rejection produced by the same line, returned on the next call.
    queued: Option<(usize, RejectReason)>,
    done: bool,
}

impl<R: BufRead> ExampleStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: SourceLines::new(reader),
            line_no: 0,
            pending: None,
            discard_breakdown: false,
            queued: None,
            done: false,
        }
    }

    fn malformed(line: usize, reason: RejectReason) -> Option<Result<ExampleEntry, SourceError>> {
        Some(Err(SourceError::Malformed { line, reason }))
    }
}

impl<R: BufRead> Iterator for ExampleStream<R> {
    type Item = Result<ExampleEntry, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((line, reason)) = self.queued.take() {
            return Self::malformed(line, reason);
        }
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(SourceError::Io(e)));
                }
                None => {
                    self.done = true;
                    let (line, _) = self.pending.take()?;
                    return Self::malformed(line, RejectReason::MissingBreakdown);
                }
            };
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(reason) => {
                    self.discard_breakdown = false;
                    return Self::malformed(self.line_no, reason);
                }
            };
            let line = line.strip_prefix('\u{FEFF}').unwrap_or(&line).trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(breakdown) = line.strip_prefix(SECONDARY_PREFIX) {
                if let Some((_, primary)) = self.pending.take() {
                    return Some(Ok(primary.with_breakdown(breakdown)));
                }
                if std::mem::take(&mut self.discard_breakdown) {
                    continue;
                }
                return Self::malformed(self.line_no, RejectReason::OrphanBreakdown);
            }

            if line.starts_with(PRIMARY_PREFIX) {
                let previous = self.pending.take().map(|(line, _)| line);
                let rejected = match parse_primary(line) {
                    Ok(primary) => {
                        self.discard_breakdown = false;
                        self.pending = Some((self.line_no, primary));
                        None
                    }
                    Err(reason) => {
                        self.discard_breakdown = true;
                        Some((self.line_no, reason))
                    }
                };
                match (previous, rejected) {
                    (Some(prev), Some(current)) => {
                        self.queued = Some(current);
                        return Self::malformed(prev, RejectReason::MissingBreakdown);
                    }
                    (Some(prev), None) => {
                        return Self::malformed(prev, RejectReason::MissingBreakdown);
                    }
                    (None, Some((line, reason))) => return Self::malformed(line, reason),
                    (None, None) => continue,
                }
            }

            self.discard_breakdown = false;
            return Self::malformed(self.line_no, RejectReason::UnexpectedLine(line.to_string()));
        }
    }
}
