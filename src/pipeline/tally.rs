use std::io;
use std::path::{Path, PathBuf};

use jisho_core::source::{RecordStream, SourceError, SourceKind};
use tracing::warn;

use super::report::PhaseStats;
use crate::error::PipelineError;

/// Counts a record stream as it is consumed. Malformed records are logged
/// and skipped; an IO error ends the stream and is returned by
/// [`Tally::finish`].
pub struct Tally<'a, T> {
    stream: RecordStream<'a, T>,
    source: SourceKind,
    path: PathBuf,
    stats: PhaseStats,
    failure: Option<io::Error>,
}

impl<'a, T> Tally<'a, T> {
    pub fn new(stream: RecordStream<'a, T>, source: SourceKind, path: &Path) -> Self {
        Self {
            stream,
            source,
            path: path.to_path_buf(),
            stats: PhaseStats::default(),
            failure: None,
        }
    }

    /// Counted records not produced as entries for a reason other than a
    /// parse failure (duplicate suppression).
    pub fn add_skipped(&mut self, n: usize) {
        self.stats.skipped += n;
    }

    pub fn finish(self) -> Result<PhaseStats, PipelineError> {
        match self.failure {
            Some(e) => Err(PipelineError::io(self.path, e)),
            None => Ok(self.stats),
        }
    }
}

impl<T> Iterator for Tally<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.failure.is_some() {
            return None;
        }
        loop {
            match self.stream.next()? {
                Ok(entry) => {
                    self.stats.processed += 1;
                    self.stats.valid += 1;
                    return Some(entry);
                }
                Err(SourceError::Malformed { line, reason }) => {
                    self.stats.processed += 1;
                    self.stats.skipped += 1;
                    warn!(source = self.source.as_str(), line, %reason, "skipping malformed record");
                }
                Err(SourceError::Io(e)) => {
                    self.failure = Some(e);
                    return None;
                }
            }
        }
    }
}
