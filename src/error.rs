use std::io;
use std::path::PathBuf;

use jisho_core::settings::SettingsError;

/// A failure that stops a run. Malformed records, missing source files and
/// rolled-back batches are recovered where they happen and only show up in
/// the [`RunReport`](crate::RunReport); everything here aborts the run before
/// its final commit, leaving the live store untouched.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
