//! Dictionary corpus compiler.
//!
//! Parses the raw corpora with [`jisho_core`], loads them into a SQLite store
//! in batched transactions, links example sentences to words and builds the
//! full-text index. [`Pipeline`] is the entry point.

pub mod error;
pub mod pipeline;
pub mod store;
pub mod trace_init;

pub use error::PipelineError;
pub use pipeline::{
    load_settings, Phase, PhaseReport, PhaseStats, PhaseStatus, Pipeline, RunReport, Selection,
};
pub use store::{Store, StoreStats, WordRow};

pub use jisho_core;
