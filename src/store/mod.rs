//! SQLite destination store.
//!
//! `Store` owns the single connection of a run. Writers in [`writer`] and the
//! batch loader in [`batch`] take a `&Connection` so they can run under a
//! transaction or savepoint the caller holds.

pub mod batch;
pub mod import_log;
pub mod schema;
pub mod search;
pub mod writer;

#[cfg(test)]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};

use jisho_core::annotation::parse_furigana_str;
use jisho_core::entry::Segment;
use jisho_core::linker::WordId;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::debug;

use crate::error::PipelineError;
pub use import_log::ImportRecord;

/// A word row as the form index needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRow {
    pub id: WordId,
    pub surface: Option<String>,
    pub reading: Option<String>,
}

/// An example row as the linker needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredExample {
    pub id: i64,
    pub sentence: String,
    pub breakdown: String,
}

/// Row counts and import history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub schema_version: Option<i64>,
    pub tables: Vec<(String, i64)>,
    pub imports: Vec<ImportRecord>,
}

pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        let conn = Connection::open(path)?;
        schema::configure(&conn)?;
        debug!(path = %path.display(), "store opened");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// In-memory store, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self, PipelineError> {
        let conn = Connection::open_in_memory()?;
        schema::configure(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn transaction(&mut self) -> rusqlite::Result<Transaction<'_>> {
        self.conn.transaction()
    }

    pub fn apply_schema(&self) -> rusqlite::Result<()> {
        schema::apply(&self.conn)
    }

    /// Empty `tables` in one transaction.
    pub fn truncate(&mut self, tables: &[&str]) -> rusqlite::Result<()> {
        let tx = self.conn.transaction()?;
        for table in tables {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        tx.commit()
    }

    /// Every word, in id order.
    pub fn word_rows(&self) -> rusqlite::Result<Vec<WordRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, surface, reading FROM words ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(WordRow {
                id: row.get(0)?,
                surface: row.get(1)?,
                reading: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    /// Every example, in id order.
    pub fn examples(&self) -> rusqlite::Result<Vec<StoredExample>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, sentence, breakdown FROM examples ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredExample {
                id: row.get(0)?,
                sentence: row.get(1)?,
                breakdown: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    pub fn count(&self, table: &str) -> rusqlite::Result<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
    }

    /// Stored furigana for `(text, reading)`.
    pub fn furigana(&self, text: &str, reading: &str) -> rusqlite::Result<Option<Vec<Segment>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT segments FROM furigana WHERE text = ?1 AND reading = ?2",
                params![text, reading],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw.map(|r| parse_furigana_str(&r)))
    }

    /// Words matching a full-text query, best match first.
    pub fn search(&self, query: &str, limit: usize) -> rusqlite::Result<Vec<WordRow>> {
        let ids = search::search_words(&self.conn, query, limit)?;
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, surface, reading FROM words WHERE id = ?1")?;
        ids.into_iter()
            .map(|id| {
                stmt.query_row([id], |row| {
                    Ok(WordRow {
                        id: row.get(0)?,
                        surface: row.get(1)?,
                        reading: row.get(2)?,
                    })
                })
            })
            .collect()
    }

    pub fn stats(&self) -> rusqlite::Result<StoreStats> {
        let mut tables = Vec::with_capacity(schema::ALL_TABLES.len());
        for table in schema::ALL_TABLES {
            tables.push((table.to_string(), self.count(table)?));
        }
        Ok(StoreStats {
            schema_version: schema::stored_version(&self.conn)?,
            tables,
            imports: import_log::read_imports(&self.conn)?,
        })
    }

    /// Reclaim free pages. Must run outside any transaction.
    pub fn compact(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch("VACUUM")
    }

    /// Close the connection, reporting any error from the final flush.
    pub fn close(self) -> Result<(), PipelineError> {
        self.conn.close().map_err(|(_, e)| PipelineError::Store(e))
    }
}
