//! Per-source import bookkeeping.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use rusqlite::{params, Connection};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// One row of `import_log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub source: String,
    pub path: String,
    /// CRC-32 of the raw file bytes.
    pub checksum: u32,
    pub processed: usize,
    pub valid: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub errored: usize,
    /// RFC 3339, UTC.
    pub imported_at: String,
}

pub fn file_checksum(path: &Path) -> io::Result<u32> {
    let mut file = File::open(path)?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Current time in RFC 3339. Falls back to the Unix epoch rendering if the
/// clock is out of the formattable range.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub fn record_import(conn: &Connection, record: &ImportRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO import_log(source, path, checksum, processed, valid, inserted,
                                           skipped, errored, imported_at)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.source,
            record.path,
            record.checksum,
            record.processed as i64,
            record.valid as i64,
            record.inserted as i64,
            record.skipped as i64,
            record.errored as i64,
            record.imported_at,
        ],
    )?;
    Ok(())
}

pub fn read_imports(conn: &Connection) -> rusqlite::Result<Vec<ImportRecord>> {
    let mut stmt = conn.prepare(
        "SELECT source, path, checksum, processed, valid, inserted, skipped, errored, imported_at
         FROM import_log ORDER BY source",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ImportRecord {
            source: row.get(0)?,
            path: row.get(1)?,
            checksum: row.get(2)?,
            processed: row.get::<_, i64>(3)? as usize,
            valid: row.get::<_, i64>(4)? as usize,
            inserted: row.get::<_, i64>(5)? as usize,
            skipped: row.get::<_, i64>(6)? as usize,
            errored: row.get::<_, i64>(7)? as usize,
            imported_at: row.get(8)?,
        })
    })?;
    rows.collect()
}
