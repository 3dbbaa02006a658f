//! Destination schema.

use rusqlite::{params, Connection};

/// Bumped whenever a table definition changes.
pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY,
    surface TEXT,
    reading TEXT,
    identity TEXT NOT NULL UNIQUE,
    external_id TEXT,
    common INTEGER NOT NULL DEFAULT 0,
    source TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS senses (
    id INTEGER PRIMARY KEY,
    word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    gloss_text TEXT NOT NULL,
    glosses TEXT NOT NULL,
    parts_of_speech TEXT NOT NULL,
    field TEXT NOT NULL,
    misc TEXT NOT NULL,
    dialect TEXT NOT NULL,
    info TEXT,
    UNIQUE (word_id, position)
);

CREATE TABLE IF NOT EXISTS kanji (
    character TEXT PRIMARY KEY,
    legacy_code TEXT,
    codepoint TEXT,
    grade INTEGER,
    stroke_count INTEGER,
    frequency INTEGER,
    on_readings TEXT NOT NULL,
    kun_readings TEXT NOT NULL,
    nanori TEXT NOT NULL,
    meanings TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS examples (
    id INTEGER PRIMARY KEY,
    sentence TEXT NOT NULL,
    translation TEXT NOT NULL,
    corpus_id TEXT,
    breakdown TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS example_words (
    example_id INTEGER NOT NULL REFERENCES examples(id) ON DELETE CASCADE,
    word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
    PRIMARY KEY (example_id, word_id)
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS furigana (
    id INTEGER PRIMARY KEY,
    text TEXT NOT NULL,
    reading TEXT NOT NULL,
    segments TEXT NOT NULL,
    UNIQUE (text, reading)
);

CREATE TABLE IF NOT EXISTS import_log (
    source TEXT PRIMARY KEY,
    path TEXT NOT NULL,
    checksum INTEGER NOT NULL,
    processed INTEGER NOT NULL,
    valid INTEGER NOT NULL,
    inserted INTEGER NOT NULL,
    skipped INTEGER NOT NULL,
    errored INTEGER NOT NULL,
    imported_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_words_surface ON words(surface);
CREATE INDEX IF NOT EXISTS idx_words_reading ON words(reading);
CREATE INDEX IF NOT EXISTS idx_senses_word ON senses(word_id);
CREATE INDEX IF NOT EXISTS idx_example_words_word ON example_words(word_id);
"#;

/// Full-text index over word surface, reading and glosses. Trigram
/// tokenization handles unsegmented Japanese text.
pub const FTS_SCHEMA_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS word_search USING fts5(
    surface, reading, glosses,
    tokenize='trigram'
);
"#;

/// Tables cleared by a rebuild, children before parents. `furigana` is
/// absent on purpose: it is only ever upserted.
pub const REBUILT_TABLES: &[&str] = &[
    "word_search",
    "example_words",
    "examples",
    "senses",
    "words",
    "kanji",
    "import_log",
];

/// Every table `stats` reports on.
pub const ALL_TABLES: &[&str] = &[
    "words",
    "senses",
    "kanji",
    "examples",
    "example_words",
    "furigana",
    "word_search",
    "import_log",
];

/// Connection settings applied to every store connection.
pub fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
        ",
    )
}

/// Create missing tables and record the schema version. Never drops data.
pub fn apply(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(FTS_SCHEMA_SQL)?;
    conn.execute(
        "INSERT INTO meta(key, value) VALUES('schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// Version recorded in `meta`, if the store has one.
pub fn stored_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM meta WHERE key = 'schema_version'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => {
            let value: String = row.get(0)?;
            Ok(value.parse().ok())
        }
        None => Ok(None),
    }
}
