//! Row writers. Each takes a plain connection so it can run under whatever
//! savepoint the caller holds.

use jisho_core::entry::{ExampleEntry, FuriganaEntry, KanjiEntry, WordEntry};
use jisho_core::linker::WordId;
use rusqlite::{params, Connection};
use serde::Serialize;

/// Serialize a list column. Failures surface as conversion errors so they
/// are confined to the batch.
fn json<T: Serialize + ?Sized>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Insert a word and its senses. Returns the number of rows written.
pub fn insert_word(conn: &Connection, word: &WordEntry) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO words(surface, reading, identity, external_id, common, source)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            word.surface,
            word.reading,
            word.identity(),
            word.external_id,
            word.common,
            word.source.as_str(),
        ],
    )?;
    let word_id = conn.last_insert_rowid();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO senses(word_id, position, gloss_text, glosses, parts_of_speech, field, misc, dialect, info)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for (position, sense) in word.senses.iter().enumerate() {
        stmt.execute(params![
            word_id,
            position as i64,
            sense.gloss_text(),
            json(&sense.glosses)?,
            json(&sense.parts_of_speech)?,
            json(&sense.field)?,
            json(&sense.misc)?,
            json(&sense.dialect)?,
            sense.info,
        ])?;
    }
    Ok(1 + word.senses.len())
}

/// Insert or overwrite a kanji row keyed by its character.
pub fn upsert_kanji(conn: &Connection, kanji: &KanjiEntry) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR REPLACE INTO kanji(character, legacy_code, codepoint, grade, stroke_count, frequency,
                                      on_readings, kun_readings, nanori, meanings)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    stmt.execute(params![
        kanji.character,
        kanji.legacy_code,
        kanji.codepoint,
        kanji.grade,
        kanji.stroke_count,
        kanji.frequency,
        json(&kanji.on_readings)?,
        json(&kanji.kun_readings)?,
        json(&kanji.nanori)?,
        json(&kanji.meanings)?,
    ])
}

/// Insert an example and return its row id.
pub fn insert_example(conn: &Connection, example: &ExampleEntry) -> rusqlite::Result<i64> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO examples(sentence, translation, corpus_id, breakdown) VALUES(?1, ?2, ?3, ?4)",
    )?;
    stmt.execute(params![
        example.sentence,
        example.translation,
        example.corpus_id,
        example.breakdown,
    ])?;
    Ok(conn.last_insert_rowid())
}

/// Link an example to words. A pair that already exists is left alone.
/// Returns the number of new links.
pub fn insert_links(conn: &Connection, example_id: i64, word_ids: &[WordId]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO example_words(example_id, word_id) VALUES(?1, ?2)",
    )?;
    let mut added = 0;
    for word_id in word_ids {
        added += stmt.execute(params![example_id, word_id])?;
    }
    Ok(added)
}

/// Insert furigana for `(text, reading)`, replacing the segments of an
/// existing row instead of adding a second one.
pub fn upsert_furigana(conn: &Connection, entry: &FuriganaEntry) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO furigana(text, reading, segments) VALUES(?1, ?2, ?3)
         ON CONFLICT(text, reading) DO UPDATE SET segments = excluded.segments",
    )?;
    stmt.execute(params![entry.text, entry.reading, json(&entry.segments)?])
}
