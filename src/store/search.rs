use rusqlite::Connection;

/// Rebuild the full-text index from `words` and `senses`. Returns the number
/// of indexed words.
pub fn rebuild_search_index(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM word_search", [])?;
    let indexed = conn.execute(
        "INSERT INTO word_search(rowid, surface, reading, glosses)
         SELECT w.id,
                COALESCE(w.surface, ''),
                COALESCE(w.reading, ''),
                COALESCE((SELECT group_concat(gloss_text, ' | ')
                          FROM (SELECT gloss_text FROM senses
                                WHERE word_id = w.id ORDER BY position)), '')
         FROM words w
         ORDER BY w.id",
        [],
    )?;
    Ok(indexed)
}

/// Merge FTS segments. Purely an optimisation; the index is complete without it.
pub fn optimize_search_index(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("INSERT INTO word_search(word_search) VALUES('optimize')", [])?;
    Ok(())
}

/// Word ids whose surface, reading or glosses match an FTS5 query, best first.
pub fn search_words(conn: &Connection, query: &str, limit: usize) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT rowid FROM word_search WHERE word_search MATCH ?1 ORDER BY rank LIMIT ?2",
    )?;
    let ids = stmt
        .query_map(rusqlite::params![query, limit as i64], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}
