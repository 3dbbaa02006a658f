use jisho_core::entry::{
    ExampleEntry, FuriganaEntry, KanjiEntry, Segment, Sense, WordEntry, WordSource,
};

use super::batch::{is_integrity_violation, load_in_batches};
use super::*;

fn store() -> Store {
    let store = Store::open_in_memory().unwrap();
    store.apply_schema().unwrap();
    store
}

fn word(surface: &str, reading: &str, gloss: &str) -> WordEntry {
    WordEntry {
        surface: Some(surface.to_string()),
        reading: Some(reading.to_string()),
        senses: vec![Sense {
            glosses: vec![gloss.to_string()],
            parts_of_speech: vec!["n".to_string()],
            ..Default::default()
        }],
        external_id: None,
        common: false,
        source: WordSource::Edict,
    }
}

#[test]
fn schema_apply_is_idempotent() {
    let store = store();
    store.apply_schema().unwrap();
    assert_eq!(
        schema::stored_version(store.conn()).unwrap(),
        Some(schema::SCHEMA_VERSION)
    );
    assert_eq!(store.count("words").unwrap(), 0);
}

#[test]
fn word_and_senses_round_trip() {
    let store = store();
    let mut w = word("思いやり", "おもいやり", "consideration");
    w.senses[0].glosses.push("thoughtfulness".into());
    w.external_id = Some("EntL1309180X".into());
    w.common = true;
    assert_eq!(writer::insert_word(store.conn(), &w).unwrap(), 2);

    let (identity, common): (String, bool) = store
        .conn()
        .query_row("SELECT identity, common FROM words", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(identity, "思いやり:おもいやり");
    assert!(common);

    let (gloss_text, glosses): (String, String) = store
        .conn()
        .query_row("SELECT gloss_text, glosses FROM senses", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(gloss_text, "consideration/thoughtfulness");
    assert_eq!(glosses, r#"["consideration","thoughtfulness"]"#);
}

#[test]
fn failing_batch_rolls_back_alone() {
    let mut store = store();
    let words = vec![
        word("一", "いち", "one"),
        word("二", "に", "two"),
        word("三", "さん", "three"),
        word("一", "いち", "duplicate"),
        word("五", "ご", "five"),
    ];
    let mut tx = store.transaction().unwrap();
    let outcome = load_in_batches(&mut tx, words, 2, "words", |conn, w| {
        writer::insert_word(conn, w).map(|_| 1)
    })
    .unwrap();
    tx.commit().unwrap();

    assert_eq!(outcome.batches, 3);
    assert_eq!(outcome.failed_batches, 1);
    assert_eq!(outcome.inserted, 3);
    assert_eq!(outcome.errored, 2);
    assert_eq!(store.count("words").unwrap(), 3);
    // Senses of the rolled-back batch are gone too.
    assert_eq!(store.count("senses").unwrap(), 3);
    let rows = store.word_rows().unwrap();
    let surfaces: Vec<_> = rows.iter().map(|r| r.surface.as_deref().unwrap()).collect();
    assert_eq!(surfaces, vec!["一", "二", "五"]);
}

#[test]
fn non_integrity_errors_propagate() {
    let mut store = store();
    let mut tx = store.transaction().unwrap();
    let result = load_in_batches(&mut tx, vec![1, 2, 3], 10, "test", |_, _| {
        Err(rusqlite::Error::InvalidQuery)
    });
    assert!(matches!(result, Err(rusqlite::Error::InvalidQuery)));
    assert!(!is_integrity_violation(&rusqlite::Error::InvalidQuery));
}

#[test]
fn kanji_reimport_overwrites_by_character() {
    let store = store();
    let mut k = KanjiEntry {
        character: "亜".into(),
        stroke_count: Some(7),
        meanings: vec!["Asia".into()],
        ..Default::default()
    };
    writer::upsert_kanji(store.conn(), &k).unwrap();
    k.meanings = vec!["Asia".into(), "rank next".into()];
    writer::upsert_kanji(store.conn(), &k).unwrap();

    assert_eq!(store.count("kanji").unwrap(), 1);
    let meanings: String = store
        .conn()
        .query_row("SELECT meanings FROM kanji WHERE character = '亜'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(meanings, r#"["Asia","rank next"]"#);
}

#[test]
fn furigana_upsert_replaces_segments() {
    let store = store();
    let first = FuriganaEntry {
        text: "大人しい".into(),
        reading: "おとなしい".into(),
        segments: vec![Segment::plain("大人しい")],
    };
    let second = FuriganaEntry {
        segments: vec![Segment::with_reading("大人", "おとな"), Segment::plain("しい")],
        ..first.clone()
    };
    writer::upsert_furigana(store.conn(), &first).unwrap();
    writer::upsert_furigana(store.conn(), &second).unwrap();

    assert_eq!(store.count("furigana").unwrap(), 1);
    assert_eq!(
        store.furigana("大人しい", "おとなしい").unwrap(),
        Some(second.segments)
    );
    assert_eq!(store.furigana("大人しい", "たいじんしい").unwrap(), None);
}

#[test]
fn links_are_unique_per_pair() {
    let store = store();
    writer::insert_word(store.conn(), &word("君", "きみ", "you")).unwrap();
    let word_id = store.conn().last_insert_rowid();
    let example = ExampleEntry {
        sentence: "君だ。".into(),
        translation: "It's you.".into(),
        corpus_id: None,
        breakdown: "君(きみ) だ".into(),
    };
    let example_id = writer::insert_example(store.conn(), &example).unwrap();

    assert_eq!(
        writer::insert_links(store.conn(), example_id, &[word_id, word_id]).unwrap(),
        1
    );
    assert_eq!(writer::insert_links(store.conn(), example_id, &[word_id]).unwrap(), 0);
    assert_eq!(store.count("example_words").unwrap(), 1);
}

#[test]
fn link_to_unknown_word_is_an_integrity_violation() {
    let store = store();
    let example = ExampleEntry {
        sentence: "x".into(),
        translation: "x".into(),
        corpus_id: None,
        breakdown: "x".into(),
    };
    let example_id = writer::insert_example(store.conn(), &example).unwrap();
    let err = writer::insert_links(store.conn(), example_id, &[999]).unwrap_err();
    assert!(is_integrity_violation(&err));
}

#[test]
fn search_index_covers_glosses_and_readings() {
    let store = store();
    writer::insert_word(store.conn(), &word("思いやり", "おもいやり", "consideration")).unwrap();
    writer::insert_word(store.conn(), &word("犬", "いぬ", "dog")).unwrap();

    assert_eq!(search::rebuild_search_index(store.conn()).unwrap(), 2);
    search::optimize_search_index(store.conn()).unwrap();

    assert_eq!(search::search_words(store.conn(), "consider", 10).unwrap(), vec![1]);
    assert_eq!(search::search_words(store.conn(), "おもいや", 10).unwrap(), vec![1]);
    let found = store.search("dog", 5).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].surface.as_deref(), Some("犬"));
    // Rebuilding does not duplicate rows.
    assert_eq!(search::rebuild_search_index(store.conn()).unwrap(), 2);
    assert_eq!(store.count("word_search").unwrap(), 2);
}

#[test]
fn truncate_and_stats() {
    let mut store = store();
    writer::insert_word(store.conn(), &word("犬", "いぬ", "dog")).unwrap();
    let stats = store.stats().unwrap();
    let words = stats.tables.iter().find(|(t, _)| t == "words").unwrap();
    assert_eq!(words.1, 1);

    store.truncate(&["senses", "words"]).unwrap();
    assert_eq!(store.count("words").unwrap(), 0);
    assert!(store.stats().unwrap().imports.is_empty());
}

#[test]
fn import_log_round_trip() {
    let store = store();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edict2");
    std::fs::write(&path, "犬 [いぬ] /(n) dog/\n").unwrap();

    let record = ImportRecord {
        source: "edict".into(),
        path: path.display().to_string(),
        checksum: import_log::file_checksum(&path).unwrap(),
        processed: 1,
        valid: 1,
        inserted: 1,
        skipped: 0,
        errored: 0,
        imported_at: import_log::now_rfc3339(),
    };
    assert_eq!(record.checksum, crc32fast::hash("犬 [いぬ] /(n) dog/\n".as_bytes()));
    import_log::record_import(store.conn(), &record).unwrap();
    import_log::record_import(store.conn(), &record).unwrap();
    assert_eq!(import_log::read_imports(store.conn()).unwrap(), vec![record]);
}
