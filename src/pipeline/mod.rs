//! Build pipeline.
//!
//! ```text
//! SchemaApply → LoadWords/Kanji/Furigana → Commit₁ → BuildFormIndex
//!   → LoadExamples+Link → Commit₂ → BuildSearchIndex → Commit₃ → Compact
//! ```
//!
//! Imports run against a staging copy `<store>.building` that replaces the
//! live store only after the last commit. An aborted run leaves the live
//! store as it was, and the next run starts over from `SchemaApply`.

mod report;
mod tally;


use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jisho_core::dedup::{MergeOutcome, WordMerger};
use jisho_core::linker::{FormIndex, LinkPolicy, Linker};
use jisho_core::settings::{parse_settings_toml, Settings};
use jisho_core::source::{
    open_text_source, EdictParser, ExampleParser, FuriganaParser, JsonlParser, KanjidicParser,
    RecordParser, SourceKind, WordExpander,
};
use rusqlite::{Connection, Transaction};
use tracing::{debug_span, info, warn};

pub use report::{Phase, PhaseReport, PhaseStats, PhaseStatus, RunReport};
use tally::Tally;

use crate::error::PipelineError;
use crate::store::batch::load_in_batches;
use crate::store::import_log::{self, ImportRecord};
use crate::store::{schema, search, writer, StoredExample, Store, StoreStats, WordRow};

/// Which sources an import reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Full rebuild from every source.
    All,
    /// Reload the tables fed by one source; everything else is kept.
    Only(SourceKind),
}

impl Selection {
    fn includes(self, kind: SourceKind) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(only) => only == kind,
        }
    }
}

/// `<store>.building`, next to the live store.
pub fn staging_path(live: &Path) -> PathBuf {
    let mut name = live.as_os_str().to_owned();
    name.push(".building");
    PathBuf::from(name)
}

/// What a run reloads, resolved against the files actually present.
struct Plan {
    full: bool,
    present: HashMap<SourceKind, PathBuf>,
    missing: Vec<(SourceKind, PathBuf)>,
}

impl Plan {
    fn new(settings: &Settings, selection: Selection) -> Self {
        let mut present = HashMap::new();
        let mut missing = Vec::new();
        for kind in SourceKind::ALL {
            if !selection.includes(kind) {
                continue;
            }
            let path = settings.source_path(kind);
            if path.is_file() {
                present.insert(kind, path);
            } else {
                missing.push((kind, path));
            }
        }
        Self {
            full: selection == Selection::All,
            present,
            missing,
        }
    }

    fn path(&self, kind: SourceKind) -> Option<&Path> {
        self.present.get(&kind).map(PathBuf::as_path)
    }

    fn has(&self, kind: SourceKind) -> bool {
        self.present.contains_key(&kind)
    }

    /// Why a phase fed by `kinds` has nothing to read.
    fn skip_reason(&self, kinds: &[SourceKind]) -> &'static str {
        if self.missing.iter().any(|(k, _)| kinds.contains(k)) {
            "source file missing"
        } else {
            "not selected"
        }
    }

    fn reload_words(&self) -> bool {
        self.full || self.has(SourceKind::Edict) || self.has(SourceKind::Jmdict)
    }

    fn reload_examples(&self) -> bool {
        self.full || self.has(SourceKind::Examples)
    }

    fn reload_kanji(&self) -> bool {
        self.full || self.has(SourceKind::Kanjidic)
    }

    /// Links depend on both word ids and example ids.
    fn relink(&self) -> bool {
        self.reload_words() || self.reload_examples()
    }

    fn tables_to_clear(&self) -> Vec<&'static str> {
        if self.full {
            return schema::REBUILT_TABLES.to_vec();
        }
        let mut clear = Vec::new();
        if self.reload_words() {
            clear.extend(["word_search", "example_words", "senses", "words"]);
        }
        if self.reload_examples() {
            clear.extend(["example_words", "examples"]);
        }
        if self.reload_kanji() {
            clear.push("kanji");
        }
        schema::REBUILT_TABLES
            .iter()
            .copied()
            .filter(|t| clear.contains(t))
            .collect()
    }
}

fn remove_if_exists(path: &Path) -> Result<(), PipelineError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io(path, e)),
    }
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Start the staging file from the live store, if any, so upserted tables
/// carry over. Leftovers of an aborted run are discarded first.
fn prepare_staging(live: &Path, staging: &Path) -> Result<(), PipelineError> {
    remove_if_exists(staging)?;
    remove_if_exists(&sidecar(staging, "-journal"))?;
    remove_if_exists(&sidecar(staging, "-wal"))?;
    if live.is_file() {
        fs::copy(live, staging).map_err(|e| PipelineError::io(staging, e))?;
    }
    Ok(())
}

fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<usize> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n as usize)
}

fn words_by_source(conn: &Connection) -> rusqlite::Result<HashMap<String, usize>> {
    let mut stmt = conn.prepare("SELECT source, COUNT(*) FROM words GROUP BY source")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
    })?;
    rows.collect()
}

/// Read and validate a settings file.
pub fn load_settings(path: &Path) -> Result<Settings, PipelineError> {
    let content = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(parse_settings_toml(&content)?)
}

pub struct Pipeline {
    settings: Settings,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn live_path(&self) -> &Path {
        &self.settings.store.path
    }

    /// Create any missing tables in the live store.
    pub fn create_schema(&self) -> Result<(), PipelineError> {
        let store = Store::open(self.live_path())?;
        store.apply_schema()?;
        info!(path = %self.live_path().display(), "schema applied");
        store.close()
    }

    /// Empty every table of the live store, furigana included.
    pub fn reset(&self) -> Result<(), PipelineError> {
        let mut store = Store::open(self.live_path())?;
        store.apply_schema()?;
        let mut tables = schema::REBUILT_TABLES.to_vec();
        tables.push("furigana");
        store.truncate(&tables)?;
        if let Err(e) = store.compact() {
            warn!(error = %e, "compaction after reset failed");
        }
        info!(path = %self.live_path().display(), "store reset");
        store.close()
    }

    /// Open the live store for reading. Unlike an import, this never
    /// creates one.
    fn open_existing(&self) -> Result<Store, PipelineError> {
        let live = self.live_path();
        if !live.is_file() {
            return Err(PipelineError::io(
                live,
                io::Error::new(io::ErrorKind::NotFound, "no store at this path"),
            ));
        }
        let store = Store::open(live)?;
        store.apply_schema()?;
        Ok(store)
    }

    pub fn stats(&self) -> Result<StoreStats, PipelineError> {
        Ok(self.open_existing()?.stats()?)
    }

    /// Full-text lookup in the live store.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<WordRow>, PipelineError> {
        Ok(self.open_existing()?.search(query, limit)?)
    }

    /// Run an import. On success the staging store has replaced the live one.
    pub fn import(&self, selection: Selection) -> Result<RunReport, PipelineError> {
        let live = self.live_path();
        let staging = staging_path(live);
        prepare_staging(live, &staging)?;

        let result = self.build(&staging, selection).and_then(|mut report| {
            fs::rename(&staging, live).map_err(|e| PipelineError::io(live, e))?;
            report.store_path = live.to_path_buf();
            info!(path = %live.display(), "store replaced");
            Ok(report)
        });
        if result.is_err() {
            if let Err(cleanup) = remove_if_exists(&staging) {
                warn!(error = %cleanup, "could not remove staging store");
            }
        }
        result
    }

    fn build(&self, staging: &Path, selection: Selection) -> Result<RunReport, PipelineError> {
        let mut store = Store::open(staging)?;
        let mut report = RunReport::new(staging.to_path_buf());
        let plan = Plan::new(&self.settings, selection);

        {
            let _span = debug_span!("schema_apply").entered();
            store.apply_schema()?;
            store.truncate(&plan.tables_to_clear())?;
            report.completed(Phase::SchemaApply, PhaseStats::default());
        }
        for (kind, path) in &plan.missing {
            warn!(
                source = kind.as_str(),
                path = %path.display(),
                "source file missing, skipping its phase"
            );
        }

        // Commit 1: everything keyed by the dictionary sources.
        {
            let mut tx = store.transaction()?;
            self.load_words(&mut tx, &plan, &mut report)?;
            self.load_kanji(&mut tx, &plan, &mut report)?;
            self.load_furigana(&mut tx, &plan, &mut report)?;
            tx.commit()?;
            report.commits += 1;
            info!("dictionary tables committed");
        }

        let index = if plan.relink() {
            let _span = debug_span!("build_form_index").entered();
            let rows = store.word_rows()?;
            let index = FormIndex::from_words(
                rows.iter()
                    .map(|w| (w.id, w.surface.as_deref(), w.reading.as_deref())),
            );
            report.form_index_size = index.len();
            report.completed(
                Phase::BuildFormIndex,
                PhaseStats {
                    processed: rows.len(),
                    valid: rows.len(),
                    inserted: index.len(),
                    skipped: index.collisions(),
                    errored: 0,
                },
            );
            Some(index)
        } else {
            report.skipped(Phase::BuildFormIndex, "no words or examples reloaded");
            None
        };

        // Commit 2: examples and their links. The form index is dropped after.
        {
            let stored = if index.is_some() && !plan.reload_examples() {
                store.examples()?
            } else {
                Vec::new()
            };
            let mut tx = store.transaction()?;
            match &index {
                Some(index) => {
                    let linker = Linker::new(index, LinkPolicy::from(&self.settings.link));
                    if plan.reload_examples() {
                        self.load_examples(&mut tx, &plan, &linker, &mut report)?;
                    } else {
                        self.relink_examples(&mut tx, &stored, &linker, &mut report)?;
                    }
                }
                None => report.skipped(Phase::LoadExamples, "nothing to link"),
            }
            report.links = count_rows(&tx, "example_words")?;
            tx.commit()?;
            report.commits += 1;
            info!(links = report.links, "examples committed");
        }
        drop(index);

        // Commit 3: search index.
        {
            let tx = store.transaction()?;
            if plan.reload_words() {
                let _span = debug_span!("build_search_index").entered();
                let indexed = search::rebuild_search_index(&tx)?;
                search::optimize_search_index(&tx)?;
                report.completed(
                    Phase::BuildSearchIndex,
                    PhaseStats {
                        processed: indexed,
                        valid: indexed,
                        inserted: indexed,
                        ..Default::default()
                    },
                );
            } else {
                report.skipped(Phase::BuildSearchIndex, "words not reloaded");
            }
            tx.commit()?;
            report.commits += 1;
        }

        {
            let _span = debug_span!("compact").entered();
            match store.compact() {
                Ok(()) => report.completed(Phase::Compact, PhaseStats::default()),
                Err(e) => {
                    warn!(error = %e, "compaction failed");
                    report.failed(Phase::Compact, e.to_string());
                }
            }
        }

        store.close()?;
        Ok(report)
    }

    fn open_source(&self, kind: SourceKind, path: &Path) -> Result<Box<dyn io::BufRead>, PipelineError> {
        open_text_source(path, self.settings.source_encoding(kind))
            .map_err(|e| PipelineError::io(path, e))
    }

    fn log_import(
        &self,
        conn: &Connection,
        kind: SourceKind,
        path: &Path,
        stats: PhaseStats,
    ) -> Result<(), PipelineError> {
        let checksum = import_log::file_checksum(path).map_err(|e| PipelineError::io(path, e))?;
        import_log::record_import(
            conn,
            &ImportRecord {
                source: kind.as_str().to_string(),
                path: path.display().to_string(),
                checksum,
                processed: stats.processed,
                valid: stats.valid,
                inserted: stats.inserted,
                skipped: stats.skipped,
                errored: stats.errored,
                imported_at: import_log::now_rfc3339(),
            },
        )?;
        Ok(())
    }

    fn load_words(
        &self,
        tx: &mut Transaction<'_>,
        plan: &Plan,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        let edict = plan.path(SourceKind::Edict);
        let jmdict = plan.path(SourceKind::Jmdict);
        if edict.is_none() && jmdict.is_none() {
            let reason = plan.skip_reason(&[SourceKind::Edict, SourceKind::Jmdict]);
            report.skipped(Phase::LoadWords, reason);
            return Ok(());
        }
        let _span = debug_span!("load_words").entered();

        let mut merger = WordMerger::new();
        let mut merged = 0usize;
        let mut per_source = Vec::new();

        if let Some(path) = edict {
            let parser = EdictParser;
            let reader = self.open_source(SourceKind::Edict, path)?;
            let mut tally = Tally::new(parser.parse_stream(reader), SourceKind::Edict, path);
            for record in &mut tally {
                if merger.insert(record.into_word()) == MergeOutcome::Merged {
                    merged += 1;
                }
            }
            per_source.push((SourceKind::Edict, path, tally.finish()?));
        }

        if let Some(path) = jmdict {
            let parser = JsonlParser;
            let mut expander = WordExpander::new();
            let reader = self.open_source(SourceKind::Jmdict, path)?;
            let mut tally = Tally::new(parser.parse_stream(reader), SourceKind::Jmdict, path);
            for record in &mut tally {
                for word in expander.expand(&record) {
                    if merger.insert(word) == MergeOutcome::Merged {
                        merged += 1;
                    }
                }
            }
            tally.add_skipped(expander.suppressed());
            per_source.push((SourceKind::Jmdict, path, tally.finish()?));
        }

        let entries = merger.into_entries();
        let mut expected: HashMap<&'static str, usize> = HashMap::new();
        for entry in &entries {
            *expected.entry(entry.source.as_str()).or_default() += 1;
        }

        let outcome = load_in_batches(
            tx,
            entries,
            self.settings.store.batch_size,
            "words",
            |conn, word| writer::insert_word(conn, word).map(|_| 1),
        )?;

        let inserted = words_by_source(tx)?;
        let mut phase = PhaseStats::default();
        for (kind, path, mut stats) in per_source {
            let want = expected.get(kind.as_str()).copied().unwrap_or(0);
            stats.inserted = inserted.get(kind.as_str()).copied().unwrap_or(0);
            stats.errored = want.saturating_sub(stats.inserted);
            self.log_import(tx, kind, path, stats)?;
            phase.absorb(stats);
        }

        info!(
            words = outcome.inserted,
            senses = count_rows(tx, "senses")?,
            merged,
            failed_batches = outcome.failed_batches,
            "words loaded"
        );
        report.completed(Phase::LoadWords, phase);
        Ok(())
    }

    fn load_kanji(
        &self,
        tx: &mut Transaction<'_>,
        plan: &Plan,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        let Some(path) = plan.path(SourceKind::Kanjidic) else {
            report.skipped(Phase::LoadKanji, plan.skip_reason(&[SourceKind::Kanjidic]));
            return Ok(());
        };
        let _span = debug_span!("load_kanji").entered();

        let parser = KanjidicParser;
        let reader = self.open_source(SourceKind::Kanjidic, path)?;
        let mut tally = Tally::new(parser.parse_stream(reader), SourceKind::Kanjidic, path);
        let outcome = load_in_batches(
            tx,
            &mut tally,
            self.settings.store.batch_size,
            "kanji",
            writer::upsert_kanji,
        )?;
        let mut stats = tally.finish()?;
        stats.inserted = outcome.inserted;
        stats.errored = outcome.errored;

        self.log_import(tx, SourceKind::Kanjidic, path, stats)?;
        info!(kanji = stats.inserted, skipped = stats.skipped, "kanji loaded");
        report.completed(Phase::LoadKanji, stats);
        Ok(())
    }

    /// Furigana is upserted by `(text, reading)` and never truncated.
    fn load_furigana(
        &self,
        tx: &mut Transaction<'_>,
        plan: &Plan,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        let Some(path) = plan.path(SourceKind::Furigana) else {
            report.skipped(Phase::LoadFurigana, plan.skip_reason(&[SourceKind::Furigana]));
            return Ok(());
        };
        let _span = debug_span!("load_furigana").entered();

        let parser = FuriganaParser;
        let reader = self.open_source(SourceKind::Furigana, path)?;
        let mut tally = Tally::new(parser.parse_stream(reader), SourceKind::Furigana, path);
        let outcome = load_in_batches(
            tx,
            &mut tally,
            self.settings.store.batch_size,
            "furigana",
            writer::upsert_furigana,
        )?;
        let mut stats = tally.finish()?;
        stats.inserted = outcome.inserted;
        stats.errored = outcome.errored;

        self.log_import(tx, SourceKind::Furigana, path, stats)?;
        info!(furigana = stats.inserted, skipped = stats.skipped, "furigana loaded");
        report.completed(Phase::LoadFurigana, stats);
        Ok(())
    }

    fn load_examples(
        &self,
        tx: &mut Transaction<'_>,
        plan: &Plan,
        linker: &Linker<'_>,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        let Some(path) = plan.path(SourceKind::Examples) else {
            report.skipped(Phase::LoadExamples, plan.skip_reason(&[SourceKind::Examples]));
            return Ok(());
        };
        let _span = debug_span!("load_examples").entered();

        let parser = ExampleParser;
        let reader = self.open_source(SourceKind::Examples, path)?;
        let mut tally = Tally::new(parser.parse_stream(reader), SourceKind::Examples, path);
        let mut capped = 0usize;
        let linked = (&mut tally).map(|example| {
            let links = linker.link(&example.sentence, &example.breakdown);
            if links.capped {
                capped += 1;
            }
            (example, links)
        });
        let outcome = load_in_batches(
            tx,
            linked,
            self.settings.store.batch_size,
            "examples",
            |conn, (example, links)| {
                let id = writer::insert_example(conn, example)?;
                writer::insert_links(conn, id, &links.word_ids)?;
                Ok(1)
            },
        )?;
        let mut stats = tally.finish()?;
        stats.inserted = outcome.inserted;
        stats.errored = outcome.errored;

        self.log_import(tx, SourceKind::Examples, path, stats)?;
        info!(
            examples = stats.inserted,
            skipped = stats.skipped,
            capped,
            "examples loaded"
        );
        report.completed(Phase::LoadExamples, stats);
        Ok(())
    }

    /// Re-link examples already in the store after the words changed.
    fn relink_examples(
        &self,
        tx: &mut Transaction<'_>,
        stored: &[StoredExample],
        linker: &Linker<'_>,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        let _span = debug_span!("relink_examples").entered();
        let linked = stored
            .iter()
            .map(|example| (example.id, linker.link(&example.sentence, &example.breakdown)));
        let outcome = load_in_batches(
            tx,
            linked,
            self.settings.store.batch_size,
            "links",
            |conn, (id, links)| writer::insert_links(conn, *id, &links.word_ids).map(|_| 1),
        )?;
        report.completed(
            Phase::LoadExamples,
            PhaseStats {
                processed: stored.len(),
                valid: stored.len(),
                inserted: outcome.inserted,
                skipped: 0,
                errored: outcome.errored,
            },
        );
        Ok(())
    }
}
