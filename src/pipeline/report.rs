use std::fmt;
use std::path::PathBuf;

/// Steps of a run, in execution order. Commits sit between the load phases
/// and are counted in [`RunReport::commits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    SchemaApply,
    LoadWords,
    LoadKanji,
    LoadFurigana,
    BuildFormIndex,
    LoadExamples,
    BuildSearchIndex,
    Compact,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::SchemaApply => "schema",
            Phase::LoadWords => "words",
            Phase::LoadKanji => "kanji",
            Phase::LoadFurigana => "furigana",
            Phase::BuildFormIndex => "form-index",
            Phase::LoadExamples => "examples",
            Phase::BuildSearchIndex => "search-index",
            Phase::Compact => "compact",
        }
    }
}

/// Record counters for one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseStats {
    /// Records read from the source, malformed ones included.
    pub processed: usize,
    /// Records that parsed.
    pub valid: usize,
    /// Rows written by committed batches.
    pub inserted: usize,
    /// Malformed or suppressed records.
    pub skipped: usize,
    /// Records lost to rolled-back batches.
    pub errored: usize,
}

impl PhaseStats {
    pub fn absorb(&mut self, other: PhaseStats) {
        self.processed += other.processed;
        self.valid += other.valid;
        self.inserted += other.inserted;
        self.skipped += other.skipped;
        self.errored += other.errored;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseStatus {
    Completed,
    /// Not run; the reason is user-facing.
    Skipped(String),
    /// Failed without failing the run (only `Compact` can).
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub stats: PhaseStats,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub store_path: PathBuf,
    pub phases: Vec<PhaseReport>,
    pub commits: usize,
    pub form_index_size: usize,
    pub links: usize,
}

impl RunReport {
    pub fn new(store_path: PathBuf) -> Self {
        Self {
            store_path,
            ..Default::default()
        }
    }

    pub fn completed(&mut self, phase: Phase, stats: PhaseStats) {
        self.phases.push(PhaseReport {
            phase,
            status: PhaseStatus::Completed,
            stats,
        });
    }

    pub fn skipped(&mut self, phase: Phase, reason: impl Into<String>) {
        self.phases.push(PhaseReport {
            phase,
            status: PhaseStatus::Skipped(reason.into()),
            stats: PhaseStats::default(),
        });
    }

    pub fn failed(&mut self, phase: Phase, reason: impl Into<String>) {
        self.phases.push(PhaseReport {
            phase,
            status: PhaseStatus::Failed(reason.into()),
            stats: PhaseStats::default(),
        });
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Sum over every phase.
    pub fn totals(&self) -> PhaseStats {
        let mut total = PhaseStats::default();
        for p in &self.phases {
            total.absorb(p.stats);
        }
        total
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "store: {}", self.store_path.display())?;
        writeln!(
            f,
            "{:<13} {:>9} {:>9} {:>9} {:>9} {:>9}  status",
            "phase", "processed", "valid", "inserted", "skipped", "errored"
        )?;
        for p in &self.phases {
            let status = match &p.status {
                PhaseStatus::Completed => "ok".to_string(),
                PhaseStatus::Skipped(reason) => format!("skipped: {reason}"),
                PhaseStatus::Failed(reason) => format!("failed: {reason}"),
            };
            writeln!(
                f,
                "{:<13} {:>9} {:>9} {:>9} {:>9} {:>9}  {}",
                p.phase.as_str(),
                p.stats.processed,
                p.stats.valid,
                p.stats.inserted,
                p.stats.skipped,
                p.stats.errored,
                status
            )?;
        }
        write!(
            f,
            "commits: {}  forms: {}  links: {}",
            self.commits, self.form_index_size, self.links
        )
    }
}
