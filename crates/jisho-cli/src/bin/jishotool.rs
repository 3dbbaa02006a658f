use std::path::PathBuf;

use clap::{Parser, Subcommand};

use jisho_cli::commands::{annotate_ops, config_ops, import_ops, store_ops, GlobalOptions};

#[derive(Parser)]
#[command(name = "jishotool", about = "Japanese dictionary corpus compiler")]
struct Cli {
    /// Settings TOML (default: embedded settings)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Store path, overriding store.path
    #[arg(long, global = true)]
    output: Option<PathBuf>,
    /// Source directory, overriding sources.dir
    #[arg(long, global = true)]
    sources: Option<PathBuf>,
    /// Also write a JSON-lines trace into this directory
    #[cfg(feature = "trace")]
    #[arg(long, global = true)]
    trace_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the store schema without importing anything
    Schema,
    /// Rebuild the store from every source
    Import,
    /// Reload the tables fed by one source
    ImportSource {
        /// edict, jmdict, kanjidic, examples or furigana
        source: String,
    },
    /// Empty every table of the store
    Reset,
    /// Show row counts and import history
    Stats,
    /// Full-text search over surface, reading and glosses
    Search {
        /// FTS5 query (terms of three or more characters)
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        n: usize,
    },
    /// Parse an annotated breakdown and show its furigana segments
    Annotate {
        /// Breakdown text, e.g. "君(きみ)[01] は 英語 が 好き(すき)"
        text: String,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();

    #[cfg(feature = "trace")]
    match &cli.trace_dir {
        Some(dir) => jisho_engine::trace_init::init_file_tracing(dir),
        None => jisho_engine::trace_init::init_tracing(),
    }
    #[cfg(not(feature = "trace"))]
    jisho_engine::trace_init::init_tracing();

    let opts = GlobalOptions {
        config: cli.config,
        output: cli.output,
        sources: cli.sources,
    };

    match cli.command {
        Command::Schema => store_ops::schema(&opts),
        Command::Import => import_ops::import_all(&opts),
        Command::ImportSource { source } => import_ops::import_source(&opts, &source),
        Command::Reset => store_ops::reset(&opts),
        Command::Stats => store_ops::stats(&opts),
        Command::Search { query, n } => store_ops::search(&opts, &query, n),
        Command::Annotate { text } => annotate_ops::annotate(&text),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
