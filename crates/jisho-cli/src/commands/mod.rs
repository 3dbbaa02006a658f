//! Subcommand bodies for `jishotool`. Each prints to stdout/stderr and exits
//! with status 1 on a fatal error.

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            std::process::exit(1);
        })
    };
}

pub mod annotate_ops;
pub mod config_ops;
pub mod import_ops;
pub mod store_ops;

use std::path::PathBuf;

use jisho_core::settings::Settings;

/// Global options shared by every store-facing subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub sources: Option<PathBuf>,
}

/// Resolve settings: embedded defaults or `--config`, then the path
/// overrides.
pub fn load_settings(opts: &GlobalOptions) -> Settings {
    let mut settings = match &opts.config {
        Some(path) => die!(jisho_engine::load_settings(path), "Error: {}"),
        None => Settings::default(),
    };
    if let Some(output) = &opts.output {
        settings.store.path = output.clone();
    }
    if let Some(dir) = &opts.sources {
        settings.sources.dir = dir.clone();
    }
    settings
}
