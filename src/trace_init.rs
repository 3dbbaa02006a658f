use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "jisho_engine=info,jisho_core=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Human-readable logs on stderr. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(env_filter())
        .try_init();
}

#[cfg(feature = "trace")]
mod file_trace {
    use std::path::Path;
    use std::sync::Once;

    static INIT: Once = Once::new();

    /// JSON-lines trace of every span and event, written to
    /// `<log_dir>/jisho-trace.jsonl`.
    pub fn init_file_tracing(log_dir: &Path) {
        INIT.call_once(|| {
            let file_appender = tracing_appender::rolling::never(log_dir, "jisho-trace.jsonl");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            std::mem::forget(guard); // flushed at process exit

            let _ = tracing_subscriber::fmt()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
                .with_env_filter(super::env_filter())
                .try_init();
        });
    }
}

#[cfg(feature = "trace")]
pub use file_trace::init_file_tracing;

#[cfg(not(feature = "trace"))]
pub fn init_file_tracing(_log_dir: &std::path::Path) {
    init_tracing();
}
