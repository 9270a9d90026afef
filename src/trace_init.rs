//! JSON-lines file logging, compiled in with the `trace` feature only.

#[cfg(feature = "trace")]
mod file_log {
    use std::path::Path;
    use std::sync::Once;

    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    const LOG_FILE: &str = "deck-trace.jsonl";
    const DEFAULT_FILTER: &str = "deck_engine=debug,deck_core=debug,deck_session=debug";

    static INIT: Once = Once::new();

    /// Append to `<log_dir>/deck-trace.jsonl`. `RUST_LOG` replaces the
    /// default filter. Only the first call does anything, and a subscriber
    /// the host installed earlier is left in place.
    pub fn init_tracing(log_dir: &Path) {
        INIT.call_once(|| {
            let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
            let (writer, flush_guard) = tracing_appender::non_blocking(appender);
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

            let installed = tracing_subscriber::fmt()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_env_filter(filter)
                .try_init();
            if installed.is_ok() {
                // Dropping the guard stops the writer thread.
                std::mem::forget(flush_guard);
            }
        });
    }
}

#[cfg(feature = "trace")]
pub use file_log::init_tracing;

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &std::path::Path) {}
