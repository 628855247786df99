//! Logging and tracing configuration
//!
//! Logs go to stderr so the step report on stdout stays readable. A run log
//! with full detail can additionally be written to the data directory.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use super::paths;

/// Name of the run log file inside the log directory
const RUN_LOG_FILE: &str = "run.log";

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("booth_e2e=info,warn"))
}

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_cli() {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing with stderr output plus a run log file
///
/// The file gets every event at DEBUG and above for this crate, including
/// each request's method, path and status. The returned guard must be held
/// until the run finishes so buffered lines are flushed.
pub fn init_with_run_log() -> (Option<PathBuf>, Option<WorkerGuard>) {
    let log_dir = match paths::ensure_log_dir() {
        Ok(Some(dir)) => dir,
        Ok(None) => {
            init_cli();
            return (None, None);
        }
        Err(e) => {
            eprintln!("Warning: Could not create log directory: {}", e);
            init_cli();
            return (None, None);
        }
    };

    let appender = tracing_appender::rolling::never(&log_dir, RUN_LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(EnvFilter::new("booth_e2e=debug,warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(default_filter());

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();

    (Some(log_dir.join(RUN_LOG_FILE)), Some(guard))
}
