//! booth-e2e - End-to-end test runner for the booth API
//!
//! Logs in once, then runs ordered scenario groups against a live server
//! and reports every step.

use booth_e2e::common::logging;
use booth_e2e::{cli, commands};
use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "booth-e2e", about = "End-to-end tests for the booth API")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Guard must outlive the run so the log file is flushed
    let guard = if cli.command.writes_run_log() {
        let (log_path, guard) = logging::init_with_run_log();
        if let Some(path) = log_path {
            tracing::debug!("Run log: {}", path.display());
        }
        guard
    } else {
        logging::init_cli();
        None
    };

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        drop(guard);
        // 2: the run could not start, 1: steps failed
        std::process::exit(if e.is_fatal() { 2 } else { 1 });
    }
}
