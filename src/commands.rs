//! CLI command definitions
//!
//! Defines the clap commands for the booth-e2e CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and run the built-in scenario groups
    Run {
        /// Run only this group; can be given multiple times: --group admin --group owner
        #[arg(long = "group", short = 'g')]
        groups: Vec<String>,

        /// Print the report as JSON instead of progress lines
        #[arg(long)]
        json: bool,

        /// Configuration file (default: platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List scenario groups and their steps
    List,

    /// Execute a scenario defined in a YAML file
    Scenario {
        /// Path to the YAML scenario file
        path: PathBuf,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,

        /// Configuration file (default: platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the resolved configuration with the password hidden
    Config {
        /// Configuration file (default: platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    /// Whether the command talks to the API and should keep a run log
    pub fn writes_run_log(&self) -> bool {
        matches!(self, Commands::Run { .. } | Commands::Scenario { .. })
    }
}
