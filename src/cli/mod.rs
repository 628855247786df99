//! CLI command handling
//!
//! Dispatches CLI commands to the runner and formats output.

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::paths;
use crate::common::{Error, Result};
use crate::scenarios;
use crate::testing::{self, RunReport, StepStatus};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            groups,
            json,
            config,
        } => {
            let config = Config::load(config.as_deref())?;
            let report = scenarios::run_suite(&config, &groups, !json).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print_summary();
            }
            outcome(&report)
        }

        Commands::List => {
            for group in scenarios::all_groups() {
                println!("{} {}", group.name.cyan().bold(), group.description.dimmed());
                for (i, step) in group.steps.iter().enumerate() {
                    println!("  {:>2}. {}", i + 1, step.name);
                }
            }
            Ok(())
        }

        Commands::Scenario {
            path,
            verbose,
            config,
        } => {
            let config = Config::load(config.as_deref())?;
            let group = testing::run_scenario(&path, &config, verbose).await?;
            let report = RunReport {
                groups: vec![group],
            };
            report.print_summary();
            outcome(&report)
        }

        Commands::Config { config } => {
            let resolved = Config::load(config.as_deref())?;
            match config.or_else(paths::config_path) {
                Some(path) if path.exists() => println!("# {}", path.display()),
                Some(path) => println!("# {} (not found, using defaults)", path.display()),
                None => println!("# no config directory on this platform"),
            }
            print!("{}", resolved.to_redacted_toml()?);

            if let Err(Error::MissingConfig { missing, .. }) = resolved.credentials() {
                println!(
                    "{} missing: {}",
                    "!".yellow().bold(),
                    missing.join(", ").yellow()
                );
            }
            Ok(())
        }
    }
}

fn outcome(report: &RunReport) -> Result<()> {
    let failed = report.count(StepStatus::Failed);
    if failed == 0 {
        Ok(())
    } else {
        Err(Error::StepsFailed {
            failed,
            total: report.total(),
        })
    }
}

