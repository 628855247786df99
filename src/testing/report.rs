//! Run report
//!
//! One line per step while the run progresses, a summary at the end, or
//! the whole report as JSON.

use colored::Colorize;
use serde::Serialize;
use std::time::Duration;

use crate::common::Error;

/// Final state of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

/// Outcome of one step
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub name: String,
    pub status: StepStatus,
    /// Failure message or skip reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub elapsed_ms: u64,
}

impl StepOutcome {
    pub fn passed(name: &str, elapsed: Duration) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Passed,
            detail: None,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn skipped(name: &str, reason: String, elapsed: Duration) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Skipped,
            detail: Some(reason),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn failed(name: &str, error: &Error, elapsed: Duration) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Failed,
            detail: Some(error.to_string()),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Print the progress line for this step
    pub fn print(&self, step_num: usize) {
        match self.status {
            StepStatus::Passed => println!(
                "  {} Step {}: {} {}",
                "✓".green(),
                step_num,
                self.name,
                format!("({}ms)", self.elapsed_ms).dimmed()
            ),
            StepStatus::Skipped => println!(
                "  {} Step {}: {} {}",
                "-".yellow(),
                step_num,
                self.name.dimmed(),
                format!("(skipped: {})", self.detail.as_deref().unwrap_or("")).yellow()
            ),
            StepStatus::Failed => {
                println!("  {} Step {}: {}", "✗".red(), step_num, self.name);
                if let Some(detail) = &self.detail {
                    println!("      {}", detail.red());
                }
            }
        }
    }
}

/// Outcomes of one scenario group
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub steps: Vec<StepOutcome>,
}

impl GroupReport {
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    pub fn passed(&self) -> bool {
        self.count(StepStatus::Failed) == 0
    }
}

/// Outcomes of a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    pub fn count(&self, status: StepStatus) -> usize {
        self.groups.iter().map(|g| g.count(status)).sum()
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.steps.len()).sum()
    }

    pub fn passed(&self) -> bool {
        self.groups.iter().all(GroupReport::passed)
    }

    /// Print the end-of-run summary
    pub fn print_summary(&self) {
        let passed = self.count(StepStatus::Passed);
        let failed = self.count(StepStatus::Failed);
        let skipped = self.count(StepStatus::Skipped);

        println!();
        if failed > 0 {
            println!("{}", "Failures:".red().bold());
            for group in &self.groups {
                for step in group.steps.iter().filter(|s| s.status == StepStatus::Failed) {
                    println!(
                        "  {} {} › {}",
                        "✗".red(),
                        group.name.cyan(),
                        step.name
                    );
                }
            }
            println!();
        }

        let line = format!(
            "{} passed, {} failed, {} skipped ({} steps)",
            passed,
            failed,
            skipped,
            self.total()
        );
        if failed == 0 {
            println!("{} {}\n", "✓".green().bold(), line.green().bold());
        } else {
            println!("{} {}\n", "✗".red().bold(), line.red().bold());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, statuses: &[StepStatus]) -> GroupReport {
        GroupReport {
            name: name.to_string(),
            steps: statuses
                .iter()
                .enumerate()
                .map(|(i, status)| StepOutcome {
                    name: format!("step {}", i),
                    status: *status,
                    detail: None,
                    elapsed_ms: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn test_counts_across_groups() {
        let report = RunReport {
            groups: vec![
                group("admin", &[StepStatus::Passed, StepStatus::Failed]),
                group("owner", &[StepStatus::Skipped, StepStatus::Passed]),
            ],
        };
        assert_eq!(report.total(), 4);
        assert_eq!(report.count(StepStatus::Passed), 2);
        assert_eq!(report.count(StepStatus::Failed), 1);
        assert!(!report.passed());
        assert!(report.groups[1].passed());
    }

    #[test]
    fn test_json_report_shape() {
        let report = RunReport {
            groups: vec![group("public", &[StepStatus::Passed])],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["groups"][0]["name"], "public");
        assert_eq!(value["groups"][0]["steps"][0]["status"], "passed");
        assert!(value["groups"][0]["steps"][0].get("detail").is_none());
    }

    #[test]
    fn test_failed_outcome_keeps_message() {
        let outcome = StepOutcome::failed(
            "GET /admin/users",
            &Error::assertion("expected status 200, got 500"),
            Duration::from_millis(12),
        );
        assert_eq!(outcome.status, StepStatus::Failed);
        assert_eq!(outcome.elapsed_ms, 12);
        assert!(outcome.detail.unwrap().contains("got 500"));
    }
}
