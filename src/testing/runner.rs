//! Group runner
//!
//! Steps run strictly one after another against the shared
//! [`StepContext`]. A failed step is recorded and the group moves on; a
//! group that exceeds its wall-clock budget fails the running step and
//! every step after it.

use colored::Colorize;
use futures_util::future::BoxFuture;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::common::{Error, Result};

use super::context::StepContext;
use super::report::{GroupReport, RunReport, StepOutcome};

/// How a step that did not fail ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepFlow {
    Passed,
    /// The step's precondition does not hold in this environment
    Skipped(String),
}

/// Signature of a step body
pub type StepFn = for<'a> fn(&'a mut StepContext) -> BoxFuture<'a, Result<StepFlow>>;

/// Anything the runner can execute as a step
pub trait RunnableStep {
    /// Label shown in the report
    fn label(&self) -> String;
    /// Execute against the shared context
    fn execute<'a>(&'a self, ctx: &'a mut StepContext) -> BoxFuture<'a, Result<StepFlow>>;
}

/// One HTTP-call-and-assert unit
pub struct Step {
    pub name: &'static str,
    pub run: StepFn,
}

impl Step {
    pub fn new(name: &'static str, run: StepFn) -> Self {
        Self { name, run }
    }
}

impl RunnableStep for Step {
    fn label(&self) -> String {
        self.name.to_string()
    }

    fn execute<'a>(&'a self, ctx: &'a mut StepContext) -> BoxFuture<'a, Result<StepFlow>> {
        (self.run)(ctx)
    }
}

/// Ordered steps for one resource family
///
/// Order is significant: producers come before their consumers.
pub struct ScenarioGroup {
    pub name: &'static str,
    pub description: &'static str,
    pub steps: Vec<Step>,
}

/// Runner settings
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Wall-clock ceiling per group
    pub group_timeout: Duration,
    /// Print progress lines while running
    pub print: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            group_timeout: Duration::from_secs(60),
            print: true,
        }
    }
}

/// Run one group to completion or until its budget is spent
pub async fn run_group(
    ctx: &mut StepContext,
    group: &ScenarioGroup,
    options: &RunOptions,
) -> GroupReport {
    run_steps(ctx, group.name, group.description, &group.steps, options).await
}

/// Run `steps` in order under one wall-clock budget
pub async fn run_steps<S: RunnableStep>(
    ctx: &mut StepContext,
    name: &str,
    description: &str,
    steps: &[S],
    options: &RunOptions,
) -> GroupReport {
    if options.print {
        println!("\n{} {}", "Group:".cyan(), name.white().bold());
        if !description.is_empty() {
            println!("  {}", description.dimmed());
        }
    }

    let deadline = Instant::now() + options.group_timeout;
    let mut outcomes = Vec::with_capacity(steps.len());
    let mut pending = steps.iter().enumerate();

    while let Some((i, step)) = pending.next() {
        let label = step.label();
        let started = Instant::now();
        let remaining = deadline.saturating_duration_since(started);
        debug!(group = name, step = %label, "running step");

        let result = if remaining.is_zero() {
            Err(timeout_error(name, options))
        } else {
            match tokio::time::timeout(remaining, step.execute(ctx)).await {
                Ok(result) => result,
                Err(_) => Err(timeout_error(name, options)),
            }
        };

        let elapsed = started.elapsed();
        let timed_out = matches!(result, Err(Error::GroupTimeout { .. }));

        let outcome = match result {
            Ok(StepFlow::Passed) => StepOutcome::passed(&label, elapsed),
            Ok(StepFlow::Skipped(reason)) => StepOutcome::skipped(&label, reason, elapsed),
            Err(e) => {
                warn!(group = name, step = %label, "step failed: {}", e);
                StepOutcome::failed(&label, &e, elapsed)
            }
        };
        if options.print {
            outcome.print(i + 1);
        }
        outcomes.push(outcome);

        if timed_out {
            let err = timeout_error(name, options);
            for (j, rest) in pending.by_ref() {
                let outcome = StepOutcome::failed(&rest.label(), &err, Duration::ZERO);
                if options.print {
                    outcome.print(j + 1);
                }
                outcomes.push(outcome);
            }
        }
    }

    GroupReport {
        name: name.to_string(),
        steps: outcomes,
    }
}

fn timeout_error(group: &str, options: &RunOptions) -> Error {
    Error::group_timeout(group, options.group_timeout)
}

/// Run groups in the given order
pub async fn run_groups(
    ctx: &mut StepContext,
    groups: &[ScenarioGroup],
    options: &RunOptions,
) -> RunReport {
    let mut report = RunReport::default();
    for group in groups {
        report.groups.push(run_group(ctx, group, options).await);
    }
    report
}

/// Keep only the named groups, preserving declared order
///
/// Unknown names are an error so a typo does not silently run nothing.
pub fn select_groups(groups: Vec<ScenarioGroup>, names: &[String]) -> Result<Vec<ScenarioGroup>> {
    if names.is_empty() {
        return Ok(groups);
    }
    if let Some(unknown) = names
        .iter()
        .find(|name| !groups.iter().any(|g| g.name == name.as_str()))
    {
        return Err(Error::UnknownGroup(unknown.clone()));
    }
    Ok(groups
        .into_iter()
        .filter(|g| names.iter().any(|n| n == g.name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::Config;
    use crate::testing::fixtures::FixtureKey;
    use crate::testing::report::StepStatus;
    use serde_json::json;

    fn ctx() -> StepContext {
        let mut config = Config::default();
        config.api.base_url = Some("http://127.0.0.1:9".to_string());
        StepContext::anonymous(&config).unwrap()
    }

    fn produce(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
        Box::pin(async move {
            ctx.fixtures.capture(FixtureKey::CreatedPoll, json!("poll-1"));
            Ok(StepFlow::Passed)
        })
    }

    fn consume(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
        Box::pin(async move {
            if ctx.poll_id() == "poll-1" {
                Ok(StepFlow::Passed)
            } else {
                Err(Error::assertion(format!("unexpected poll {}", ctx.poll_id())))
            }
        })
    }

    fn fail(_ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
        Box::pin(async move { Err(Error::assertion("expected status 200, got 500")) })
    }

    fn skip(_ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
        Box::pin(async move { Ok(StepFlow::Skipped("no pending users".to_string())) })
    }

    fn slow(_ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(StepFlow::Passed)
        })
    }

    fn quiet(timeout: Duration) -> RunOptions {
        RunOptions {
            group_timeout: timeout,
            print: false,
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_the_group() {
        let group = ScenarioGroup {
            name: "mixed",
            description: "",
            steps: vec![
                Step::new("fails", fail),
                Step::new("skips", skip),
                Step::new("produces", produce),
                Step::new("consumes", consume),
            ],
        };
        let report = run_group(&mut ctx(), &group, &quiet(Duration::from_secs(5))).await;
        let statuses: Vec<StepStatus> = report.steps.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Failed,
                StepStatus::Skipped,
                StepStatus::Passed,
                StepStatus::Passed
            ]
        );
    }

    #[tokio::test]
    async fn test_consumer_without_producer_uses_fallback() {
        let group = ScenarioGroup {
            name: "orphan",
            description: "",
            steps: vec![Step::new("consumes", consume)],
        };
        let report = run_group(&mut ctx(), &group, &quiet(Duration::from_secs(5))).await;
        assert_eq!(report.steps[0].status, StepStatus::Failed);
        assert!(report.steps[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("5b1e2f3a0cf2e5bdafa4f001"));
    }

    #[tokio::test]
    async fn test_timeout_fails_running_and_pending_steps() {
        let group = ScenarioGroup {
            name: "slow",
            description: "",
            steps: vec![
                Step::new("quick", produce),
                Step::new("slow", slow),
                Step::new("never reached", produce),
            ],
        };
        let report = run_group(&mut ctx(), &group, &quiet(Duration::from_millis(200))).await;
        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.steps[0].status, StepStatus::Passed);
        for step in &report.steps[1..] {
            assert_eq!(step.status, StepStatus::Failed);
            assert!(step
                .detail
                .as_deref()
                .unwrap()
                .contains("timed out after 200ms"));
        }
    }

    #[test]
    fn test_select_groups_keeps_declared_order() {
        let groups = vec![
            ScenarioGroup { name: "admin", description: "", steps: vec![] },
            ScenarioGroup { name: "owner", description: "", steps: vec![] },
            ScenarioGroup { name: "public", description: "", steps: vec![] },
        ];
        let picked = select_groups(groups, &["public".to_string(), "admin".to_string()]).unwrap();
        let names: Vec<&str> = picked.iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["admin", "public"]);
    }

    #[test]
    fn test_select_unknown_group_is_an_error() {
        let groups = vec![ScenarioGroup { name: "admin", description: "", steps: vec![] }];
        let err = select_groups(groups, &["admn".to_string()]).err().unwrap();
        assert!(matches!(err, Error::UnknownGroup(name) if name == "admn"));
    }
}
