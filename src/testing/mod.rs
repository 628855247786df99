//! E2E test harness
//!
//! One authenticated [`StepContext`] is threaded through ordered steps.
//! Steps assert on typed responses, capture fixtures for later steps and
//! undo changes to shared state through [`run_reversible`]. Scenario files
//! in YAML run through the same machinery.

mod config;
mod context;
mod expect;
mod fixtures;
mod report;
mod revert;
mod runner;
mod scenario;

pub use config::*;
pub use context::StepContext;
pub use expect::{ensure, is_empty_value, ResponseExpect};
pub use fixtures::{FixtureKey, FixtureRegistry, MockDataTable};
pub use report::{GroupReport, RunReport, StepOutcome, StepStatus};
pub use revert::{run_reversible, JsonMutation, ReversibleMutation};
pub use runner::{
    run_group, run_groups, run_steps, select_groups, RunOptions, RunnableStep, ScenarioGroup,
    Step, StepFlow, StepFn,
};
pub use scenario::{expand, expand_value, load_scenario, run_scenario};
