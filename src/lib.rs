//! booth-e2e - End-to-end test harness for the booth API
//!
//! This library provides the session-carrying HTTP client, the fixture
//! context and the ordered scenario runner used by the `booth-e2e` binary.

pub mod api;
pub mod cli;
pub mod commands;
pub mod common;
pub mod scenarios;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
