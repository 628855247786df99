//! Error types for the booth API test runner
//!
//! Messages carry the literal values involved so a failed run can be
//! diagnosed from the report alone.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the test runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Missing configuration: {}. Set them in the environment or in {config_hint}", missing.join(", "))]
    MissingConfig {
        missing: Vec<String>,
        config_hint: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    // === Authentication Errors ===
    #[error("Login failed: Status {status}, Response: {body}")]
    Authentication { status: u16, body: String },

    #[error("No session cookie. Login must succeed before authenticated requests")]
    SessionMissing,

    // === Transport Errors ===
    #[error("HTTP request {method} {path} failed: {source}")]
    Http {
        method: String,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // === Step Errors ===
    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Group '{group}' timed out after {budget:?}")]
    GroupTimeout { group: String, budget: Duration },

    #[error("{failed} of {total} steps failed")]
    StepsFailed { failed: usize, total: usize },

    #[error("Unknown scenario group '{0}'. Use 'booth-e2e list' to see available groups")]
    UnknownGroup(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scenario file: {0}")]
    ScenarioParse(String),
}

impl Error {
    /// Create an assertion error from anything printable
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    /// Create a transport error for a specific request
    pub fn http(method: &str, path: &str, source: reqwest::Error) -> Self {
        Self::Http {
            method: method.to_string(),
            path: path.to_string(),
            source,
        }
    }

    /// Create a group timeout error
    pub fn group_timeout(group: &str, budget: Duration) -> Self {
        Self::GroupTimeout {
            group: group.to_string(),
            budget,
        }
    }

    /// Whether this error aborts the whole run rather than a single step
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::MissingConfig { .. }
                | Error::Config(_)
                | Error::ConfigParse(_)
                | Error::InvalidBaseUrl { .. }
                | Error::Authentication { .. }
                | Error::SessionMissing
        )
    }
}
