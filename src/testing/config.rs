//! Scenario file types
//!
//! Defines the data structures for deserializing YAML scenario files.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::api::Shape;

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct TestScenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Log in before the first step (default: true)
    #[serde(default = "default_login")]
    pub login: bool,
    /// Run the fixture seeding calls after login
    #[serde(default)]
    pub seed: bool,
    /// The sequence of steps to execute
    pub steps: Vec<TestStep>,
}

fn default_login() -> bool {
    true
}

/// A single step in the execution flow
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Send an HTTP request and check the response
    Request {
        /// Label shown in the report (default: "METHOD path")
        name: Option<String>,
        /// HTTP method, e.g. "GET"
        method: String,
        /// Path relative to the base URL; `${...}` placeholders are expanded
        path: String,
        /// Optional JSON body; placeholders inside strings are expanded
        body: Option<Value>,
        /// Attach the session cookie (default: true)
        #[serde(default = "default_auth")]
        auth: bool,
        /// Expectations for the response
        #[serde(default)]
        expect: ResponseExpectation,
        /// Fixture name → JSON pointer into the response body
        #[serde(default)]
        capture: BTreeMap<String, String>,
    },
    /// Assert that an earlier step captured a fixture
    CheckFixture {
        /// Fixture name
        name: String,
        /// Expected string value
        equals: Option<String>,
    },
}

fn default_auth() -> bool {
    true
}

/// Expectations for a response
#[derive(Deserialize, Debug, Default)]
pub struct ResponseExpectation {
    /// Allowed status codes (default: any)
    #[serde(default)]
    pub status: Vec<u16>,
    /// Expected body shape
    pub shape: Option<Shape>,
    /// Expected `result` tag of a result envelope, e.g. "success"
    pub result: Option<String>,
    /// JSON pointer → expected value
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    /// JSON pointers that must be present and non-empty
    #[serde(default)]
    pub non_empty: Vec<String>,
}
