//! Fixture registry and fallback identifiers
//!
//! Producer steps capture values from responses; consumer steps resolve
//! them through [`FixtureRegistry::resolve`], which is the only place the
//! fall-back-to-mock policy is applied.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Logical name of a captured value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FixtureKey {
    /// `boothsIds` from the owner account (array of strings)
    BoothIds,
    /// Visitor records of the account (array of objects)
    AccountVisitors,
    /// Account name before any rename
    AccountName,
    /// User object returned by the dummy user endpoint
    DummyUser,
    /// Key of the booth created by the admin group
    CreatedBooth,
    /// Booth objects listed for the account
    Booths,
    RecentVideos,
    CreatedTemplate,
    CreatedJackpot,
    CreatedPoll,
    CreatedEvent,
    /// Names captured by scenario files
    Custom(String),
}

impl FixtureKey {
    /// Parse a fixture name as written in scenario files
    pub fn parse(name: &str) -> Self {
        match name {
            "booth_ids" => FixtureKey::BoothIds,
            "account_visitors" => FixtureKey::AccountVisitors,
            "account_name" => FixtureKey::AccountName,
            "dummy_user" => FixtureKey::DummyUser,
            "created_booth" => FixtureKey::CreatedBooth,
            "booths" => FixtureKey::Booths,
            "recent_videos" => FixtureKey::RecentVideos,
            "created_template" => FixtureKey::CreatedTemplate,
            "created_jackpot" => FixtureKey::CreatedJackpot,
            "created_poll" => FixtureKey::CreatedPoll,
            "created_event" => FixtureKey::CreatedEvent,
            other => FixtureKey::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for FixtureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FixtureKey::BoothIds => "booth_ids",
            FixtureKey::AccountVisitors => "account_visitors",
            FixtureKey::AccountName => "account_name",
            FixtureKey::DummyUser => "dummy_user",
            FixtureKey::CreatedBooth => "created_booth",
            FixtureKey::Booths => "booths",
            FixtureKey::RecentVideos => "recent_videos",
            FixtureKey::CreatedTemplate => "created_template",
            FixtureKey::CreatedJackpot => "created_jackpot",
            FixtureKey::CreatedPoll => "created_poll",
            FixtureKey::CreatedEvent => "created_event",
            FixtureKey::Custom(name) => name,
        };
        write!(f, "{}", name)
    }
}

/// Values captured from earlier responses
#[derive(Debug, Default)]
pub struct FixtureRegistry {
    values: HashMap<FixtureKey, Value>,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value; a later capture under the same key replaces it
    pub fn capture(&mut self, key: FixtureKey, value: Value) {
        debug!(fixture = %key, "captured fixture");
        if let Some(previous) = self.values.insert(key.clone(), value) {
            debug!(fixture = %key, previous = %previous, "replaced earlier capture");
        }
    }

    pub fn get(&self, key: &FixtureKey) -> Option<&Value> {
        self.values.get(key)
    }

    /// Non-empty string stored under `key` at `pointer` ("" for the value itself)
    pub fn lookup(&self, key: &FixtureKey, pointer: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.pointer(pointer))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Resolve an identifier, falling back to a static one when the
    /// producing step did not run or did not capture anything usable
    pub fn resolve(&self, key: &FixtureKey, pointer: &str, fallback: &str) -> String {
        match self.lookup(key, pointer) {
            Some(value) => value.to_string(),
            None => {
                debug!(fixture = %key, pointer, fallback, "fixture missing, using fallback");
                fallback.to_string()
            }
        }
    }

    /// [`resolve`](Self::resolve) for fixtures stored as plain strings
    pub fn id_or(&self, key: &FixtureKey, fallback: &str) -> String {
        self.resolve(key, "", fallback)
    }

    /// Forget a fixture whose entity was deleted
    pub fn remove(&mut self, key: &FixtureKey) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &FixtureKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Identifiers of entities that already exist in the remote test dataset
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockDataTable {
    pub booth_id: String,
    pub visitor_id: String,
    pub action_id: String,
    pub template_id: String,
    pub account_id: String,
    pub user_id: String,
    pub video_id: String,
    pub jackpot_id: String,
    pub face_id: String,
    pub face_identity_id: String,
    pub poll_id: String,
    pub event_id: String,
}

impl Default for MockDataTable {
    fn default() -> Self {
        Self {
            booth_id: "566116a10cf2e5bdafa4d82a".to_string(),
            visitor_id: "56ccea960cf27eecefa065ac".to_string(),
            action_id: "5663d7590cf2e5bdafa4e33d".to_string(),
            template_id: "566116a10cf2e5bdafa4d829".to_string(),
            account_id: "55792c0d0cf206bed0ceafe4".to_string(),
            user_id: "55792bec0cf206bed0ceafe2".to_string(),
            video_id: "5acd816448e376945ae9e551".to_string(),
            jackpot_id: "5756e48f0cf26e03bb58d922".to_string(),
            face_id: "1234567890".to_string(),
            face_identity_id: "1234567890".to_string(),
            poll_id: "5b1e2f3a0cf2e5bdafa4f001".to_string(),
            event_id: "5b1e2f3a0cf2e5bdafa4f002".to_string(),
        }
    }
}
