//! Configuration file handling
//!
//! Settings come from `config.toml` and are overridden by the `API_URL`,
//! `EMAIL` and `PASSWORD` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::paths::{config_hint, config_path};
use super::{Error, Result};
use crate::testing::MockDataTable;

/// Environment variable holding the API base address
pub const ENV_API_URL: &str = "API_URL";
/// Environment variable holding the account email
pub const ENV_EMAIL: &str = "EMAIL";
/// Environment variable holding the account password
pub const ENV_PASSWORD: &str = "PASSWORD";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Remote API address and credentials
    #[serde(default)]
    pub api: ApiConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Fallback identifiers for entities that already exist remotely
    #[serde(default)]
    pub mock: MockDataTable,

    /// Files uploaded by multipart steps
    #[serde(default)]
    pub attachments: Attachments,
}

/// Remote API settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ApiConfig {
    /// Base address, e.g. `http://localhost:8080/bihotpoint/services/api`
    pub base_url: Option<String>,
    /// Account email used to log in
    pub email: Option<String>,
    /// Account password used to log in
    pub password: Option<String>,
}

/// Timeout settings in seconds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Timeouts {
    /// Wall-clock ceiling for one scenario group
    #[serde(default = "default_group")]
    pub group_secs: u64,

    /// Timeout for a single HTTP request
    #[serde(default = "default_request")]
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            group_secs: default_group(),
            request_secs: default_request(),
        }
    }
}

fn default_group() -> u64 {
    60
}
fn default_request() -> u64 {
    10
}

/// Optional upload payloads
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Attachments {
    /// Image uploaded as the account logo (a built-in PNG is used when unset)
    pub logo_image: Option<PathBuf>,
    /// Video required to create a jackpot; jackpot creation is skipped when unset
    pub jackpot_video: Option<PathBuf>,
}

/// Validated login settings
#[derive(Debug, Clone)]
pub struct Credentials {
    pub base_url: String,
    pub email: String,
    pub password: String,
}

impl Config {
    /// Load configuration from `path` or the default config file, then
    /// apply environment overrides
    ///
    /// A missing default file yields the default configuration; an
    /// explicitly requested file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Override API settings from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api.base_url = Some(url);
        }
        if let Some(email) = lookup(ENV_EMAIL) {
            self.api.email = Some(email);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.api.password = Some(password);
        }
    }

    /// Validate that every login setting is present
    ///
    /// Empty values count as missing. The error names every missing key so
    /// the run can be fixed in one go.
    pub fn credentials(&self) -> Result<Credentials> {
        fn present(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        let base_url = present(&self.api.base_url);
        let email = present(&self.api.email);
        let password = present(&self.api.password);

        let mut missing = Vec::new();
        if base_url.is_none() {
            missing.push(ENV_API_URL.to_string());
        }
        if email.is_none() {
            missing.push(ENV_EMAIL.to_string());
        }
        if password.is_none() {
            missing.push(ENV_PASSWORD.to_string());
        }

        match (base_url, email, password) {
            (Some(base_url), Some(email), Some(password)) => Ok(Credentials {
                base_url,
                email,
                password,
            }),
            _ => Err(Error::MissingConfig {
                missing,
                config_hint: config_hint(),
            }),
        }
    }

    /// Render the resolved configuration with the password masked
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.api.password.is_some() {
            shown.api.password = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_everything_names_all_keys() {
        let config = Config::default();
        match config.credentials() {
            Err(Error::MissingConfig { missing, .. }) => {
                assert_eq!(missing, vec!["API_URL", "EMAIL", "PASSWORD"]);
            }
            other => panic!("Expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("API_URL", "http://localhost:8080/api"),
            ("EMAIL", "  "),
            ("PASSWORD", "secret"),
        ]));
        match config.credentials() {
            Err(Error::MissingConfig { missing, .. }) => assert_eq!(missing, vec!["EMAIL"]),
            other => panic!("Expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config: Config = toml::from_str(
            r#"
            [api]
            base_url = "http://file/api"
            email = "file@example.com"
            password = "from-file"
            "#,
        )
        .unwrap();
        config.apply_env(env(&[("EMAIL", "env@example.com")]));

        let creds = config.credentials().unwrap();
        assert_eq!(creds.base_url, "http://file/api");
        assert_eq!(creds.email, "env@example.com");
        assert_eq!(creds.password, "from-file");
    }

    #[test]
    fn test_defaults_and_mock_overrides() {
        let config: Config = toml::from_str(
            r#"
            [timeouts]
            group_secs = 15

            [mock]
            booth_id = "override-booth"
            "#,
        )
        .unwrap();
        assert_eq!(config.timeouts.group_secs, 15);
        assert_eq!(config.timeouts.request_secs, 10);
        assert_eq!(config.mock.booth_id, "override-booth");
        assert_eq!(config.mock.jackpot_id, MockDataTable::default().jackpot_id);
    }

    #[test]
    fn test_redacted_output_hides_password() {
        let mut config = Config::default();
        config.api.password = Some("hunter2".to_string());
        let shown = config.to_redacted_toml().unwrap();
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("********"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/booth-e2e.toml"))).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
