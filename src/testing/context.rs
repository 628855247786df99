//! Per-run state handed to every step
//!
//! Steps receive `&mut StepContext` and read or extend the fixtures
//! through it, so every dependency between steps is visible in code.

use std::time::Duration;

use crate::api::{self, ApiClient, ApiRequest, ApiResponse, CurrentUser};
use crate::common::config::{Attachments, Config, Credentials, ENV_API_URL, ENV_PASSWORD};
use crate::common::paths::config_hint;
use crate::common::{Error, Result};

use super::fixtures::{FixtureKey, FixtureRegistry, MockDataTable};

/// Session, identity and fixtures shared by the steps of a run
pub struct StepContext {
    pub api: ApiClient,
    pub user: CurrentUser,
    pub credentials: Option<Credentials>,
    pub fixtures: FixtureRegistry,
    pub mock: MockDataTable,
    pub attachments: Attachments,
}

impl StepContext {
    /// Validate configuration, then log in
    ///
    /// Missing settings fail before any request is made.
    pub async fn bootstrap(config: &Config) -> Result<Self> {
        let credentials = config.credentials()?;
        let mut api = ApiClient::new(
            &credentials.base_url,
            Duration::from_secs(config.timeouts.request_secs),
        )?;
        let user = api::login(&mut api, &credentials).await?;

        Ok(Self {
            api,
            user,
            credentials: Some(credentials),
            fixtures: FixtureRegistry::new(),
            mock: config.mock.clone(),
            attachments: config.attachments.clone(),
        })
    }

    /// Context without a session, for scenarios that only hit public endpoints
    pub fn anonymous(config: &Config) -> Result<Self> {
        let base_url = config
            .api
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::MissingConfig {
                missing: vec![ENV_API_URL.to_string()],
                config_hint: config_hint(),
            })?;
        let api = ApiClient::new(base_url, Duration::from_secs(config.timeouts.request_secs))?;

        Ok(Self {
            api,
            user: CurrentUser::default(),
            credentials: None,
            fixtures: FixtureRegistry::new(),
            mock: config.mock.clone(),
            attachments: config.attachments.clone(),
        })
    }

    /// Send a request through the session client
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.api.send(request).await
    }

    /// Account identifier of the logged-in user
    ///
    /// Only an anonymous context falls back to the mock account.
    pub fn account_id(&self) -> &str {
        if self.is_anonymous() {
            &self.mock.account_id
        } else {
            &self.user.user_account_identity
        }
    }

    /// User identifier of the logged-in user
    pub fn user_id(&self) -> &str {
        if self.is_anonymous() {
            &self.mock.user_id
        } else {
            &self.user.user_identity
        }
    }

    fn is_anonymous(&self) -> bool {
        self.credentials.is_none()
    }

    /// Password used at login, needed to restore it after a change
    pub fn password(&self) -> Result<&str> {
        self.credentials
            .as_ref()
            .map(|c| c.password.as_str())
            .ok_or_else(|| Error::MissingConfig {
                missing: vec![ENV_PASSWORD.to_string()],
                config_hint: config_hint(),
            })
    }

    /// Email used at login
    pub fn email(&self) -> &str {
        self.credentials
            .as_ref()
            .map(|c| c.email.as_str())
            .unwrap_or(&self.user.email)
    }

    /// First booth of the account
    pub fn booth_id(&self) -> String {
        self.fixtures
            .resolve(&FixtureKey::BoothIds, "/0", &self.mock.booth_id)
    }

    /// First visitor of the account
    pub fn visitor_id(&self) -> String {
        self.fixtures
            .resolve(&FixtureKey::AccountVisitors, "/0/key", &self.mock.visitor_id)
    }

    pub fn template_id(&self) -> String {
        self.fixtures
            .id_or(&FixtureKey::CreatedTemplate, &self.mock.template_id)
    }

    pub fn jackpot_id(&self) -> String {
        self.fixtures
            .id_or(&FixtureKey::CreatedJackpot, &self.mock.jackpot_id)
    }

    pub fn poll_id(&self) -> String {
        self.fixtures
            .id_or(&FixtureKey::CreatedPoll, &self.mock.poll_id)
    }

    pub fn event_id(&self) -> String {
        self.fixtures
            .id_or(&FixtureKey::CreatedEvent, &self.mock.event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn anonymous() -> StepContext {
        let mut config = Config::default();
        config.api.base_url = Some("http://127.0.0.1:9/api".to_string());
        StepContext::anonymous(&config).unwrap()
    }

    #[test]
    fn test_anonymous_requires_base_url() {
        let err = StepContext::anonymous(&Config::default()).err().unwrap();
        match err {
            Error::MissingConfig { missing, .. } => assert_eq!(missing, vec!["API_URL"]),
            other => panic!("Expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_identity_falls_back_to_mock() {
        let ctx = anonymous();
        assert_eq!(ctx.account_id(), ctx.mock.account_id);
        assert_eq!(ctx.user_id(), ctx.mock.user_id);
        assert!(ctx.password().is_err());
    }

    #[test]
    fn test_logged_in_identity_never_uses_mock() {
        let mut ctx = anonymous();
        ctx.credentials = Some(Credentials {
            base_url: "http://127.0.0.1:9/api".to_string(),
            email: "admin@example.com".to_string(),
            password: "secret".to_string(),
        });
        ctx.user.user_account_identity = "acc-1".to_string();

        assert_eq!(ctx.account_id(), "acc-1");
        assert_eq!(ctx.user_id(), "");
        assert_eq!(ctx.password().unwrap(), "secret");
    }

    #[test]
    fn test_ids_follow_captured_fixtures() {
        let mut ctx = anonymous();
        assert_eq!(ctx.booth_id(), ctx.mock.booth_id);
        assert_eq!(ctx.template_id(), ctx.mock.template_id);

        ctx.fixtures
            .capture(FixtureKey::BoothIds, json!(["booth-a", "booth-b"]));
        ctx.fixtures
            .capture(FixtureKey::CreatedTemplate, json!("tpl-1"));
        ctx.fixtures
            .capture(FixtureKey::AccountVisitors, json!([{"key": "vis-1"}]));

        assert_eq!(ctx.booth_id(), "booth-a");
        assert_eq!(ctx.template_id(), "tpl-1");
        assert_eq!(ctx.visitor_id(), "vis-1");
    }
}
