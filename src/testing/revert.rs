//! Mutations of state the run does not own
//!
//! Changing the account password, email or name must be undone. The
//! mutation is the acquisition and the revert is the release:
//! [`run_reversible`] always performs the revert once the mutation call
//! succeeded, whether or not the step's own checks pass.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{ApiRequest, ApiResponse};
use crate::common::{Error, Result};

use super::context::StepContext;
use super::expect::ResponseExpect;
use super::runner::StepFlow;

/// A change to shared remote state together with its inverse
#[async_trait]
pub trait ReversibleMutation: Send + Sync {
    /// Short description for logs
    fn describe(&self) -> String;

    /// Perform the change
    async fn apply(&self, ctx: &mut StepContext) -> Result<ApiResponse>;

    /// Assertions on the change's response
    fn check(&self, response: &ApiResponse) -> Result<()>;

    /// Restore the previous value
    async fn revert(&self, ctx: &mut StepContext) -> Result<ApiResponse>;
}

/// Apply `mutation`, check it, and restore the previous value
///
/// The revert runs whenever the mutation returned 2xx. A check failure is
/// reported after the revert; a revert failure fails the step only when
/// the checks themselves passed.
pub async fn run_reversible<M>(ctx: &mut StepContext, mutation: &M) -> Result<StepFlow>
where
    M: ReversibleMutation + ?Sized,
{
    let response = mutation.apply(ctx).await?;
    let checked = mutation.check(&response);

    if !response.is_success() {
        warn!(
            "{} returned {}; nothing to revert",
            mutation.describe(),
            response.status
        );
        return checked.map(|_| StepFlow::Passed);
    }

    let reverted = match mutation.revert(ctx).await {
        Ok(revert) if revert.is_success() => {
            info!("Reverted {}", mutation.describe());
            Ok(())
        }
        Ok(revert) => {
            warn!(
                "Revert of {} returned {}: {}",
                mutation.describe(),
                revert.status,
                revert.body_excerpt()
            );
            Err(Error::assertion(format!(
                "revert of {} returned status {}",
                mutation.describe(),
                revert.status
            )))
        }
        Err(e) => {
            warn!("Revert of {} failed: {}", mutation.describe(), e);
            Err(e)
        }
    };

    checked?;
    reverted.map(|_| StepFlow::Passed)
}

/// A JSON request whose effect is undone by a second JSON request
#[derive(Debug, Clone)]
pub struct JsonMutation {
    pub label: String,
    pub apply: ApiRequest,
    pub revert: ApiRequest,
    pub expected_status: u16,
}

impl JsonMutation {
    /// Same method and path for both directions, different bodies
    pub fn symmetric(
        label: impl Into<String>,
        request: ApiRequest,
        apply_body: Value,
        revert_body: Value,
    ) -> Self {
        Self {
            label: label.into(),
            apply: request.clone().json(apply_body),
            revert: request.json(revert_body),
            expected_status: 200,
        }
    }
}

#[async_trait]
impl ReversibleMutation for JsonMutation {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn apply(&self, ctx: &mut StepContext) -> Result<ApiResponse> {
        ctx.send(self.apply.clone()).await
    }

    fn check(&self, response: &ApiResponse) -> Result<()> {
        response.expect_status(self.expected_status).map(|_| ())
    }

    async fn revert(&self, ctx: &mut StepContext) -> Result<ApiResponse> {
        ctx.send(self.revert.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::Config;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        apply_status: u16,
        check_passes: bool,
        revert_status: u16,
        reverts: AtomicUsize,
    }

    impl Scripted {
        fn new(apply_status: u16, check_passes: bool, revert_status: u16) -> Self {
            Self {
                apply_status,
                check_passes,
                revert_status,
                reverts: AtomicUsize::new(0),
            }
        }
    }

    fn response(status: u16) -> ApiResponse {
        ApiResponse::from_parts("POST", "/admin/email", status, Vec::new(), b"{}")
    }

    #[async_trait]
    impl ReversibleMutation for Scripted {
        fn describe(&self) -> String {
            "scripted change".to_string()
        }

        async fn apply(&self, _ctx: &mut StepContext) -> Result<ApiResponse> {
            Ok(response(self.apply_status))
        }

        fn check(&self, _response: &ApiResponse) -> Result<()> {
            if self.check_passes {
                Ok(())
            } else {
                Err(Error::assertion("value not changed"))
            }
        }

        async fn revert(&self, _ctx: &mut StepContext) -> Result<ApiResponse> {
            self.reverts.fetch_add(1, Ordering::SeqCst);
            Ok(response(self.revert_status))
        }
    }

    fn ctx() -> StepContext {
        let mut config = Config::default();
        config.api.base_url = Some("http://127.0.0.1:9".to_string());
        StepContext::anonymous(&config).unwrap()
    }

    #[tokio::test]
    async fn test_revert_runs_after_passing_check() {
        let m = Scripted::new(200, true, 200);
        let flow = run_reversible(&mut ctx(), &m).await.unwrap();
        assert_eq!(flow, StepFlow::Passed);
        assert_eq!(m.reverts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_revert_runs_even_when_check_fails() {
        let m = Scripted::new(200, false, 200);
        let err = run_reversible(&mut ctx(), &m).await.unwrap_err();
        assert!(err.to_string().contains("value not changed"));
        assert_eq!(m.reverts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_revert_when_mutation_rejected() {
        let m = Scripted::new(500, false, 200);
        assert!(run_reversible(&mut ctx(), &m).await.is_err());
        assert_eq!(m.reverts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_revert_fails_an_otherwise_passing_step() {
        let m = Scripted::new(200, true, 500);
        let err = run_reversible(&mut ctx(), &m).await.unwrap_err();
        assert!(err.to_string().contains("revert of scripted change returned status 500"));
    }

    #[tokio::test]
    async fn test_check_error_wins_over_revert_error() {
        let m = Scripted::new(200, false, 500);
        let err = run_reversible(&mut ctx(), &m).await.unwrap_err();
        assert!(err.to_string().contains("value not changed"));
    }
}
