//! Current session identity

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::api::ApiRequest;
use crate::common::Result;
use crate::testing::{ensure, ScenarioGroup, Step, StepContext, StepFlow};

use super::call;

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "sessions",
        description: "Session introspection",
        steps: vec![Step::new(
            "GET /session returns the logged-in identity",
            current_session,
        )],
    }
}

fn current_session(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let response = call(ctx, ApiRequest::get("/session"), 200).await?;
        let identity = response.envelope.payload().unwrap_or(&response.json);
        let account = identity
            .get("userAccountIdentity")
            .and_then(Value::as_str)
            .unwrap_or_default();
        ensure(account == ctx.account_id(), || {
            format!(
                "{}: expected userAccountIdentity {}, got '{}'",
                response.describe(),
                ctx.account_id(),
                account
            )
        })?;
        Ok(StepFlow::Passed)
    })
}
