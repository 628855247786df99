//! Logout, run last because it ends the session

use futures_util::future::BoxFuture;

use crate::api::ApiRequest;
use crate::common::Result;
use crate::testing::{ScenarioGroup, Step, StepContext, StepFlow};

use super::{call, call_in};

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "logout",
        description: "Session termination",
        steps: vec![
            Step::new("POST /logout ends the session", logout),
            Step::new("GET /owner/account rejects the stale cookie", stale_cookie_rejected),
        ],
    }
}

fn logout(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        call(ctx, ApiRequest::post("/logout"), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn stale_cookie_rejected(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        call_in(ctx, ApiRequest::get("/owner/account"), &[401, 403]).await?;
        Ok(StepFlow::Passed)
    })
}
