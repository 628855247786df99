//! Visitor and user search
//!
//! Query values are form-urlencoded before they go into the path.

use futures_util::future::BoxFuture;
use serde_json::Value;
use url::form_urlencoded::byte_serialize;

use crate::api::ApiRequest;
use crate::common::Result;
use crate::testing::{ensure, ScenarioGroup, Step, StepContext, StepFlow};

use super::call;

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "search",
        description: "Visitor and user search",
        steps: vec![
            Step::new("GET /owner/:accountId/visitors/search finds visitors", search_visitors),
            Step::new("GET /admin/users/search finds the admin by email", search_users),
        ],
    }
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

fn search_visitors(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = format!(
            "/owner/{}/visitors/search?q={}",
            ctx.account_id(),
            encode("example.com")
        );
        call(ctx, ApiRequest::get(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn search_users(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let email = ctx.email().to_string();
        let path = format!("/admin/users/search?email={}", encode(&email));
        let response = call(ctx, ApiRequest::get(path), 200).await?;
        let found = response
            .envelope
            .items()
            .unwrap_or_default()
            .iter()
            .filter_map(|u| u.get("email").and_then(Value::as_str))
            .any(|e| e.eq_ignore_ascii_case(&email));
        ensure(found, || {
            format!("{}: no user with email {}", response.describe(), email)
        })?;
        Ok(StepFlow::Passed)
    })
}
