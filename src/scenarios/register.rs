//! Self-service registration with a fresh address

use futures_util::future::BoxFuture;
use serde_json::json;

use crate::api::ApiRequest;
use crate::common::{random_suffix, Result};
use crate::testing::{ScenarioGroup, Step, StepContext, StepFlow};

use super::call;

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "register",
        description: "Self-service registration",
        steps: vec![Step::new("POST /register registers a new user", register_user)],
    }
}

fn register_user(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let email = format!("newadmin{}@yopmail.com", random_suffix());
        let request =
            ApiRequest::post("/register").json(json!({ "name": "BrandingUser", "email": email }));
        call(ctx, request, 200).await?;
        Ok(StepFlow::Passed)
    })
}
