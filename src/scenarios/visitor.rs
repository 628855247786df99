//! Visitor endpoints
//!
//! Every id comes from the first visitor of the account when the list was
//! captured, otherwise from the mock table.

use futures_util::future::BoxFuture;
use serde_json::json;

use crate::api::ApiRequest;
use crate::common::Result;
use crate::testing::{FixtureKey, ResponseExpect, ScenarioGroup, Step, StepContext, StepFlow};

use super::{call, refresh_visitors};

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "visitor",
        description: "Visitors and their faces",
        steps: vec![
            Step::new("GET /owner/:accountId/visitors refreshes visitors", refresh),
            Step::new("GET /visitor/:visitorId gets the visitor", get_visitor),
            Step::new(
                "POST /visitor/:visitorId/makePrimaryFace/:actionId sets primary face by action",
                primary_face_by_action,
            ),
            Step::new(
                "POST /visitor/:visitorId/makePrimaryFaceById/:faceId sets primary face by id",
                primary_face_by_id,
            ),
            Step::new(
                "GET /visitor/:visitorId/resetPrimaryFace/:faceIdentityId resets primary face",
                reset_primary_face,
            ),
            Step::new("POST /visitor/external saves an external visitor", save_external),
        ],
    }
}

fn first_visitor_field(ctx: &StepContext, field: &str, fallback: &str) -> String {
    ctx.fixtures
        .resolve(&FixtureKey::AccountVisitors, &format!("/0/{}", field), fallback)
}

fn refresh(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let response = refresh_visitors(ctx).await?;
        response.expect_status(200)?;
        Ok(StepFlow::Passed)
    })
}

fn get_visitor(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = format!("/visitor/{}", ctx.visitor_id());
        call(ctx, ApiRequest::get(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn primary_face_by_action(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let action_id = first_visitor_field(ctx, "actionId", &ctx.mock.action_id);
        let path = format!("/visitor/{}/makePrimaryFace/{}", ctx.visitor_id(), action_id);
        call(ctx, ApiRequest::post(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn primary_face_by_id(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let face_id = first_visitor_field(ctx, "faceId", &ctx.mock.face_id);
        let path = format!("/visitor/{}/makePrimaryFaceById/{}", ctx.visitor_id(), face_id);
        call(ctx, ApiRequest::post(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn reset_primary_face(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let face_identity_id =
            first_visitor_field(ctx, "faceIdentityId", &ctx.mock.face_identity_id);
        let path = format!(
            "/visitor/{}/resetPrimaryFace/{}",
            ctx.visitor_id(),
            face_identity_id
        );
        call(ctx, ApiRequest::get(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn save_external(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let request = ApiRequest::post("/visitor/external").json(json!({
            "boothId": ctx.booth_id(),
            "email": "external@example.com",
        }));
        call(ctx, request, 200).await?;
        Ok(StepFlow::Passed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::Config;

    #[test]
    fn test_first_visitor_field_falls_back_per_field() {
        let mut config = Config::default();
        config.api.base_url = Some("http://127.0.0.1:9".to_string());
        let mut ctx = StepContext::anonymous(&config).unwrap();
        ctx.fixtures.capture(
            FixtureKey::AccountVisitors,
            json!([{"key": "v-1", "actionId": "a-1"}]),
        );

        assert_eq!(first_visitor_field(&ctx, "actionId", "mock-a"), "a-1");
        assert_eq!(first_visitor_field(&ctx, "faceId", "mock-f"), "mock-f");
        assert_eq!(ctx.visitor_id(), "v-1");
    }
}
