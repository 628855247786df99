//! Public pages served without a session cookie

use futures_util::future::BoxFuture;

use crate::api::ApiRequest;
use crate::common::Result;
use crate::testing::{ScenarioGroup, Step, StepContext, StepFlow};

use super::call_in;

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "public",
        description: "Endpoints served without a session",
        steps: vec![
            Step::new("GET /public/booth/:boothId serves the booth page", public_booth),
            Step::new("GET /public/templates/:templateId serves the template", public_template),
        ],
    }
}

fn public_booth(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = format!("/public/booth/{}", ctx.booth_id());
        call_in(ctx, ApiRequest::get(path).anonymous(), &[200, 404]).await?;
        Ok(StepFlow::Passed)
    })
}

fn public_template(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = format!("/public/templates/{}", ctx.template_id());
        call_in(ctx, ApiRequest::get(path).anonymous(), &[200, 404]).await?;
        Ok(StepFlow::Passed)
    })
}
