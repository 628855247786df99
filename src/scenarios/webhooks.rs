//! Provider callbacks
//!
//! Both webhooks are called without a session, the way the providers
//! call them.

use futures_util::future::BoxFuture;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::api::ApiRequest;
use crate::common::{random_suffix, Result};
use crate::testing::{ScenarioGroup, Step, StepContext, StepFlow};

use super::{call, call_in};

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "webhooks",
        description: "Inbound provider callbacks",
        steps: vec![
            Step::new("POST /webhooks/sendgrid accepts an event batch", sendgrid_events),
            Step::new("POST /webhooks/clearbit accepts an enrichment callback", clearbit_callback),
        ],
    }
}

fn sendgrid_events(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let request = ApiRequest::post("/webhooks/sendgrid")
            .anonymous()
            .json(json!([{
                "email": "external@example.com",
                "event": "delivered",
                "timestamp": timestamp,
                "sg_message_id": format!("booth-e2e-{}", random_suffix()),
            }]));
        call(ctx, request, 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn clearbit_callback(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let request = ApiRequest::post("/webhooks/clearbit")
            .anonymous()
            .json(json!({
                "id": format!("booth-e2e-{}", random_suffix()),
                "status": 200,
                "body": { "person": { "email": "external@example.com" } },
            }));
        call_in(ctx, request, &[200, 404]).await?;
        Ok(StepFlow::Passed)
    })
}
