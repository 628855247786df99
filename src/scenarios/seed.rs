//! Baseline fixtures read after login
//!
//! Seeding never fails the run. Anything missing here is resolved to the
//! mock identifiers by the consumers.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::api::{ApiRequest, ApiResponse};
use crate::common::Result;
use crate::testing::{FixtureKey, StepContext};

/// Capture the account's booth ids, name and visitors
pub async fn seed_fixtures(ctx: &mut StepContext) {
    if let Err(e) = seed_account(ctx).await {
        warn!("Could not read owner account, using fallback booth id: {}", e);
        ctx.fixtures.capture(FixtureKey::BoothIds, json!([]));
    }

    match refresh_visitors(ctx).await {
        Ok(response) if response.is_success() => {}
        Ok(response) => warn!(
            status = response.status,
            "Visitor list unavailable, using fallback visitor id"
        ),
        Err(e) => warn!("Could not read visitors, using fallback visitor id: {}", e),
    }
    debug!(fixtures = ctx.fixtures.len(), "seeding finished");
}

async fn seed_account(ctx: &mut StepContext) -> Result<()> {
    let response = ctx.send(ApiRequest::get("/owner/account")).await?;
    if !response.is_success() {
        warn!(status = response.status, "GET /owner/account was not successful");
    }

    let booth_ids = response
        .pointer("/boothsIds")
        .filter(|v| v.is_array())
        .cloned()
        .unwrap_or_else(|| json!([]));
    debug!(booths = %booth_ids, "seeded booth ids");
    ctx.fixtures.capture(FixtureKey::BoothIds, booth_ids);

    if let Some(name) = response.str_at("/name") {
        let name = name.to_string();
        ctx.fixtures.capture(FixtureKey::AccountName, Value::String(name));
    }
    Ok(())
}

/// Re-read the account's visitors into [`FixtureKey::AccountVisitors`]
///
/// Only an array body replaces the previous capture.
pub async fn refresh_visitors(ctx: &mut StepContext) -> Result<ApiResponse> {
    let path = format!("/owner/{}/visitors", ctx.account_id());
    let response = ctx.send(ApiRequest::get(path)).await?;

    if let Some(items) = response.envelope.items() {
        let visitors = Value::Array(items.to_vec());
        ctx.fixtures.capture(FixtureKey::AccountVisitors, visitors);
    }
    Ok(response)
}
