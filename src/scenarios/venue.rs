//! Venue endpoints: health, polls and events

use futures_util::future::BoxFuture;
use serde_json::{json, Value};

use crate::api::ApiRequest;
use crate::common::{random_suffix, Result};
use crate::testing::{ensure, FixtureKey, ScenarioGroup, Step, StepContext, StepFlow};

use super::{call, call_in, created_id, has_id};

const ID_POINTERS: &[&str] = &["/data/key", "/data/id", "/key", "/id"];

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "venue",
        description: "Venue health, polls and events",
        steps: vec![
            Step::new("GET /venue/health responds without a session", health),
            Step::new("POST /venue/:boothId/polls creates a poll", create_poll),
            Step::new("GET /venue/:boothId/polls lists the poll", list_polls),
            Step::new("PUT /venue/polls/:pollId updates the poll", update_poll),
            Step::new("POST /venue/polls/:pollId/archive archives the poll", archive_poll),
            Step::new("DELETE /venue/polls/:pollId deletes the poll", delete_poll),
            Step::new("POST /venue/:boothId/events creates an event", create_event),
            Step::new("GET /venue/events/:eventId gets the event", get_event),
            Step::new("PUT /venue/events/:eventId updates the event", update_event),
            Step::new("DELETE /venue/events/:eventId deletes the event", delete_event),
        ],
    }
}

fn health(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        call(ctx, ApiRequest::get("/venue/health").anonymous(), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn create_poll(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let request = ApiRequest::post(format!("/venue/{}/polls", ctx.booth_id())).json(json!({
            "question": format!("Test Poll {}", random_suffix()),
            "options": ["Yes", "No"],
        }));
        let response = call_in(ctx, request, &[200, 201]).await?;
        let id = created_id(&response, ID_POINTERS)?;
        ctx.fixtures.capture(FixtureKey::CreatedPoll, Value::String(id));
        Ok(StepFlow::Passed)
    })
}

fn list_polls(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = format!("/venue/{}/polls", ctx.booth_id());
        let response = call(ctx, ApiRequest::get(path), 200).await?;
        if let Some(poll_id) = ctx.fixtures.lookup(&FixtureKey::CreatedPoll, "") {
            let listed = response
                .envelope
                .items()
                .unwrap_or_default()
                .iter()
                .any(|p| has_id(p, poll_id));
            ensure(listed, || {
                format!("{}: created poll {} is not listed", response.describe(), poll_id)
            })?;
        }
        Ok(StepFlow::Passed)
    })
}

fn update_poll(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let request = ApiRequest::put(format!("/venue/polls/{}", ctx.poll_id()))
            .json(json!({ "question": "Test Poll Updated" }));
        call(ctx, request, 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn archive_poll(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = format!("/venue/polls/{}/archive", ctx.poll_id());
        call(ctx, ApiRequest::post(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn delete_poll(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = format!("/venue/polls/{}", ctx.poll_id());
        call(ctx, ApiRequest::delete(path), 200).await?;
        ctx.fixtures.remove(&FixtureKey::CreatedPoll);
        Ok(StepFlow::Passed)
    })
}

fn create_event(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let request = ApiRequest::post(format!("/venue/{}/events", ctx.booth_id())).json(json!({
            "name": format!("Test Event {}", random_suffix()),
            "description": "Created by booth-e2e",
        }));
        let response = call_in(ctx, request, &[200, 201]).await?;
        let id = created_id(&response, ID_POINTERS)?;
        ctx.fixtures.capture(FixtureKey::CreatedEvent, Value::String(id));
        Ok(StepFlow::Passed)
    })
}

fn get_event(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = format!("/venue/events/{}", ctx.event_id());
        call(ctx, ApiRequest::get(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn update_event(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let request = ApiRequest::put(format!("/venue/events/{}", ctx.event_id()))
            .json(json!({ "name": "Test Event Updated" }));
        call(ctx, request, 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn delete_event(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = format!("/venue/events/{}", ctx.event_id());
        call(ctx, ApiRequest::delete(path), 200).await?;
        ctx.fixtures.remove(&FixtureKey::CreatedEvent);
        Ok(StepFlow::Passed)
    })
}
