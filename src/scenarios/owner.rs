//! Owner endpoints: booths, videos, templates, jackpots and galleries
//!
//! Templates and jackpots follow create, update, use, delete. Every
//! consumer resolves the id through the context, so a missing producer
//! falls back to the mock identifiers.

use futures_util::future::BoxFuture;
use serde_json::{json, Value};

use crate::api::{ApiRequest, FormData, Shape};
use crate::common::{random_suffix, Error, Result};
use crate::testing::{
    ensure, run_reversible, FixtureKey, JsonMutation, ResponseExpect, ScenarioGroup, Step,
    StepContext, StepFlow,
};

use super::{call, first_id, Attachment};

const TEMPLATE_NAME: &str = "Test Template";

/// 1x1 transparent PNG used when no logo image is configured
const FALLBACK_LOGO: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "owner",
        description: "Account owner resources",
        steps: vec![
            Step::new("GET /owner/:accountId/dropbox/auth retrieves dropbox auth", dropbox_auth),
            Step::new(
                "POST /owner/:accountId/booth/:boothId/listMode sets list mode",
                set_list_mode,
            ),
            Step::new("POST /owner/:accountId/add-video-list adds a video list", add_video_list),
            Step::new(
                "GET /owner/:accountId/booth/:boothId/video gets recent videos",
                recent_videos,
            ),
            Step::new(
                "POST /owner/:accountId/name renames and restores the account",
                rename_account,
            ),
            Step::new("POST /owner/:accountId/logo uploads a logo", upload_logo),
            Step::new("POST /owner/:accountId/templates creates a template", create_template),
            Step::new("GET /owner/:accountId/templates gets templates", list_templates),
            Step::new(
                "GET /owner/:accountId/templates/:templateId gets the template",
                get_template,
            ),
            Step::new(
                "POST /owner/:accountId/templates/:templateId updates the template",
                update_template,
            ),
            Step::new(
                "POST /owner/:accountId/templates/:templateId/default makes it default",
                default_template,
            ),
            Step::new(
                "POST /owner/:accountId/templates/:templateId/jackpots creates a jackpot",
                create_jackpot,
            ),
            Step::new(
                "POST /owner/:accountId/jackpots/:jackpotId updates the jackpot",
                update_jackpot,
            ),
            Step::new(
                "GET /owner/:accountId/templates/:templateId/jackpots gets template jackpots",
                template_jackpots,
            ),
            Step::new("GET /owner/:accountId/jackpot gets account jackpots", account_jackpots),
            Step::new("GET /owner/:accountId/jackpots/:jackpotId gets the jackpot", get_jackpot),
            Step::new(
                "DELETE /owner/:accountId/gallery/:templateId/delete deletes the gallery",
                delete_gallery,
            ),
            Step::new(
                "DELETE /owner/:accountId/gallery/:templateId/delete/assets deletes assets",
                delete_gallery_assets,
            ),
            Step::new(
                "DELETE /owner/:accountId/templates/:templateId deletes the template",
                delete_template,
            ),
            Step::new(
                "DELETE /owner/:accountId/jackpots/:jackpotId deletes the jackpot",
                delete_jackpot,
            ),
            Step::new("GET /owner/account lists booth ids", booth_ids_listed),
            Step::new("GET /owner/:accountId/booth retrieves booths", list_booths),
            Step::new("GET /owner/booth/:boothId retrieves booth details", booth_details),
            Step::new("GET /owner/:accountId/actions retrieves actions", list_actions),
            Step::new(
                "GET /owner/:accountId/faceIdentities/:visitorId retrieves face identities",
                face_identities,
            ),
        ],
    }
}

fn owner_path(ctx: &StepContext, rest: &str) -> String {
    format!("/owner/{}{}", ctx.account_id(), rest)
}

fn dropbox_auth(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let response = call(ctx, ApiRequest::get(owner_path(ctx, "/dropbox/auth")), 200).await?;
        response.expect_non_empty("/data")?;
        Ok(StepFlow::Passed)
    })
}

fn set_list_mode(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let rest = format!("/booth/{}/listMode?listMode=whiteList", ctx.booth_id());
        let path = owner_path(ctx, &rest);
        call(ctx, ApiRequest::post(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn add_video_list(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(
            ctx,
            &format!("/add-video-list?videoId={}&listMode=whiteList", ctx.mock.video_id),
        );
        call(ctx, ApiRequest::post(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn recent_videos(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(ctx, &format!("/booth/{}/video", ctx.booth_id()));
        let response = call(ctx, ApiRequest::get(path), 200).await?;
        ctx.fixtures
            .capture(FixtureKey::RecentVideos, response.json.clone());
        Ok(StepFlow::Passed)
    })
}

fn rename_account(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let Some(original) = ctx.fixtures.lookup(&FixtureKey::AccountName, "") else {
            return Ok(StepFlow::Skipped("account name was not captured".to_string()));
        };
        let original = original.to_string();
        let mutation = JsonMutation::symmetric(
            "account name",
            ApiRequest::post(owner_path(ctx, "/name")),
            json!({ "name": format!("Test Account {}", random_suffix()) }),
            json!({ "name": original }),
        );
        run_reversible(ctx, &mutation).await
    })
}

fn upload_logo(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let logo = match ctx.attachments.logo_image.clone() {
            Some(path) => Attachment::read(&path).await?,
            None => Attachment {
                file_name: "logo.png".to_string(),
                mime: "image/png",
                bytes: FALLBACK_LOGO.to_vec(),
            },
        };
        let form = FormData::new().file("logo", logo.file_name, logo.mime, logo.bytes);
        call(ctx, ApiRequest::post(owner_path(ctx, "/logo")).form(form), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn template_form(suffix: &str, to: &str) -> FormData {
    FormData::new()
        .text("email_body", format!("Test Email Body{}", suffix))
        .text("email_subj", format!("Test Email Subject{}", suffix))
        .text("email_to", to)
        .text("email_from", to)
        .text("template_name", TEMPLATE_NAME)
        .text("sms_text", "Test SMS Text")
}

fn create_template(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let form = template_form("", "test@example.com");
        let request = ApiRequest::post(owner_path(ctx, "/templates")).form(form);
        let response = call(ctx, request, 200).await?;
        if let Some(id) = first_id(&response, &["/data/id", "/data/key", "/id"]) {
            ctx.fixtures.capture(FixtureKey::CreatedTemplate, Value::String(id));
        }
        Ok(StepFlow::Passed)
    })
}

/// Id of the newest template named [`TEMPLATE_NAME`] in a listing
fn newest_test_template(templates: &[Value]) -> Option<&str> {
    templates
        .iter()
        .rev()
        .filter(|t| {
            ["templateName", "template_name", "name"]
                .iter()
                .any(|field| t.get(*field).and_then(Value::as_str) == Some(TEMPLATE_NAME))
        })
        .find_map(|t| t.get("id").and_then(Value::as_str))
}

fn list_templates(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let response = call(ctx, ApiRequest::get(owner_path(ctx, "/templates")), 200).await?;
        if !ctx.fixtures.contains(&FixtureKey::CreatedTemplate) {
            let found = response
                .envelope
                .items()
                .and_then(newest_test_template)
                .map(str::to_string)
                .or_else(|| first_id(&response, &["/data/id"]));
            if let Some(id) = found {
                ctx.fixtures.capture(FixtureKey::CreatedTemplate, Value::String(id));
            }
        }
        Ok(StepFlow::Passed)
    })
}

fn get_template(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(ctx, &format!("/templates/{}", ctx.template_id()));
        call(ctx, ApiRequest::get(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn update_template(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let form = template_form(" Updated", "test@example.com Updated");
        let path = owner_path(ctx, &format!("/templates/{}", ctx.template_id()));
        call(ctx, ApiRequest::post(path).form(form), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn default_template(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(ctx, &format!("/templates/{}/default", ctx.template_id()));
        call(ctx, ApiRequest::post(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn jackpot_form() -> FormData {
    FormData::new()
        .text("send_button_text", "Send")
        .text("email_subj", "Test Email Subject Updated")
        .text("email_body", "Test Email Body Updated")
        .text("jack_prize", "100")
}

fn create_jackpot(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let Some(video) = ctx.attachments.jackpot_video.clone() else {
            return Ok(StepFlow::Skipped("no jackpot video configured".to_string()));
        };
        let video = Attachment::read(&video).await?;
        let form = jackpot_form().file("video", video.file_name, video.mime, video.bytes);
        let path = owner_path(ctx, &format!("/templates/{}/jackpots", ctx.template_id()));
        let response = call(ctx, ApiRequest::post(path).form(form), 200).await?;
        if let Some(id) = first_id(&response, &["/data/id", "/data/key", "/id"]) {
            ctx.fixtures.capture(FixtureKey::CreatedJackpot, Value::String(id));
        }
        Ok(StepFlow::Passed)
    })
}

fn update_jackpot(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(ctx, &format!("/jackpots/{}", ctx.jackpot_id()));
        let response = call(ctx, ApiRequest::post(path).form(jackpot_form()), 200).await?;
        response.expect_field("/data/sendButtonText", &json!("Send"))?;
        Ok(StepFlow::Passed)
    })
}

fn template_jackpots(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(ctx, &format!("/templates/{}/jackpots", ctx.template_id()));
        call(ctx, ApiRequest::get(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn account_jackpots(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        call(ctx, ApiRequest::get(owner_path(ctx, "/jackpot")), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn get_jackpot(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(ctx, &format!("/jackpots/{}", ctx.jackpot_id()));
        call(ctx, ApiRequest::get(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn delete_gallery(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(ctx, &format!("/gallery/{}/delete", ctx.template_id()));
        call(ctx, ApiRequest::delete(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn delete_gallery_assets(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(ctx, &format!("/gallery/{}/delete/assets", ctx.template_id()));
        call(ctx, ApiRequest::delete(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn delete_template(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(ctx, &format!("/templates/{}", ctx.template_id()));
        call(ctx, ApiRequest::delete(path), 200).await?;
        ctx.fixtures.remove(&FixtureKey::CreatedTemplate);
        Ok(StepFlow::Passed)
    })
}

fn delete_jackpot(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(ctx, &format!("/jackpots/{}", ctx.jackpot_id()));
        call(ctx, ApiRequest::delete(path), 200).await?;
        ctx.fixtures.remove(&FixtureKey::CreatedJackpot);
        Ok(StepFlow::Passed)
    })
}

fn booth_ids_listed(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let ids = ctx
            .fixtures
            .get(&FixtureKey::BoothIds)
            .ok_or_else(|| Error::assertion("boothsIds was not captured from /owner/account"))?;
        ensure(ids.is_array(), || {
            format!("expected boothsIds to be an array, got {}", ids)
        })?;
        Ok(StepFlow::Passed)
    })
}

fn list_booths(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let response = call(ctx, ApiRequest::get(owner_path(ctx, "/booth")), 200).await?;
        response.expect_shape(Shape::Array)?;
        ctx.fixtures.capture(FixtureKey::Booths, response.json.clone());
        Ok(StepFlow::Passed)
    })
}

fn booth_details(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let booth_id = ctx.booth_id();
        let path = format!("/owner/booth/{}", booth_id);
        let response = call(ctx, ApiRequest::get(path), 200).await?;
        response.expect_field("/key", &Value::String(booth_id))?;
        Ok(StepFlow::Passed)
    })
}

fn list_actions(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let response = call(ctx, ApiRequest::get(owner_path(ctx, "/actions")), 200).await?;
        response.expect_shape(Shape::Array)?;
        Ok(StepFlow::Passed)
    })
}

fn face_identities(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = owner_path(ctx, &format!("/faceIdentities/{}", ctx.visitor_id()));
        let response = call(ctx, ApiRequest::get(path), 200).await?;
        response.expect_not_null("/data")?;
        Ok(StepFlow::Passed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_test_template_wins() {
        let templates = vec![
            json!({"id": "t-1", "templateName": "Test Template"}),
            json!({"id": "t-2", "templateName": "Welcome"}),
            json!({"id": "t-3", "template_name": "Test Template"}),
        ];
        assert_eq!(newest_test_template(&templates), Some("t-3"));
        assert_eq!(newest_test_template(&templates[1..2]), None);
    }

    #[test]
    fn test_template_form_fields() {
        let form = template_form(" Updated", "test@example.com Updated");
        let fields: Vec<&str> = form.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            fields,
            vec!["email_body", "email_subj", "email_to", "email_from", "template_name", "sms_text"]
        );
        assert_eq!(form.fields()[0].1, "Test Email Body Updated");
    }

    #[test]
    fn test_fallback_logo_is_png() {
        assert_eq!(&FALLBACK_LOGO[..8], b"\x89PNG\r\n\x1a\n");
    }
}
