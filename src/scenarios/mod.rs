//! Built-in scenario groups for the booth API
//!
//! Groups run in the order returned by [`all_groups`]; the steps inside a
//! group run in declaration order because later steps consume what earlier
//! ones create.

mod admin;
mod logout;
mod owner;
mod public;
mod register;
mod search;
mod seed;
mod sessions;
mod venue;
mod visitor;
mod webhooks;

pub use seed::{refresh_visitors, seed_fixtures};

use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::api::{ApiRequest, ApiResponse};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::testing::{
    run_groups, select_groups, ResponseExpect, RunOptions, RunReport, ScenarioGroup, StepContext,
};

/// Every group, in run order
pub fn all_groups() -> Vec<ScenarioGroup> {
    vec![
        register::group(),
        admin::group(),
        owner::group(),
        venue::group(),
        visitor::group(),
        webhooks::group(),
        sessions::group(),
        search::group(),
        public::group(),
        logout::group(),
    ]
}

/// Log in, seed fixtures and run the selected groups
///
/// Unknown group names and missing configuration fail before any request
/// is made.
pub async fn run_suite(config: &Config, groups: &[String], print: bool) -> Result<RunReport> {
    let selected = select_groups(all_groups(), groups)?;
    let mut ctx = StepContext::bootstrap(config).await?;
    info!(account = %ctx.account_id(), user = %ctx.user_id(), "Logged in");

    seed_fixtures(&mut ctx).await;

    let options = RunOptions {
        group_timeout: Duration::from_secs(config.timeouts.group_secs),
        print,
    };
    Ok(run_groups(&mut ctx, &selected, &options).await)
}

/// Send `request` and require status `expected`
pub(crate) async fn call(
    ctx: &StepContext,
    request: ApiRequest,
    expected: u16,
) -> Result<ApiResponse> {
    let response = ctx.send(request).await?;
    response.expect_status(expected)?;
    Ok(response)
}

/// Send `request` and require one of `allowed`
pub(crate) async fn call_in(
    ctx: &StepContext,
    request: ApiRequest,
    allowed: &[u16],
) -> Result<ApiResponse> {
    let response = ctx.send(request).await?;
    response.expect_status_in(allowed)?;
    Ok(response)
}

/// First non-empty string found at any of `pointers`
pub(crate) fn first_id(response: &ApiResponse, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .find_map(|p| response.str_at(p))
        .map(str::to_string)
}

/// Identifier of a newly created entity, required
pub(crate) fn created_id(response: &ApiResponse, pointers: &[&str]) -> Result<String> {
    first_id(response, pointers).ok_or_else(|| {
        Error::assertion(format!(
            "{}: no identifier at {} in response. Body: {}",
            response.describe(),
            pointers.join(" or "),
            response.body_excerpt()
        ))
    })
}

/// Whether `item` carries `id` under `key` or `id`
pub(crate) fn has_id(item: &Value, id: &str) -> bool {
    ["key", "id"]
        .iter()
        .any(|field| item.get(field).and_then(Value::as_str) == Some(id))
}

/// A file loaded for a multipart upload
pub(crate) struct Attachment {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self {
            mime: mime_for(path),
            file_name,
            bytes,
        })
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}
