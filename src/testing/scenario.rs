//! Scenario file execution
//!
//! Runs the steps of a YAML scenario through the same client, context and
//! assertions as the built-in groups.

use colored::Colorize;
use futures_util::future::BoxFuture;
use reqwest::Method;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use crate::api::{ApiRequest, ApiResponse, ResultTag};
use crate::common::config::Config;
use crate::common::{random_suffix, Error, Result};
use crate::scenarios::seed_fixtures;

use super::config::{ResponseExpectation, TestScenario, TestStep};
use super::context::StepContext;
use super::expect::ResponseExpect;
use super::fixtures::FixtureKey;
use super::report::GroupReport;
use super::runner::{run_steps, RunOptions, RunnableStep, StepFlow};

/// Load and parse a scenario file
pub fn load_scenario(path: &Path) -> Result<TestScenario> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    serde_yaml::from_str(&content)
        .map_err(|e| Error::ScenarioParse(format!("{}: {}", path.display(), e)))
}

/// Run a scenario file from start to finish
pub async fn run_scenario(path: &Path, config: &Config, verbose: bool) -> Result<GroupReport> {
    let scenario = load_scenario(path)?;

    println!(
        "\n{} {}",
        "Running Scenario:".blue().bold(),
        scenario.name.white().bold()
    );
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    let mut ctx = if scenario.login {
        StepContext::bootstrap(config).await?
    } else {
        StepContext::anonymous(config)?
    };

    if verbose {
        println!("  Base URL: {}", ctx.api.base_url().dimmed());
        if scenario.login {
            println!("  Account: {}", ctx.account_id().dimmed());
        }
    }

    if scenario.seed {
        seed_fixtures(&mut ctx).await;
    }

    let options = RunOptions {
        group_timeout: Duration::from_secs(config.timeouts.group_secs),
        print: true,
    };

    Ok(run_steps(&mut ctx, &scenario.name, "", &scenario.steps, &options).await)
}

/// Expand `${...}` placeholders in `template`
///
/// Known names: `account_id`, `user_id`, `email`, `booth_id`,
/// `visitor_id`, `template_id`, `jackpot_id`, `poll_id`, `event_id`,
/// `random`, and `fixture.NAME` for captured values.
pub fn expand(template: &str, ctx: &StepContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            Error::ScenarioParse(format!("Unclosed placeholder in '{}'", template))
        })?;
        out.push_str(&placeholder(after[..end].trim(), ctx)?);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn placeholder(name: &str, ctx: &StepContext) -> Result<String> {
    let value = match name {
        "account_id" => ctx.account_id().to_string(),
        "user_id" => ctx.user_id().to_string(),
        "email" => ctx.email().to_string(),
        "booth_id" => ctx.booth_id(),
        "visitor_id" => ctx.visitor_id(),
        "template_id" => ctx.template_id(),
        "jackpot_id" => ctx.jackpot_id(),
        "poll_id" => ctx.poll_id(),
        "event_id" => ctx.event_id(),
        "random" => random_suffix().to_string(),
        other => {
            let Some(fixture) = other.strip_prefix("fixture.") else {
                return Err(Error::ScenarioParse(format!(
                    "Unknown placeholder '${{{}}}'",
                    other
                )));
            };
            match ctx.fixtures.get(&FixtureKey::parse(fixture)) {
                Some(Value::String(s)) => s.clone(),
                Some(value) => value.to_string(),
                None => {
                    return Err(Error::assertion(format!(
                        "fixture '{}' was not captured by an earlier step",
                        fixture
                    )))
                }
            }
        }
    };
    Ok(value)
}

/// Expand placeholders inside every string of a JSON value
pub fn expand_value(value: &Value, ctx: &StepContext) -> Result<Value> {
    Ok(match value {
        Value::String(s) => Value::String(expand(s, ctx)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| expand_value(v, ctx))
                .collect::<Result<_>>()?,
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), expand_value(v, ctx)?)))
                .collect::<Result<_>>()?,
        ),
        other => other.clone(),
    })
}

fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::ScenarioParse(format!("Invalid HTTP method '{}'", method)))
}

fn check_expectation(response: &ApiResponse, expect: &ResponseExpectation) -> Result<()> {
    if !expect.status.is_empty() {
        response.expect_status_in(&expect.status)?;
    }
    if let Some(shape) = expect.shape {
        response.expect_shape(shape)?;
    }
    if let Some(tag) = &expect.result {
        response.expect_result(ResultTag::parse(tag))?;
    }
    for (pointer, value) in &expect.fields {
        response.expect_field(pointer, value)?;
    }
    for pointer in &expect.non_empty {
        response.expect_non_empty(pointer)?;
    }
    Ok(())
}

async fn execute_request_step(
    ctx: &mut StepContext,
    method: &str,
    path: &str,
    body: Option<&Value>,
    auth: bool,
    expect: &ResponseExpectation,
    capture: &std::collections::BTreeMap<String, String>,
) -> Result<StepFlow> {
    let mut request = ApiRequest::new(parse_method(method)?, expand(path, ctx)?);
    if let Some(body) = body {
        request = request.json(expand_value(body, ctx)?);
    }
    if !auth {
        request = request.anonymous();
    }

    let response = ctx.send(request).await?;
    check_expectation(&response, expect)?;

    for (name, pointer) in capture {
        let value = response.pointer(pointer).cloned().ok_or_else(|| {
            Error::assertion(format!(
                "{}: cannot capture '{}', {} is missing",
                response.describe(),
                name,
                pointer
            ))
        })?;
        ctx.fixtures.capture(FixtureKey::parse(name), value);
    }

    Ok(StepFlow::Passed)
}

fn execute_check_fixture_step(
    ctx: &StepContext,
    name: &str,
    equals: Option<&str>,
) -> Result<StepFlow> {
    let key = FixtureKey::parse(name);
    let value = ctx
        .fixtures
        .get(&key)
        .ok_or_else(|| Error::assertion(format!("fixture '{}' was never captured", name)))?;

    if let Some(expected) = equals {
        let actual = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
        if actual != expected {
            return Err(Error::assertion(format!(
                "fixture '{}': expected '{}', got '{}'",
                name, expected, actual
            )));
        }
    }
    Ok(StepFlow::Passed)
}

impl RunnableStep for TestStep {
    fn label(&self) -> String {
        match self {
            TestStep::Request {
                name: Some(name), ..
            } => name.clone(),
            TestStep::Request { method, path, .. } => {
                format!("{} {}", method.to_ascii_uppercase(), path)
            }
            TestStep::CheckFixture { name, .. } => format!("fixture {} is captured", name),
        }
    }

    fn execute<'a>(&'a self, ctx: &'a mut StepContext) -> BoxFuture<'a, Result<StepFlow>> {
        Box::pin(async move {
            match self {
                TestStep::Request {
                    method,
                    path,
                    body,
                    auth,
                    expect,
                    capture,
                    ..
                } => {
                    execute_request_step(ctx, method, path, body.as_ref(), *auth, expect, capture)
                        .await
                }
                TestStep::CheckFixture { name, equals } => {
                    execute_check_fixture_step(ctx, name, equals.as_deref())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> StepContext {
        let mut config = Config::default();
        config.api.base_url = Some("http://127.0.0.1:9/api".to_string());
        let mut ctx = StepContext::anonymous(&config).unwrap();
        ctx.user.user_account_identity = "acc-1".to_string();
        ctx
    }

    #[test]
    fn test_expand_known_placeholders() {
        let mut ctx = ctx();
        ctx.fixtures.capture(FixtureKey::parse("booth"), json!("b-9"));
        assert_eq!(
            expand("/owner/${account_id}/booth/${fixture.booth}", &ctx).unwrap(),
            "/owner/acc-1/booth/b-9"
        );
        assert_eq!(
            expand("/owner/booth/${booth_id}", &ctx).unwrap(),
            format!("/owner/booth/{}", ctx.mock.booth_id)
        );
        assert_eq!(expand("/plain", &ctx).unwrap(), "/plain");
    }

    #[test]
    fn test_expand_errors() {
        let ctx = ctx();
        assert!(matches!(
            expand("/x/${nope}", &ctx),
            Err(Error::ScenarioParse(_))
        ));
        assert!(matches!(
            expand("/x/${account_id", &ctx),
            Err(Error::ScenarioParse(_))
        ));
        assert!(matches!(
            expand("/x/${fixture.missing}", &ctx),
            Err(Error::Assertion(_))
        ));
    }

    #[test]
    fn test_expand_value_walks_nested_strings() {
        let ctx = ctx();
        let body = json!({"accountId": "${account_id}", "tags": ["${account_id}", 3], "n": 1});
        assert_eq!(
            expand_value(&body, &ctx).unwrap(),
            json!({"accountId": "acc-1", "tags": ["acc-1", 3], "n": 1})
        );
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("DELETE").unwrap(), Method::DELETE);
        assert!(parse_method("NOT A METHOD").is_err());
    }

    #[test]
    fn test_check_fixture_step() {
        let mut ctx = ctx();
        assert!(execute_check_fixture_step(&ctx, "poll", None).is_err());
        ctx.fixtures.capture(FixtureKey::parse("poll"), json!("p-1"));
        assert_eq!(
            execute_check_fixture_step(&ctx, "poll", Some("p-1")).unwrap(),
            StepFlow::Passed
        );
        assert!(execute_check_fixture_step(&ctx, "poll", Some("p-2")).is_err());
    }

    #[test]
    fn test_step_labels() {
        let step: TestStep = serde_yaml::from_str(
            "action: request\nmethod: get\npath: /venue/health\n",
        )
        .unwrap();
        assert_eq!(step.label(), "GET /venue/health");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_scenario(Path::new("/nonexistent/scenario.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
