//! Admin endpoints: users, accounts, booths and credential changes

use futures_util::future::BoxFuture;
use serde_json::{json, Value};

use crate::api::{ApiRequest, Shape};
use crate::common::{random_suffix, Error, Result};
use crate::testing::{
    ensure, run_reversible, FixtureKey, JsonMutation, ResponseExpect, ScenarioGroup, Step,
    StepContext, StepFlow,
};

use super::{call, call_in, created_id};

/// Temporary password set and then reverted
const TEMP_PASSWORD: &str = "newsecure123";
/// Temporary admin email set and then reverted
const TEMP_EMAIL: &str = "newadminemail@example.com";
/// Address the "includes new admin" step looks for.
/// The add step registers `newadmin<N>@example.com`, so this only matches
/// when such a user already exists on the server.
const LISTED_ADMIN_EMAIL: &str = "newadmin@example.com";

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "admin",
        description: "User, account and booth administration",
        steps: vec![
            Step::new("GET /admin/dummy creates a dummy user", create_dummy_user),
            Step::new("GET /admin/users fetches all users", list_users),
            Step::new("GET /admin/users includes the dummy user", users_include_dummy),
            Step::new("GET /admin/users/:key fetches user by key", user_by_key),
            Step::new("GET /admin/users/pending fetches pending users", list_pending),
            Step::new("GET /admin/users/pending/:key fetches a pending user", pending_by_key),
            Step::new(
                "GET /admin/users/pending/approve/:key approves a pending user",
                approve_pending,
            ),
            Step::new("GET /admin/account fetches all accounts", list_accounts),
            Step::new("GET /admin/account/:key fetches account by key", account_by_key),
            Step::new("PUT /admin/add creates a new admin", add_admin),
            Step::new("GET /admin/users includes the new admin", users_include_new_admin),
            Step::new("POST /admin/branding creates a branding user", create_branding_user),
            Step::new("POST /admin/booth adds a booth", create_booth),
            Step::new("GET /admin/booth/:key fetches booths by account", booths_by_account),
            Step::new("PUT /admin/booth renames the booth", update_booth),
            Step::new("DELETE /admin/booth/:key deletes the booth", delete_booth),
            Step::new(
                "POST /admin/password changes and restores the admin password",
                change_password,
            ),
            Step::new("POST /admin/email changes and restores the admin email", change_email),
            Step::new(
                "POST /admin/password/users changes and restores a user password",
                change_user_password,
            ),
            Step::new("DELETE /admin/account/:key deletes the dummy account", delete_dummy_account),
        ],
    }
}

fn create_dummy_user(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let response = call(ctx, ApiRequest::get("/admin/dummy"), 200).await?;
        response.expect_shape(Shape::UserWrapper)?;
        if let Some(user) = response.envelope.payload() {
            ctx.fixtures.capture(FixtureKey::DummyUser, user.clone());
        }
        Ok(StepFlow::Passed)
    })
}

fn list_users(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        call(ctx, ApiRequest::get("/admin/users"), 200).await?;
        Ok(StepFlow::Passed)
    })
}

/// Key identifying the dummy user in user listings
fn dummy_key(dummy: &Value) -> Option<&str> {
    ["key", "userIdentity"].iter().find_map(|field| {
        dummy
            .get(*field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    })
}

fn count_with_key(users: &[Value], key: &str) -> usize {
    users
        .iter()
        .filter(|u| u.get("key").and_then(Value::as_str) == Some(key))
        .count()
}

fn users_include_dummy(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let key = ctx
            .fixtures
            .get(&FixtureKey::DummyUser)
            .and_then(dummy_key)
            .map(str::to_string)
            .ok_or_else(|| Error::assertion("Dummy user not found"))?;

        let response = call(ctx, ApiRequest::get("/admin/users"), 200).await?;
        let users = response.envelope.items().unwrap_or_default();
        let matches = count_with_key(users, &key);
        ensure(matches == 1, || {
            format!(
                "{}: expected exactly one user with key {}, found {}",
                response.describe(),
                key,
                matches
            )
        })?;
        Ok(StepFlow::Passed)
    })
}

fn user_by_key(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let user_id = ctx.user_id().to_string();
        let response = call(ctx, ApiRequest::get(format!("/admin/users/{}", user_id)), 200).await?;
        response.expect_field("/key", &Value::String(user_id))?;
        Ok(StepFlow::Passed)
    })
}

/// Key of the first pending user, if any
async fn first_pending_key(ctx: &StepContext) -> Result<Option<String>> {
    let response = call(ctx, ApiRequest::get("/admin/users/pending"), 200).await?;
    Ok(response
        .envelope
        .items()
        .and_then(|items| items.first())
        .and_then(|u| u.get("key"))
        .and_then(Value::as_str)
        .map(str::to_string))
}

fn list_pending(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let response = call(ctx, ApiRequest::get("/admin/users/pending"), 200).await?;
        response.expect_shape(Shape::Array)?;
        Ok(StepFlow::Passed)
    })
}

fn pending_by_key(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let Some(key) = first_pending_key(ctx).await? else {
            return Ok(StepFlow::Skipped("no pending users".to_string()));
        };
        let path = format!("/admin/users/pending/{}", key);
        let response = call(ctx, ApiRequest::get(path), 200).await?;
        response.expect_field("/key", &Value::String(key))?;
        Ok(StepFlow::Passed)
    })
}

fn approve_pending(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let Some(key) = first_pending_key(ctx).await? else {
            return Ok(StepFlow::Skipped("no pending users".to_string()));
        };
        let path = format!("/admin/users/pending/approve/{}", key);
        call(ctx, ApiRequest::get(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn list_accounts(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        call(ctx, ApiRequest::get("/admin/account"), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn account_by_key(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = format!("/admin/account/{}", ctx.account_id());
        call(ctx, ApiRequest::get(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn add_admin(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let n = random_suffix();
        let request = ApiRequest::put("/admin/add").json(json!({
            "email": format!("newadmin{}@example.com", n),
            "password": "secure123",
            "name": format!("New Admin {}", n),
            "phone": "1234567890",
        }));
        call_in(ctx, request, &[200, 201]).await?;
        Ok(StepFlow::Passed)
    })
}

fn users_include_new_admin(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let response = ctx.send(ApiRequest::get("/admin/users")).await?;
        let found = response
            .envelope
            .items()
            .unwrap_or_default()
            .iter()
            .any(|u| u.get("email").and_then(Value::as_str) == Some(LISTED_ADMIN_EMAIL));
        ensure(found, || {
            format!(
                "{}: no user with email {}",
                response.describe(),
                LISTED_ADMIN_EMAIL
            )
        })?;
        Ok(StepFlow::Passed)
    })
}

fn create_branding_user(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let request = ApiRequest::post("/admin/branding").json(json!({
            "name": "BrandingUser",
            "email": "brand@example.com",
            "accountId": ctx.account_id(),
            "password": "secure123",
        }));
        call(ctx, request, 200).await?;
        Ok(StepFlow::Passed)
    })
}

/// POST a new "Test Booth" and return its key
async fn post_booth(ctx: &StepContext) -> Result<String> {
    let request = ApiRequest::post("/admin/booth").json(json!({ "name": "Test Booth" }));
    let response = call(ctx, request, 201).await?;
    response.expect_non_empty("/key")?;
    created_id(&response, &["/key"])
}

fn create_booth(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let key = post_booth(ctx).await?;
        ctx.fixtures.capture(FixtureKey::CreatedBooth, Value::String(key));
        Ok(StepFlow::Passed)
    })
}

fn booths_by_account(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let path = format!("/admin/booth/{}", ctx.account_id());
        call(ctx, ApiRequest::get(path), 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn update_booth(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let Some(key) = ctx.fixtures.lookup(&FixtureKey::CreatedBooth, "") else {
            return Ok(StepFlow::Skipped("no booth was created".to_string()));
        };
        let request = ApiRequest::put("/admin/booth").json(json!({
            "name": format!("Test Booth {}", random_suffix()),
            "key": key,
        }));
        call(ctx, request, 200).await?;
        Ok(StepFlow::Passed)
    })
}

fn delete_booth(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let key = match ctx.fixtures.lookup(&FixtureKey::CreatedBooth, "") {
            Some(key) => key.to_string(),
            None => post_booth(ctx).await?,
        };
        call(ctx, ApiRequest::delete(format!("/admin/booth/{}", key)), 200).await?;
        ctx.fixtures.remove(&FixtureKey::CreatedBooth);
        Ok(StepFlow::Passed)
    })
}

fn change_password(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let original = ctx.password()?.to_string();
        let mutation = JsonMutation::symmetric(
            "admin password",
            ApiRequest::post("/admin/password"),
            json!({ "oldPassword": original, "newPassword": TEMP_PASSWORD }),
            json!({ "oldPassword": TEMP_PASSWORD, "newPassword": original }),
        );
        run_reversible(ctx, &mutation).await
    })
}

fn change_email(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let original = ctx.email().to_string();
        let mutation = JsonMutation::symmetric(
            "admin email",
            ApiRequest::post("/admin/email"),
            json!({ "email": TEMP_EMAIL }),
            json!({ "email": original }),
        );
        run_reversible(ctx, &mutation).await
    })
}

fn change_user_password(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let original = ctx.password()?.to_string();
        let user_id = ctx.user_id().to_string();
        let mutation = JsonMutation::symmetric(
            "user password",
            ApiRequest::post("/admin/password/users"),
            json!({ "key": user_id, "newPassword": TEMP_PASSWORD }),
            json!({ "key": user_id, "newPassword": original }),
        );
        run_reversible(ctx, &mutation).await
    })
}

fn delete_dummy_account(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepFlow>> {
    Box::pin(async move {
        let account = ctx
            .fixtures
            .lookup(&FixtureKey::DummyUser, "/userAccountIdentity")
            .map(str::to_string)
            .ok_or_else(|| Error::assertion("Dummy user not found"))?;
        call(ctx, ApiRequest::delete(format!("/admin/account/{}", account)), 200).await?;
        ctx.fixtures.remove(&FixtureKey::DummyUser);
        Ok(StepFlow::Passed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_key_prefers_key() {
        assert_eq!(dummy_key(&json!({"key": "k1", "userIdentity": "u1"})), Some("k1"));
        assert_eq!(dummy_key(&json!({"userIdentity": "u1"})), Some("u1"));
        assert_eq!(dummy_key(&json!({"key": "", "userIdentity": "u2"})), Some("u2"));
        assert_eq!(dummy_key(&json!({"key": ""})), None);
    }

    #[test]
    fn test_count_with_key() {
        let users = vec![
            json!({"key": "a", "email": "a@example.com"}),
            json!({"key": "b"}),
            json!({"email": "nokey@example.com"}),
        ];
        assert_eq!(count_with_key(&users, "a"), 1);
        assert_eq!(count_with_key(&users, "z"), 0);
    }
}
