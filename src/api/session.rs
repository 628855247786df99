//! Session bootstrap
//!
//! One login per run. The cookie captured here is replayed on every
//! authenticated request and never refreshed.

use serde_json::json;
use tracing::{info, warn};

use crate::common::config::Credentials;
use crate::common::{Error, Result};

use super::client::{ApiClient, ApiRequest, ApiResponse};
use super::protocol::CurrentUser;

/// Opaque session credential built from the login `Set-Cookie` headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    cookie: String,
}

impl Session {
    /// Build a session from raw `Set-Cookie` values
    ///
    /// Keeps the `name=value` pair of each header and drops attributes
    /// such as `Path` or `HttpOnly`. Returns `None` when nothing usable
    /// remains, so a session is never empty.
    pub fn from_set_cookie<S: AsRef<str>>(headers: &[S]) -> Option<Self> {
        let pairs: Vec<&str> = headers
            .iter()
            .filter_map(|h| h.as_ref().split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('=') && !pair.starts_with('='))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(Self {
                cookie: pairs.join("; "),
            })
        }
    }

    /// Value for the `Cookie` request header
    pub fn cookie(&self) -> &str {
        &self.cookie
    }
}

/// Identity payload of a login response
fn identity_from(response: &ApiResponse) -> CurrentUser {
    let data = response
        .envelope
        .payload()
        .cloned()
        .or_else(|| response.pointer("/data").cloned());

    match data.map(serde_json::from_value::<CurrentUser>) {
        Some(Ok(user)) => user,
        Some(Err(e)) => {
            warn!("Login response identity could not be decoded: {}", e);
            CurrentUser::default()
        }
        None => {
            warn!("Login response carried no identity data");
            CurrentUser::default()
        }
    }
}

/// Authenticate and attach the session to `client`
///
/// Fails with [`Error::Authentication`] when the status is not 200, no
/// cookie was issued, or the identity carries no account identifier.
pub async fn login(client: &mut ApiClient, credentials: &Credentials) -> Result<CurrentUser> {
    let response = client
        .send(
            ApiRequest::post("/login")
                .anonymous()
                .json(json!({ "email": credentials.email, "password": credentials.password })),
        )
        .await?;

    let session = match Session::from_set_cookie(&response.set_cookies) {
        Some(session) if response.status == 200 => session,
        _ => {
            return Err(Error::Authentication {
                status: response.status,
                body: response.text.clone(),
            })
        }
    };

    // Owner and admin paths are built from the account id
    let user = identity_from(&response);
    if user.user_account_identity.is_empty() {
        return Err(Error::Authentication {
            status: response.status,
            body: response.text.clone(),
        });
    }

    client.set_session(session);
    info!(
        account = %user.user_account_identity,
        user = %user.user_identity,
        "Logged in as {}",
        credentials.email
    );

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_keeps_name_value_pairs_only() {
        let session = Session::from_set_cookie(&[
            "JSESSIONID=abc123; Path=/; HttpOnly",
            "remember=yes; Max-Age=3600",
        ])
        .unwrap();
        assert_eq!(session.cookie(), "JSESSIONID=abc123; remember=yes");
    }

    #[test]
    fn test_session_is_never_empty() {
        assert!(Session::from_set_cookie::<&str>(&[]).is_none());
        assert!(Session::from_set_cookie(&["; Path=/"]).is_none());
        assert!(Session::from_set_cookie(&["=nameless"]).is_none());
    }

    #[test]
    fn test_identity_from_result_envelope() {
        let resp = ApiResponse::from_parts(
            "POST",
            "/login",
            200,
            Vec::new(),
            br#"{"result":"success","data":{"userAccountIdentity":"acc","userIdentity":"usr","email":"a@b.c","name":"A"}}"#,
        );
        let user = identity_from(&resp);
        assert_eq!(user.user_account_identity, "acc");
        assert_eq!(user.name, "A");
    }

    #[test]
    fn test_identity_from_bare_data_object() {
        let resp = ApiResponse::from_parts(
            "POST",
            "/login",
            200,
            Vec::new(),
            br#"{"data":{"userAccountIdentity":"acc"}}"#,
        );
        assert_eq!(identity_from(&resp).user_account_identity, "acc");
    }
}
