//! HTTP client for the booth API
//!
//! Wraps one `reqwest::Client` and the session cookie. Every request is
//! awaited to completion before the caller continues.

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::common::{truncate_body, Error, Result};

use super::form::FormData;
use super::protocol::Envelope;
use super::session::Session;

/// Body of an outgoing request
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    None,
    Json(Value),
    Form(FormData),
}

/// A request to send through [`ApiClient::send`]
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
    /// Attach the session cookie (default)
    pub authenticated: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::None,
            authenticated: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form(mut self, form: FormData) -> Self {
        self.body = RequestBody::Form(form);
        self
    }

    /// Send without the session cookie
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// A fully read response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub method: String,
    pub path: String,
    pub status: u16,
    /// Raw `Set-Cookie` header values
    pub set_cookies: Vec<String>,
    /// Body parsed as JSON, `Null` when it is not JSON
    pub json: Value,
    pub envelope: Envelope,
    pub text: String,
}

impl ApiResponse {
    pub fn from_parts(
        method: &str,
        path: &str,
        status: u16,
        set_cookies: Vec<String>,
        body: &[u8],
    ) -> Self {
        let json = serde_json::from_slice(body).unwrap_or(Value::Null);
        Self {
            method: method.to_string(),
            path: path.to_string(),
            status,
            set_cookies,
            envelope: Envelope::decode(body),
            json,
            text: String::from_utf8_lossy(body).into_owned(),
        }
    }

    /// Status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// "METHOD /path", used as the prefix of assertion messages
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Look up a JSON pointer in the raw body
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.json.pointer(pointer)
    }

    /// Look up a JSON pointer and read it as a non-empty string
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.pointer(pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Body shortened for error messages
    pub fn body_excerpt(&self) -> String {
        truncate_body(&self.text, 200)
    }
}

/// Client for the remote booth API
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<Session>,
}

impl ApiClient {
    /// Create a client for `base_url`
    ///
    /// The URL must be absolute http(s); its path is kept as a prefix for
    /// every request path.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let parsed = url::Url::parse(base_url).map_err(|e| Error::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let http = reqwest::Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Send a request and read the whole body
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let method = request.method.as_str().to_string();
        let mut builder = self.http.request(request.method.clone(), self.url(&request.path));

        if request.authenticated {
            let session = self.session.as_ref().ok_or(Error::SessionMissing)?;
            builder = builder.header(COOKIE, session.cookie());
        }

        builder = match &request.body {
            RequestBody::None => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Form(form) => builder.multipart(form.to_multipart()?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| Error::http(&method, &request.path, e))?;

        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::http(&method, &request.path, e))?;

        debug!(
            method = %method,
            path = %request.path,
            status,
            bytes = body.len(),
            "request completed"
        );

        Ok(ApiResponse::from_parts(
            &method,
            &request.path,
            status,
            set_cookies,
            &body,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_relative_and_non_http_urls() {
        assert!(matches!(
            ApiClient::new("localhost:8080", Duration::from_secs(1)),
            Err(Error::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            ApiClient::new("ftp://example.com/api", Duration::from_secs(1)),
            Err(Error::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = ApiClient::new(
            "http://localhost:8080/bihotpoint/services/api/",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.url("/owner/account"),
            "http://localhost:8080/bihotpoint/services/api/owner/account"
        );
        assert_eq!(
            client.url("login"),
            "http://localhost:8080/bihotpoint/services/api/login"
        );
    }

    #[tokio::test]
    async fn test_authenticated_request_without_session_fails_before_network() {
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client.send(ApiRequest::get("/owner/account")).await.unwrap_err();
        assert!(matches!(err, Error::SessionMissing));
    }

    #[test]
    fn test_response_helpers() {
        let resp = ApiResponse::from_parts(
            "POST",
            "/admin/booth",
            201,
            Vec::new(),
            br#"{"key":"b-1","name":"Test Booth","empty":""}"#,
        );
        assert!(resp.is_success());
        assert_eq!(resp.describe(), "POST /admin/booth");
        assert_eq!(resp.str_at("/key"), Some("b-1"));
        assert_eq!(resp.str_at("/empty"), None);
        assert_eq!(resp.str_at("/missing"), None);
    }
}
