//! Response envelopes and identity types
//!
//! The remote API answers in several shapes: most endpoints wrap their
//! payload as `{ result, data }`, a few legacy ones return `{ user }`, and
//! the rest return a bare array or object. Bodies are decoded into
//! [`Envelope`] once, at the boundary, so steps match on a variant instead
//! of probing properties.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The `result` tag of a `{ result, data }` envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultTag {
    Success,
    Failed,
    NotFound,
    Other(String),
}

impl ResultTag {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "success" => ResultTag::Success,
            "failed" | "failure" | "error" => ResultTag::Failed,
            "not found" | "not_found" | "notfound" => ResultTag::NotFound,
            _ => ResultTag::Other(tag.to_string()),
        }
    }
}

impl fmt::Display for ResultTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultTag::Success => write!(f, "success"),
            ResultTag::Failed => write!(f, "failed"),
            ResultTag::NotFound => write!(f, "not found"),
            ResultTag::Other(tag) => write!(f, "{}", tag),
        }
    }
}

/// Observed kind of a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// `{ result: "...", data?: ... }`
    ResultEnvelope,
    /// `{ user: {...} }`
    UserWrapper,
    /// Bare JSON array
    Array,
    /// Any other JSON object
    Object,
    /// Non-JSON or scalar body
    Text,
    /// No body at all
    Empty,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::ResultEnvelope => "result envelope",
            Shape::UserWrapper => "user wrapper",
            Shape::Array => "array",
            Shape::Object => "object",
            Shape::Text => "text",
            Shape::Empty => "empty",
        };
        write!(f, "{}", name)
    }
}

/// A decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Result {
        result: ResultTag,
        data: Option<Value>,
    },
    User {
        user: Value,
    },
    List(Vec<Value>),
    Object(Map<String, Value>),
    Text(String),
    Empty,
}

impl Envelope {
    /// Decode raw body bytes
    pub fn decode(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Envelope::Empty;
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => Envelope::Text(String::from_utf8_lossy(body).into_owned()),
        }
    }

    /// Classify an already parsed JSON value
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Envelope::Empty,
            Value::Array(items) => Envelope::List(items),
            Value::Object(mut map) => {
                if let Some(Value::String(tag)) = map.get("result") {
                    let result = ResultTag::parse(tag);
                    let data = map.remove("data");
                    return Envelope::Result { result, data };
                }
                if matches!(map.get("user"), Some(Value::Object(_))) {
                    if let Some(user) = map.remove("user") {
                        return Envelope::User { user };
                    }
                }
                Envelope::Object(map)
            }
            other => Envelope::Text(other.to_string()),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Envelope::Result { .. } => Shape::ResultEnvelope,
            Envelope::User { .. } => Shape::UserWrapper,
            Envelope::List(_) => Shape::Array,
            Envelope::Object(_) => Shape::Object,
            Envelope::Text(_) => Shape::Text,
            Envelope::Empty => Shape::Empty,
        }
    }

    /// The `result` tag, when the body is a result envelope
    pub fn result(&self) -> Option<&ResultTag> {
        match self {
            Envelope::Result { result, .. } => Some(result),
            _ => None,
        }
    }

    /// The entity carried by the envelope
    ///
    /// `data` for result envelopes, `user` for user wrappers; bare arrays
    /// and objects have no wrapper and yield `None`.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Envelope::Result { data, .. } => data.as_ref(),
            Envelope::User { user } => Some(user),
            _ => None,
        }
    }

    /// Items of a bare array, or of an envelope whose payload is an array
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Envelope::List(items) => Some(items),
            _ => self.payload().and_then(Value::as_array).map(Vec::as_slice),
        }
    }
}

/// Snapshot of the authenticated identity returned by login
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub user_account_identity: String,
    #[serde(default)]
    pub user_identity: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_result_envelope() {
        let env = Envelope::decode(br#"{"result":"success","data":{"id":"t1"}}"#);
        assert_eq!(env.shape(), Shape::ResultEnvelope);
        assert_eq!(env.result(), Some(&ResultTag::Success));
        assert_eq!(env.payload(), Some(&json!({"id": "t1"})));
    }

    #[test]
    fn test_decode_result_without_data() {
        let env = Envelope::decode(br#"{"result":"not found"}"#);
        assert_eq!(env.result(), Some(&ResultTag::NotFound));
        assert_eq!(env.payload(), None);
    }

    #[test]
    fn test_decode_user_wrapper() {
        let env = Envelope::decode(br#"{"user":{"key":"u1"}}"#);
        assert_eq!(env.shape(), Shape::UserWrapper);
        assert_eq!(env.payload().unwrap()["key"], "u1");
    }

    #[test]
    fn test_user_field_that_is_not_an_object_stays_object() {
        let env = Envelope::decode(br#"{"user":"u1","key":"k"}"#);
        assert_eq!(env.shape(), Shape::Object);
    }

    #[test]
    fn test_decode_bare_shapes() {
        assert_eq!(Envelope::decode(b"[1,2]").shape(), Shape::Array);
        assert_eq!(Envelope::decode(br#"{"key":"b1"}"#).shape(), Shape::Object);
        assert_eq!(Envelope::decode(b"OK").shape(), Shape::Text);
        assert_eq!(Envelope::decode(b"  \n").shape(), Shape::Empty);
        assert_eq!(Envelope::decode(b"null").shape(), Shape::Empty);
        assert_eq!(Envelope::decode(b"true").shape(), Shape::Text);
    }

    #[test]
    fn test_items_from_array_or_envelope() {
        let bare = Envelope::decode(br#"[{"key":"a"}]"#);
        assert_eq!(bare.items().unwrap().len(), 1);

        let wrapped = Envelope::decode(br#"{"result":"success","data":[{"id":1},{"id":2}]}"#);
        assert_eq!(wrapped.items().unwrap().len(), 2);

        assert!(Envelope::decode(br#"{"key":"a"}"#).items().is_none());
    }

    #[test]
    fn test_result_tag_parse() {
        assert_eq!(ResultTag::parse("SUCCESS"), ResultTag::Success);
        assert_eq!(ResultTag::parse("failed"), ResultTag::Failed);
        assert_eq!(ResultTag::parse("Not Found"), ResultTag::NotFound);
        assert_eq!(
            ResultTag::parse("duplicate"),
            ResultTag::Other("duplicate".to_string())
        );
    }

    #[test]
    fn test_current_user_tolerates_missing_fields() {
        let user: CurrentUser = serde_json::from_value(json!({
            "userAccountIdentity": "acc-1",
            "userIdentity": "user-1",
            "extra": true
        }))
        .unwrap();
        assert_eq!(user.user_account_identity, "acc-1");
        assert_eq!(user.user_identity, "user-1");
        assert!(user.email.is_empty());
    }
}
