//! Response assertions
//!
//! Each check returns the response again so checks chain with `?`:
//!
//! ```ignore
//! resp.expect_status(200)?.expect_shape(Shape::Array)?;
//! ```
//!
//! Failures become [`Error::Assertion`] carrying the request, the expected
//! value and the literal observed value.

use serde_json::Value;

use crate::api::{ApiResponse, ResultTag, Shape};
use crate::common::{Error, Result};

/// Assertion helpers on a received response
pub trait ResponseExpect {
    /// Status equals `expected`
    fn expect_status(&self, expected: u16) -> Result<&Self>;
    /// Status is one of `allowed`
    fn expect_status_in(&self, allowed: &[u16]) -> Result<&Self>;
    /// Body decoded to the given envelope shape
    fn expect_shape(&self, shape: Shape) -> Result<&Self>;
    /// Result envelope with the given tag
    fn expect_result(&self, tag: ResultTag) -> Result<&Self>;
    /// Value at `pointer` equals `expected`
    fn expect_field(&self, pointer: &str, expected: &Value) -> Result<&Self>;
    /// Value at `pointer` exists and is not null/empty
    fn expect_non_empty(&self, pointer: &str) -> Result<&Self>;
    /// Value at `pointer` exists and is not null
    fn expect_not_null(&self, pointer: &str) -> Result<&Self>;
}

/// True for null, "", [] and {}
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn allowed_list(allowed: &[u16]) -> String {
    allowed
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ResponseExpect for ApiResponse {
    fn expect_status(&self, expected: u16) -> Result<&Self> {
        if self.status != expected {
            return Err(Error::assertion(format!(
                "{}: expected status {}, got {}. Body: {}",
                self.describe(),
                expected,
                self.status,
                self.body_excerpt()
            )));
        }
        Ok(self)
    }

    fn expect_status_in(&self, allowed: &[u16]) -> Result<&Self> {
        if !allowed.contains(&self.status) {
            return Err(Error::assertion(format!(
                "{}: expected status one of [{}], got {}. Body: {}",
                self.describe(),
                allowed_list(allowed),
                self.status,
                self.body_excerpt()
            )));
        }
        Ok(self)
    }

    fn expect_shape(&self, shape: Shape) -> Result<&Self> {
        let actual = self.envelope.shape();
        if actual != shape {
            return Err(Error::assertion(format!(
                "{}: expected {} body, got {}. Body: {}",
                self.describe(),
                shape,
                actual,
                self.body_excerpt()
            )));
        }
        Ok(self)
    }

    fn expect_result(&self, tag: ResultTag) -> Result<&Self> {
        match self.envelope.result() {
            Some(actual) if *actual == tag => Ok(self),
            Some(actual) => Err(Error::assertion(format!(
                "{}: expected result '{}', got '{}'",
                self.describe(),
                tag,
                actual
            ))),
            None => Err(Error::assertion(format!(
                "{}: expected result '{}', body has no result tag. Body: {}",
                self.describe(),
                tag,
                self.body_excerpt()
            ))),
        }
    }

    fn expect_field(&self, pointer: &str, expected: &Value) -> Result<&Self> {
        match self.pointer(pointer) {
            Some(actual) if actual == expected => Ok(self),
            Some(actual) => Err(Error::assertion(format!(
                "{}: expected {} to equal {}, got {}",
                self.describe(),
                pointer,
                expected,
                actual
            ))),
            None => Err(Error::assertion(format!(
                "{}: expected {} to equal {}, field is missing",
                self.describe(),
                pointer,
                expected
            ))),
        }
    }

    fn expect_non_empty(&self, pointer: &str) -> Result<&Self> {
        match self.pointer(pointer) {
            Some(value) if !is_empty_value(value) => Ok(self),
            Some(value) => Err(Error::assertion(format!(
                "{}: expected {} not to be empty, got {}",
                self.describe(),
                pointer,
                value
            ))),
            None => Err(Error::assertion(format!(
                "{}: expected {} not to be empty, field is missing",
                self.describe(),
                pointer
            ))),
        }
    }

    fn expect_not_null(&self, pointer: &str) -> Result<&Self> {
        match self.pointer(pointer) {
            Some(Value::Null) | None => Err(Error::assertion(format!(
                "{}: expected {} not to be null",
                self.describe(),
                pointer
            ))),
            Some(_) => Ok(self),
        }
    }
}

/// Fail with `message` unless `condition` holds
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Assertion(message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resp(status: u16, body: &str) -> ApiResponse {
        ApiResponse::from_parts("GET", "/owner/booth/b1", status, Vec::new(), body.as_bytes())
    }

    #[test]
    fn test_status_mismatch_reports_literal_values() {
        let err = resp(500, "boom").expect_status(200).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("GET /owner/booth/b1"));
        assert!(msg.contains("expected status 200, got 500"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_status_set_membership() {
        assert!(resp(200, "").expect_status_in(&[200, 404]).is_ok());
        assert!(resp(404, "").expect_status_in(&[200, 404]).is_ok());
        let err = resp(201, "").expect_status_in(&[200, 404]).unwrap_err();
        assert!(err.to_string().contains("one of [200, 404], got 201"));
    }

    #[test]
    fn test_chained_checks() {
        let r = resp(200, r#"{"key":"b1","name":"Booth"}"#);
        r.expect_status(200)
            .and_then(|r| r.expect_shape(Shape::Object))
            .and_then(|r| r.expect_field("/key", &json!("b1")))
            .and_then(|r| r.expect_non_empty("/name"))
            .unwrap();
    }

    #[test]
    fn test_field_mismatch_and_missing() {
        let r = resp(200, r#"{"data":{"sendButtonText":"Go"}}"#);
        let err = r
            .expect_field("/data/sendButtonText", &json!("Send"))
            .unwrap_err();
        assert!(err.to_string().contains(r#"to equal "Send", got "Go""#));
        assert!(r.expect_field("/data/missing", &json!(1)).is_err());
    }

    #[test]
    fn test_non_empty_and_not_null() {
        let r = resp(200, r#"{"result":"success","data":{},"list":[1],"nil":null}"#);
        assert!(r.expect_non_empty("/data").is_err());
        assert!(r.expect_non_empty("/list").is_ok());
        assert!(r.expect_not_null("/data").is_ok());
        assert!(r.expect_not_null("/nil").is_err());
        assert!(r.expect_not_null("/absent").is_err());
    }

    #[test]
    fn test_result_tag() {
        let r = resp(200, r#"{"result":"failed"}"#);
        assert!(r.expect_result(ResultTag::Failed).is_ok());
        assert!(r.expect_result(ResultTag::Success).is_err());
        assert!(resp(200, "[]").expect_result(ResultTag::Success).is_err());
    }

    #[test]
    fn test_ensure() {
        assert!(ensure(true, || "never".to_string()).is_ok());
        let err = ensure(false, || "dummy user not listed".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "Assertion failed: dummy user not listed");
    }
}
