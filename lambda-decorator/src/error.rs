//! Error Model
//!
//! [`LambdaError`] is the structured failure that becomes an HTTP response: a
//! status code plus a body that is already in wire form. It is returned from
//! business methods and validation layers alike and rendered by the outermost
//! envelope without knowing the body's original shape.
//!
//! [`ErrorKind`] names the constructor a method uses for the errors the
//! framework raises on its behalf (validation failures, guard failures), so an
//! endpoint can switch between plain and JSON error bodies.

use http::StatusCode;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// A failure carrying its own HTTP status and response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LambdaError {
    status_code: StatusCode,
    body: String,
    message: String,
}

impl LambdaError {
    /// Create an error. String bodies are kept verbatim, any other JSON value
    /// is encoded immediately.
    pub fn new(status_code: StatusCode, body: impl Into<Value>) -> Self {
        let body = match body.into() {
            Value::String(text) => text,
            other => other.to_string(),
        };

        Self {
            status_code,
            body,
            message: format!("An error {} occurred", status_code.as_u16()),
        }
    }

    /// Create an error whose body is always a JSON object: a plain string
    /// becomes `{"message": <string>}`.
    pub fn json(status_code: StatusCode, body: impl Into<Value>) -> Self {
        let body = match body.into() {
            Value::String(message) => json!({ "message": message }),
            other => other,
        };
        Self::new(status_code, body)
    }

    /// Create an error from a numeric status. Codes that are not a defined
    /// HTTP status (no canonical reason phrase) fall back to 500.
    pub fn from_code(status_code: u16, body: impl Into<Value>) -> Self {
        let status = StatusCode::from_u16(status_code)
            .ok()
            .filter(|status| status.canonical_reason().is_some())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, body)
    }

    /// Replace the diagnostic message. The message is never sent to clients.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// HTTP status of the response.
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// Wire body of the response.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Diagnostic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Signature shared by every error constructor.
pub type ErrorConstructor = fn(StatusCode, Value) -> LambdaError;

fn plain(status_code: StatusCode, body: Value) -> LambdaError {
    LambdaError::new(status_code, body)
}

fn json_object(status_code: StatusCode, body: Value) -> LambdaError {
    LambdaError::json(status_code, body)
}

/// A named error constructor that can be recorded per endpoint.
#[derive(Clone, Copy)]
pub struct ErrorKind {
    name: &'static str,
    construct: ErrorConstructor,
}

impl ErrorKind {
    /// Bodies are sent as given.
    pub const PLAIN: Self = Self {
        name: "plain",
        construct: plain,
    };

    /// String bodies are wrapped as `{"message": ...}`.
    pub const JSON: Self = Self {
        name: "json",
        construct: json_object,
    };

    /// A user supplied constructor.
    pub const fn custom(name: &'static str, construct: ErrorConstructor) -> Self {
        Self { name, construct }
    }

    /// Name used in logs and metadata dumps.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build an error of this kind.
    pub fn build(&self, status_code: StatusCode, body: impl Into<Value>) -> LambdaError {
        (self.construct)(status_code, body.into())
    }
}

impl Default for ErrorKind {
    fn default() -> Self {
        Self::PLAIN
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorKind").field(&self.name).finish()
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.construct as usize == other.construct as usize
    }
}

impl Eq for ErrorKind {}

/// Error type flowing through every layer of a handler chain.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A declared failure, rendered with its own status and body.
    #[error(transparent)]
    Lambda(#[from] LambdaError),

    /// Anything else. Rendered as an opaque 500.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl HandlerError {
    /// Wrap an arbitrary error as unexpected.
    pub fn unexpected<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unexpected(anyhow::Error::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_body_is_kept_verbatim() {
        let error = LambdaError::new(StatusCode::BAD_REQUEST, "Validation failed");
        assert_eq!(error.body(), "Validation failed");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_structured_body_is_json_encoded() {
        let error = LambdaError::new(
            StatusCode::NOT_FOUND,
            json!({"errorCode": "list_not_found", "message": "This list couldn't be found"}),
        );
        let parsed: Value = serde_json::from_str(error.body()).unwrap();
        assert_eq!(parsed["errorCode"], "list_not_found");
    }

    #[test]
    fn test_json_variant_wraps_plain_strings() {
        let error = LambdaError::json(StatusCode::BAD_REQUEST, "Unknown parameter 'bogus'");
        let parsed: Value = serde_json::from_str(error.body()).unwrap();
        assert_eq!(parsed, json!({"message": "Unknown parameter 'bogus'"}));
    }

    #[test]
    fn test_json_variant_keeps_objects() {
        let error = LambdaError::json(StatusCode::CONFLICT, json!({"message": "exists", "errorCode": "x"}));
        let parsed: Value = serde_json::from_str(error.body()).unwrap();
        assert_eq!(parsed["errorCode"], "x");
    }

    #[test]
    fn test_from_code_falls_back_to_500() {
        assert_eq!(LambdaError::from_code(424, "x").status_code().as_u16(), 424);
        assert_eq!(LambdaError::from_code(418, "x").status_code().as_u16(), 418);
        assert_eq!(LambdaError::from_code(42, "x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(LambdaError::from_code(299, "x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(LambdaError::from_code(999, "x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_default_message_mentions_status() {
        let error = LambdaError::new(StatusCode::NOT_FOUND, "gone");
        assert_eq!(error.to_string(), "An error 404 occurred");
        assert_eq!(error.with_message("custom").to_string(), "custom");
    }

    #[test]
    fn test_error_kind_builds_matching_variant() {
        let plain = ErrorKind::PLAIN.build(StatusCode::BAD_REQUEST, "nope");
        let json = ErrorKind::JSON.build(StatusCode::BAD_REQUEST, "nope");

        assert_eq!(plain.body(), "nope");
        assert_eq!(json.body(), r#"{"message":"nope"}"#);
        assert_eq!(ErrorKind::default(), ErrorKind::PLAIN);
        assert_ne!(ErrorKind::PLAIN, ErrorKind::JSON);
    }

    #[test]
    fn test_error_kinds_sharing_a_name_differ_by_constructor() {
        fn teapot(_: StatusCode, body: Value) -> LambdaError {
            LambdaError::new(StatusCode::IM_A_TEAPOT, body)
        }

        let impostor = ErrorKind::custom("json", teapot);
        assert_eq!(impostor.name(), ErrorKind::JSON.name());
        assert_ne!(impostor, ErrorKind::JSON);
        assert_eq!(ErrorKind::JSON, ErrorKind::JSON);
        assert_eq!(ErrorKind::custom("teapot", teapot), ErrorKind::custom("teapot", teapot));
    }
}
