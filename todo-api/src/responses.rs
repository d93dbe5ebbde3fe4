//! Domain error codes and their wire shape.

use http::StatusCode;
use lambda_decorator::{HandlerError, LambdaError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure reported to clients as `{"errorCode", "message"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MissingParameter,
    ListExists,
    ListNotFound,
    DatabaseUnreachable,
    InvalidParameter,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingParameter => "missing_parameter",
            Self::ListExists => "list_exists",
            Self::ListNotFound => "list_not_found",
            Self::DatabaseUnreachable => "database_unreachable",
            Self::InvalidParameter => "invalid_parameter",
        }
    }

    /// Client-facing message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingParameter => "Missing parameter detected",
            Self::ListExists => "This list already exists",
            Self::ListNotFound => "This list couldn't be found",
            Self::DatabaseUnreachable => "Couldn't reach the database",
            Self::InvalidParameter => "A parameter has an invalid value",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::ListNotFound => StatusCode::NOT_FOUND,
            Self::DatabaseUnreachable => StatusCode::FAILED_DEPENDENCY,
            Self::MissingParameter | Self::ListExists | Self::InvalidParameter => StatusCode::BAD_REQUEST,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error_code: *self,
            message: self.message().to_string(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_code: ErrorCode,
    pub message: String,
}

impl From<ErrorCode> for LambdaError {
    fn from(code: ErrorCode) -> Self {
        let body = serde_json::to_value(code.body()).unwrap_or_default();
        LambdaError::new(code.status(), body).with_message(code.message())
    }
}

impl From<ErrorCode> for HandlerError {
    fn from(code: ErrorCode) -> Self {
        HandlerError::Lambda(code.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_wire_shape() {
        let error = LambdaError::from(ErrorCode::ListNotFound);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = serde_json::from_str(error.body()).unwrap();
        assert_eq!(
            body,
            json!({"errorCode": "list_not_found", "message": "This list couldn't be found"})
        );
    }

    #[test]
    fn test_error_code_statuses() {
        assert_eq!(ErrorCode::DatabaseUnreachable.status().as_u16(), 424);
        assert_eq!(ErrorCode::ListExists.status().as_u16(), 400);
        assert_eq!(ErrorCode::InvalidParameter.to_string(), "invalid_parameter");
    }
}
