//! Endpoint Descriptors
//!
//! The HTTP binding recorded for a handler method: resource path, verb and the
//! headers attached to every response it produces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

/// Suffix appended to an endpoint path to form its handler export name.
pub const HANDLER_SUFFIX: &str = "Handler";

/// Headers sent when an endpoint does not override them.
pub fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ])
}

/// HTTP method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Trace,
    Connect,
}

impl HttpMethod {
    /// Upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
            Self::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HttpMethod {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH" => Ok(Self::Patch),
            "TRACE" => Ok(Self::Trace),
            "CONNECT" => Ok(Self::Connect),
            other => Err(format!("unknown HTTP method: {other}")),
        }
    }
}

/// One HTTP binding for a handler method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    /// Resource segment, e.g. `create`
    #[validate(length(min = 1, max = 128), custom(function = "validate_resource_segment"))]
    pub path: String,

    /// HTTP verb
    pub http_method: HttpMethod,

    /// Headers attached to every response of this endpoint
    pub response_headers: BTreeMap<String, String>,
}

impl EndpointDescriptor {
    /// Create a descriptor with the default response headers.
    pub fn new(path: impl Into<String>, http_method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            http_method,
            response_headers: default_headers(),
        }
    }

    /// Replace the response headers.
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.response_headers = headers;
        self
    }

    /// Name under which the bound handler is exported.
    pub fn export_name(&self) -> String {
        format!("{}{}", self.path, HANDLER_SUFFIX)
    }
}

fn validate_resource_segment(path: &str) -> Result<(), validator::ValidationError> {
    let valid = path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        let mut error = validator::ValidationError::new("resource_segment");
        error.message = Some("must be a single path segment of [A-Za-z0-9_-]".into());
        Err(error)
    }
}
