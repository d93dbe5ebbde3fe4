//! Transport Types
//!
//! The request/response shapes exchanged with the external transport adapter.
//! The framework never assumes a specific transport; any host that can build a
//! [`ProxyEvent`] and consume a [`ProxyResponse`] can dispatch to the handlers.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Decoded query string, in the order the parameters were sent.
pub type QueryParameters = IndexMap<String, String>;

/// Inbound transport event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    /// Request path as seen by the transport
    pub path: String,

    /// HTTP verb of the request
    pub http_method: String,

    /// Request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Raw request body
    #[serde(default)]
    pub body: Option<String>,

    /// Decoded query string
    #[serde(default)]
    pub query_string_parameters: Option<QueryParameters>,
}

impl ProxyEvent {
    /// Create an event for `method` on `path` with no headers, body or query.
    pub fn new(http_method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            http_method: http_method.into(),
            ..Default::default()
        }
    }

    /// Attach a raw body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach a JSON body.
    pub fn with_json(self, body: &serde_json::Value) -> Self {
        self.with_body(body.to_string())
    }

    /// Add a query string parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .get_or_insert_with(QueryParameters::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add a request header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Outbound transport result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    /// HTTP status code
    pub status_code: u16,

    /// Response headers
    pub headers: BTreeMap<String, String>,

    /// Serialized response body
    pub body: String,
}

impl ProxyResponse {
    /// Create a response.
    pub fn new(status_code: u16, headers: BTreeMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            status_code,
            headers,
            body: body.into(),
        }
    }

    /// Parse the body as JSON.
    pub fn json_body(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

/// Per-invocation context supplied by the runtime host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationContext {
    /// Request ID for correlation
    pub request_id: Uuid,

    /// Name of the function being invoked
    pub function_name: String,

    /// When the host received the request
    pub received_at: DateTime<Utc>,
}

impl InvocationContext {
    /// Create a context with a fresh request ID.
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            function_name: function_name.into(),
            received_at: Utc::now(),
        }
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new("local")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_deserializes_from_camel_case() {
        let event: ProxyEvent = serde_json::from_value(json!({
            "path": "/get",
            "httpMethod": "GET",
            "headers": {"Accept": "application/json"},
            "body": null,
            "queryStringParameters": {"type": "root"}
        }))
        .unwrap();

        assert_eq!(event.http_method, "GET");
        assert_eq!(event.body, None);
        assert_eq!(
            event.query_string_parameters.unwrap().get("type").map(String::as_str),
            Some("root")
        );
    }

    #[test]
    fn test_query_parameters_keep_sent_order() {
        let event: ProxyEvent = serde_json::from_str(
            r#"{"path": "/get", "httpMethod": "GET", "queryStringParameters": {"zeta": "1", "alpha": "2"}}"#,
        )
        .unwrap();

        let keys: Vec<&str> = event
            .query_string_parameters
            .iter()
            .flatten()
            .map(|(key, _)| key.as_str())
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);

        let event = ProxyEvent::new("GET", "/get").with_query("type", "root").with_query("page", "2");
        let value = serde_json::to_string(&event.query_string_parameters).unwrap();
        assert_eq!(value, r#"{"type":"root","page":"2"}"#);
    }

    #[test]
    fn test_event_defaults_missing_optional_fields() {
        let event: ProxyEvent =
            serde_json::from_value(json!({"path": "/create", "httpMethod": "POST"})).unwrap();

        assert!(event.headers.is_empty());
        assert!(event.query_string_parameters.is_none());
    }

    #[test]
    fn test_response_serializes_status_code_camel_case() {
        let response = ProxyResponse::new(200, BTreeMap::new(), "{}");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["statusCode"], 200);
    }
}
