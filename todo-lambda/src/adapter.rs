//! HTTP ⇄ transport conversion.

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use lambda_decorator::{ProxyEvent, ProxyResponse, QueryParameters};
use thiserror::Error;
use tracing::warn;

/// Request conversion errors.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Request body must be valid UTF-8")]
    BodyEncoding,
}

/// Build a transport event from an HTTP request.
///
/// Headers that are not visible ASCII are dropped. Query parameters keep the
/// order they were sent in; a repeated name keeps its first position and its
/// last value. An empty body or query string maps to `None`.
pub fn to_event(
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    query: Vec<(String, String)>,
    body: Bytes,
) -> Result<ProxyEvent, AdapterError> {
    let mut event = ProxyEvent::new(method.as_str(), path);

    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            event.headers.insert(name.as_str().to_string(), value.to_string());
        }
    }

    if !query.is_empty() {
        event.query_string_parameters = Some(query.into_iter().collect::<QueryParameters>());
    }

    if !body.is_empty() {
        let body = String::from_utf8(body.to_vec()).map_err(|_| AdapterError::BodyEncoding)?;
        event.body = Some(body);
    }

    Ok(event)
}

/// Render a transport result as an HTTP response.
pub fn into_response(result: ProxyResponse) -> Response {
    let status = StatusCode::from_u16(result.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut headers = HeaderMap::new();
    for (name, value) in &result.headers {
        match (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "Dropping invalid response header"),
        }
    }

    (status, headers, Body::from(result.body)).into_response()
}
