//! HTTP routing onto the handler export table.
//!
//! - `GET /health` - Liveness check
//! - `GET /routes` - Registration output
//! - `ANY /:endpoint` - Dispatch to `"<endpoint>Handler"`

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use lambda_decorator::{HandlerExportTable, InvocationContext, RouteDescriptor};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::adapter;
use crate::config::Config;

/// Shared state of the runtime host.
#[derive(Clone)]
pub struct AppState {
    exports: HandlerExportTable,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(exports: HandlerExportTable, config: Config) -> Self {
        Self {
            exports,
            config: Arc::new(config),
        }
    }
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/routes", get(list_routes))
        .route("/:endpoint", any(dispatch))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Health Endpoints
// =============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
    version: String,
    handlers: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: state.config.service_name.clone(),
        version: state.config.service_version.clone(),
        handlers: state.exports.len(),
    })
}

async fn list_routes(State(state): State<AppState>) -> Json<Vec<RouteDescriptor>> {
    Json(state.exports.routes().to_vec())
}

// =============================================================================
// Dispatch
// =============================================================================

async fn dispatch(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(route) = state.exports.route(&endpoint) else {
        debug!(endpoint = %endpoint, "No handler for endpoint");
        return message(StatusCode::NOT_FOUND, "Not found");
    };

    if !route.http_method.as_str().eq_ignore_ascii_case(method.as_str()) {
        debug!(endpoint = %endpoint, method = %method, expected = %route.http_method, "Method mismatch");
        return message(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let event = match adapter::to_event(&method, &format!("/{endpoint}"), &headers, query, body) {
        Ok(event) => event,
        Err(e) => {
            warn!(endpoint = %endpoint, error = %e, "Rejecting request");
            return message(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    let context = InvocationContext::new(state.config.function_name(&route.handler_export_name));
    match state.exports.invoke(&route.handler_export_name, event, context).await {
        Some(result) => adapter::into_response(result),
        None => message(StatusCode::NOT_FOUND, "Not found"),
    }
}

fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use todo_api::InMemoryStore;
    use tower::ServiceExt;

    fn app() -> Router {
        let exports = todo_api::exports(Arc::new(InMemoryStore::default())).unwrap();
        router(AppState::new(exports, Config::default()))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
        Request::builder().method(method).uri(uri).body(body).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_handlers() {
        let (status, body) = send(app(), request("GET", "/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["handlers"], 3);
    }

    #[tokio::test]
    async fn test_routes_lists_registration_output() {
        let (status, body) = send(app(), request("GET", "/routes", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["handlerExportName"], "createHandler");
        assert_eq!(body.as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn test_dispatch_create_then_get() {
        let app = app();

        let (status, body) = send(
            app.clone(),
            request("POST", "/create", Some(json!({"type": "list", "name": "groceries"}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = send(app, request("GET", "/get?type=list&name=groceries", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["SubCategory"], "groceries");
    }

    #[tokio::test]
    async fn test_query_string_is_decoded() {
        let app = app();
        send(
            app.clone(),
            request("POST", "/create", Some(json!({"type": "list", "name": "weekend plans"}))),
        )
        .await;

        let (status, body) = send(app, request("GET", "/get?type=list&name=weekend%20plans", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["SubCategory"], "weekend plans");
    }

    #[tokio::test]
    async fn test_first_unknown_query_key_is_reported() {
        let (status, body) = send(app(), request("GET", "/get?type=root&zeta=1&alpha=2", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"message": "Unknown parameter 'zeta'"}));
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_404() {
        let (status, body) = send(app(), request("GET", "/update", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"message": "Not found"}));
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let (status, body) = send(app(), request("PUT", "/create", None)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"message": "Method not allowed"}));
    }

    #[tokio::test]
    async fn test_handler_errors_pass_through() {
        let (status, body) = send(
            app(),
            request("DELETE", "/delete", Some(json!({"type": "list", "listName": "x", "item": "y"}))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errorCode"], "list_not_found");
    }
}
