//! Integration Tests for the Todo API
//!
//! Drives the exported handlers with transport events, the way the runtime
//! host does.

use serde_json::{json, Value};
use std::sync::Arc;

use lambda_decorator::{HandlerExportTable, HttpMethod, InvocationContext, ProxyEvent, ProxyResponse};
use todo_api::{exports, InMemoryStore};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn table() -> HandlerExportTable {
    exports(Arc::new(InMemoryStore::new("integration-table"))).expect("todo exports should build")
}

async fn invoke(table: &HandlerExportTable, name: &str, event: ProxyEvent) -> ProxyResponse {
    table
        .invoke(name, event, InvocationContext::new("todo-api-tests"))
        .await
        .expect("handler should be exported")
}

async fn create(table: &HandlerExportTable, body: Value) -> ProxyResponse {
    invoke(table, "createHandler", ProxyEvent::new("POST", "/create").with_json(&body)).await
}

fn error_code(response: &ProxyResponse) -> String {
    response.json_body().unwrap()["errorCode"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// REGISTRATION TESTS
// ============================================================================

#[test]
fn test_exports_three_handlers() {
    let table = table();

    assert_eq!(
        table.names().collect::<Vec<_>>(),
        vec!["createHandler", "deleteHandler", "getHandler"]
    );
    assert_eq!(table.route("create").unwrap().http_method, HttpMethod::Post);
    assert_eq!(table.route("get").unwrap().http_method, HttpMethod::Get);
    assert_eq!(table.route("delete").unwrap().http_method, HttpMethod::Delete);
}

// ============================================================================
// CREATE TESTS
// ============================================================================

#[tokio::test]
async fn test_create_list_and_read_root() {
    let table = table();

    let response = create(&table, json!({"type": "list", "name": "groceries"})).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.json_body().unwrap(),
        json!({"success": true, "message": "Successfully created list"})
    );

    let response = invoke(&table, "getHandler", ProxyEvent::new("GET", "/get").with_query("type", "root")).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.json_body().unwrap(),
        json!({"Category": "ROOT", "SubCategory": "ROOT", "lists": ["groceries"]})
    );
}

#[tokio::test]
async fn test_create_list_twice_fails() {
    let table = table();
    create(&table, json!({"type": "list", "name": "chores"})).await;

    let response = create(&table, json!({"type": "list", "name": "chores"})).await;
    assert_eq!(response.status_code, 400);
    assert_eq!(error_code(&response), "list_exists");
}

#[tokio::test]
async fn test_item_for_missing_list_fails() {
    let table = table();

    let response = create(&table, json!({"type": "item", "listName": "nope", "item": "milk"})).await;
    assert_eq!(response.status_code, 404);
    assert_eq!(
        response.json_body().unwrap(),
        json!({"errorCode": "list_not_found", "message": "This list couldn't be found"})
    );
}

#[tokio::test]
async fn test_create_guards_reject_inconsistent_requests() {
    let table = table();

    for body in [
        json!({"type": "folder", "name": "x"}),
        json!({"type": "list"}),
        json!({"type": "item", "listName": "groceries"}),
    ] {
        let response = create(&table, body).await;
        assert_eq!(response.status_code, 400);
        assert_eq!(error_code(&response), "invalid_parameter");
    }
}

#[tokio::test]
async fn test_create_validation_errors_are_json() {
    let table = table();

    let response = create(&table, json!({"type": "list", "name": 3})).await;
    assert_eq!(response.status_code, 400);
    assert_eq!(
        response.json_body().unwrap(),
        json!({"message": "Parameter 'name' is not valid"})
    );

    let response = create(&table, json!({"name": "x"})).await;
    assert_eq!(response.json_body().unwrap(), json!({"message": "Missing parameters [type]"}));
}

// ============================================================================
// GET TESTS
// ============================================================================

#[tokio::test]
async fn test_get_list_by_name() {
    let table = table();
    create(&table, json!({"type": "list", "name": "groceries"})).await;
    create(&table, json!({"type": "item", "listName": "groceries", "item": "eggs"})).await;

    let event = ProxyEvent::new("GET", "/get")
        .with_query("type", "list")
        .with_query("name", "groceries");
    let response = invoke(&table, "getHandler", event).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.json_body().unwrap(),
        json!({"Category": "LIST", "SubCategory": "groceries", "items": ["eggs"]})
    );
}

#[tokio::test]
async fn test_get_list_without_name_is_invalid() {
    let table = table();
    let response = invoke(&table, "getHandler", ProxyEvent::new("GET", "/get").with_query("type", "list")).await;

    assert_eq!(response.status_code, 400);
    assert_eq!(error_code(&response), "invalid_parameter");
}

#[tokio::test]
async fn test_get_unknown_list_is_not_found() {
    let table = table();
    let event = ProxyEvent::new("GET", "/get")
        .with_query("type", "list")
        .with_query("name", "ghost");
    let response = invoke(&table, "getHandler", event).await;

    assert_eq!(response.status_code, 404);
}

// ============================================================================
// DELETE TESTS
// ============================================================================

#[tokio::test]
async fn test_delete_item() {
    let table = table();
    create(&table, json!({"type": "list", "name": "chores"})).await;
    create(&table, json!({"type": "item", "listName": "chores", "item": "dishes"})).await;
    create(&table, json!({"type": "item", "listName": "chores", "item": "laundry"})).await;

    let event = ProxyEvent::new("DELETE", "/delete")
        .with_json(&json!({"type": "list", "listName": "chores", "item": "dishes"}));
    let response = invoke(&table, "deleteHandler", event).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.json_body().unwrap()["items"], json!(["laundry"]));
}

#[tokio::test]
async fn test_delete_requires_all_fields() {
    let table = table();
    let event = ProxyEvent::new("DELETE", "/delete").with_json(&json!({"type": "list"}));
    let response = invoke(&table, "deleteHandler", event).await;

    assert_eq!(response.status_code, 400);
    assert_eq!(
        response.json_body().unwrap(),
        json!({"message": "Missing parameters [listName, item]"})
    );
}
