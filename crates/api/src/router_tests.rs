//! Router tests, driven through `tower::ServiceExt::oneshot` against the
//! in-memory warehouse.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use db::{EmployeeRepository, MemoryWarehouse, TableRef};
use serde_json::{json, Value};
use tower::ServiceExt;
use warehouse::WarehouseError;

use crate::{router, AppState};

fn app(warehouse: Arc<MemoryWarehouse>) -> Router {
    let table = TableRef::new("test-project", "hr", "employees").unwrap();
    let repository = Arc::new(EmployeeRepository::open(warehouse, table));
    router(AppState::new(repository))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn create_list_stats_delete_round() {
    let app = app(Arc::new(MemoryWarehouse::new()));

    let (status, body) = call(&app, "POST", "/employee", Some(json!({ "name": "Alice", "age": 30, "salary": 50000.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "success", "message": "Employee added successfully with id 1", "employee_id": 1 })
    );

    let (_, body) = call(&app, "POST", "/employee", Some(json!({ "name": "Bob", "age": 25, "salary": 40000.0 }))).await;
    assert_eq!(body["employee_id"], 2);

    let (_, body) = call(&app, "GET", "/employees", None).await;
    assert_eq!(
        body,
        json!([
            { "employee_id": 1, "name": "Alice", "age": 30, "salary": 50000.0 },
            { "employee_id": 2, "name": "Bob", "age": 25, "salary": 40000.0 },
        ])
    );

    let (_, body) = call(&app, "GET", "/stats/median-salary", None).await;
    let median = body["median_salary"].as_f64().unwrap();
    assert!(median == 40000.0 || median == 50000.0);

    let (status, body) = call(&app, "DELETE", "/employee/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");

    let (_, body) = call(&app, "GET", "/employees", None).await;
    assert_eq!(body, json!([{ "employee_id": 2, "name": "Bob", "age": 25, "salary": 40000.0 }]));
}

#[tokio::test]
async fn empty_table_stats_are_null() {
    let app = app(Arc::new(MemoryWarehouse::new()));

    assert_eq!(call(&app, "GET", "/stats/median-age", None).await.1, json!({ "median_age": null }));
    assert_eq!(call(&app, "GET", "/stats/median-salary", None).await.1, json!({ "median_salary": null }));
    assert_eq!(call(&app, "GET", "/employees", None).await.1, json!([]));
}

#[tokio::test]
async fn wrong_field_type_is_a_validation_error_and_nothing_is_written() {
    let warehouse = Arc::new(MemoryWarehouse::new());
    let app = app(warehouse.clone());

    let (status, body) = call(&app, "POST", "/employee", Some(json!({ "name": "Mallory", "age": "thirty", "salary": 1.0 }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "validation_error");
    assert!(warehouse.rows().is_empty());
    assert!(warehouse.executed().is_empty());
}

#[tokio::test]
async fn out_of_range_age_is_rejected_before_the_warehouse() {
    let warehouse = Arc::new(MemoryWarehouse::new());
    let app = app(warehouse.clone());

    let (_, body) = call(&app, "POST", "/employee", Some(json!({ "name": "Old", "age": 500, "salary": 1.0 }))).await;

    assert_eq!(body["error"], "validation_error");
    assert!(warehouse.executed().is_empty());
}

#[tokio::test]
async fn deleting_an_unknown_id_reports_success() {
    let app = app(Arc::new(MemoryWarehouse::new()));
    let (_, body) = call(&app, "DELETE", "/employee/404", None).await;
    assert_eq!(body["status"], "deleted");
}

#[tokio::test]
async fn non_numeric_id_is_a_validation_error() {
    let app = app(Arc::new(MemoryWarehouse::new()));
    let (status, body) = call(&app, "DELETE", "/employee/abc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn backend_failures_are_payload_encoded() {
    let warehouse = Arc::new(MemoryWarehouse::new());
    warehouse.fail_next(WarehouseError::Unavailable("backendError".into()));
    let app = app(warehouse);

    let (status, body) = call(&app, "GET", "/employees", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "error", "error": "transient_error", "message": "warehouse unavailable: backendError" })
    );
}

#[tokio::test]
async fn missing_table_reports_not_found() {
    let app = app(Arc::new(MemoryWarehouse::without_table()));
    let (_, body) = call(&app, "GET", "/stats/median-age", None).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn health_is_ok() {
    let app = app(Arc::new(MemoryWarehouse::new()));
    assert_eq!(call(&app, "GET", "/health", None).await, (StatusCode::OK, json!({ "status": "ok" })));
}
