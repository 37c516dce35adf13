use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use db::{EmployeeRepository, ServiceResult};
use serde::Serialize;
use serde_json::{json, Value};

use crate::dto::ErrorResponse;

pub mod employees;
pub mod stats;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<EmployeeRepository>,
}

impl AppState {
    pub fn new(repository: Arc<EmployeeRepository>) -> Self {
        Self { repository }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Success and failure both answer 200; the payload tells them apart.
pub(crate) fn respond<T: Serialize>(result: ServiceResult<T>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => Json(ErrorResponse::from(err)).into_response(),
    }
}
