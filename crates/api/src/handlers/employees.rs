use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    response::Response,
    Json,
};
use db::{ServiceError, ServiceResult};

use super::{respond, AppState};
use crate::dto::{CreateEmployeeDto, CreatedResponse, StatusResponse};

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateEmployeeDto>, JsonRejection>,
) -> Response {
    respond(create_employee(&state, payload).await)
}

async fn create_employee(
    state: &AppState,
    payload: Result<Json<CreateEmployeeDto>, JsonRejection>,
) -> ServiceResult<CreatedResponse> {
    // Wrong JSON shape or field types never reach the repository.
    let Json(dto) = payload.map_err(|rejection| ServiceError::validation(rejection.body_text()))?;
    let employee = dto.validate()?;
    let employee_id = state.repository.add(&employee).await?;

    Ok(CreatedResponse {
        status: "success".into(),
        message: format!("Employee added successfully with id {employee_id}"),
        employee_id,
    })
}

pub async fn list(State(state): State<AppState>) -> Response {
    respond(state.repository.list().await)
}

pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    respond(delete_employee(&state, id).await)
}

async fn delete_employee(
    state: &AppState,
    id: Result<Path<i64>, PathRejection>,
) -> ServiceResult<StatusResponse> {
    let Path(employee_id) = id.map_err(|rejection| ServiceError::validation(rejection.body_text()))?;
    state.repository.delete_by_id(employee_id).await?;

    Ok(StatusResponse {
        status: "deleted".into(),
        message: format!("Employee {employee_id} deleted"),
    })
}
