use axum::{extract::State, response::Response};

use super::{respond, AppState};
use crate::dto::{MedianAgeResponse, MedianSalaryResponse};

pub async fn median_age(State(state): State<AppState>) -> Response {
    respond(
        state
            .repository
            .median_age()
            .await
            .map(|median_age| MedianAgeResponse { median_age }),
    )
}

pub async fn median_salary(State(state): State<AppState>) -> Response {
    respond(
        state
            .repository
            .median_salary()
            .await
            .map(|median_salary| MedianSalaryResponse { median_salary }),
    )
}
