//! Request and response bodies.
//!
//! Every response is HTTP 200; failures are encoded in the payload as
//! `{"status": "error", "error": <kind>, "message": ...}`.

use db::{ErrorKind, NewEmployee, ServiceError};
use serde::{Deserialize, Serialize};

/// Accepted range for `age`.
pub const AGE_RANGE: std::ops::RangeInclusive<i64> = 1..=120;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmployeeDto {
    pub name: String,
    pub age: i64,
    pub salary: f64,
}

impl CreateEmployeeDto {
    /// Domain checks that belong to the caller layer, not the data service.
    pub fn validate(self) -> Result<NewEmployee, ServiceError> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::validation("name must not be empty"));
        }
        if !AGE_RANGE.contains(&self.age) {
            return Err(ServiceError::validation(format!(
                "age must be between {} and {}",
                AGE_RANGE.start(),
                AGE_RANGE.end()
            )));
        }
        if !self.salary.is_finite() || self.salary < 0.0 {
            return Err(ServiceError::validation("salary must be a non-negative number"));
        }
        Ok(NewEmployee::new(self.name, self.age, self.salary))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CreatedResponse {
    pub status: String,
    pub message: String,
    pub employee_id: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub status: String,
    pub error: ErrorKind,
    pub message: String,
}

impl From<ServiceError> for ErrorResponse {
    fn from(err: ServiceError) -> Self {
        Self {
            status: "error".into(),
            error: err.kind,
            message: err.message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MedianAgeResponse {
    pub median_age: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MedianSalaryResponse {
    pub median_salary: Option<f64>,
}
