//! Employee record types.
//!
//! Rows map 1-to-1 onto the warehouse table
//! `employee_id INT64, name STRING, age INT64, salary FLOAT64`.

use serde::{Deserialize, Serialize};
use warehouse::{Row, Value, WarehouseError};

/// A persisted employee row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Server-assigned surrogate key; never supplied by a client.
    pub employee_id: i64,
    pub name: String,
    pub age: i64,
    pub salary: f64,
}

/// The create payload.  Carries no identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub age: i64,
    pub salary: f64,
}

impl NewEmployee {
    pub fn new(name: impl Into<String>, age: i64, salary: f64) -> Self {
        Self {
            name: name.into(),
            age,
            salary,
        }
    }
}

impl EmployeeRecord {
    /// Decode a result row.  Every column is required and non-NULL.
    pub fn from_row(row: &Row) -> Result<Self, WarehouseError> {
        Ok(Self {
            employee_id: required(row.get_i64("employee_id")?, "employee_id")?,
            name: required(row.get_string("name")?, "name")?,
            age: required(row.get_i64("age")?, "age")?,
            salary: required(row.get_f64("salary")?, "salary")?,
        })
    }

    pub fn to_row(&self) -> Row {
        Row::new()
            .with("employee_id", Value::Int64(self.employee_id))
            .with("name", Value::String(self.name.clone()))
            .with("age", Value::Int64(self.age))
            .with("salary", Value::Float64(self.salary))
    }
}

fn required<T>(value: Option<T>, column: &str) -> Result<T, WarehouseError> {
    value.ok_or_else(|| WarehouseError::Decode(format!("column '{column}' is NULL")))
}
