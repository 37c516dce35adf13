//! Result rows.

use std::collections::BTreeMap;

use crate::{Value, WarehouseError};

/// One result row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for doubles and tests.
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.columns.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Read an `INT64` column.  `Ok(None)` means the column was NULL.
    pub fn get_i64(&self, column: &str) -> Result<Option<i64>, WarehouseError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Int64(v) => Ok(Some(*v)),
            other => Err(type_mismatch(column, "INT64", other)),
        }
    }

    /// Read a `FLOAT64` column.  Integer values are widened.
    pub fn get_f64(&self, column: &str) -> Result<Option<f64>, WarehouseError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Float64(v) => Ok(Some(*v)),
            Value::Int64(v) => Ok(Some(*v as f64)),
            other => Err(type_mismatch(column, "FLOAT64", other)),
        }
    }

    /// Read a `STRING` column.
    pub fn get_string(&self, column: &str) -> Result<Option<String>, WarehouseError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::String(v) => Ok(Some(v.clone())),
            other => Err(type_mismatch(column, "STRING", other)),
        }
    }

    fn require(&self, column: &str) -> Result<&Value, WarehouseError> {
        self.columns
            .get(column)
            .ok_or_else(|| WarehouseError::Decode(format!("row has no column '{column}'")))
    }
}

fn type_mismatch(column: &str, expected: &str, found: &Value) -> WarehouseError {
    WarehouseError::Decode(format!(
        "column '{column}' expected {expected}, found {}",
        found.type_name()
    ))
}
