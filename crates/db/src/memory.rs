//! `MemoryWarehouse`: an in-process stand-in for the employee table.
//!
//! It evaluates the statements built by [`EmployeeQueries`] against a `Vec`
//! of records, dispatching on the statement's operation label and reading
//! values only from the bound parameters.  Used for local development
//! (`--backend memory`) and scenario tests.
//!
//! [`EmployeeQueries`]: crate::query::EmployeeQueries

use std::cmp::Ordering;
use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use warehouse::{Row, Statement, Value, Warehouse, WarehouseError};

use crate::allocator;
use crate::query::{ops, NumericColumn, OPERATION_LABEL};
use crate::EmployeeRecord;

#[derive(Debug, Default)]
struct MemoryState {
    /// `None` models a table that does not exist.
    rows: Option<Vec<EmployeeRecord>>,
    /// Errors handed out (oldest first) before any statement is evaluated.
    pending_failures: VecDeque<WarehouseError>,
    executed: Vec<Statement>,
}

/// Single-table in-memory warehouse.
#[derive(Debug)]
pub struct MemoryWarehouse {
    state: Mutex<MemoryState>,
}

impl MemoryWarehouse {
    /// An existing, empty table.
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    pub fn with_rows(rows: Vec<EmployeeRecord>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                rows: Some(rows),
                ..Default::default()
            }),
        }
    }

    /// A warehouse in which the table has not been created.
    pub fn without_table() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Make the next statement fail with `err` without touching the table.
    pub fn fail_next(&self, err: WarehouseError) {
        self.state.lock().pending_failures.push_back(err);
    }

    /// Snapshot of the table in insertion order; empty if it does not exist.
    pub fn rows(&self) -> Vec<EmployeeRecord> {
        self.state.lock().rows.clone().unwrap_or_default()
    }

    /// Every statement received, including rejected ones.
    pub fn executed(&self) -> Vec<Statement> {
        self.state.lock().executed.clone()
    }
}

impl Default for MemoryWarehouse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, WarehouseError> {
        let mut state = self.state.lock();
        state.executed.push(statement.clone());

        statement.validate()?;
        if let Some(err) = state.pending_failures.pop_front() {
            return Err(err);
        }

        let rows = state
            .rows
            .as_mut()
            .ok_or_else(|| WarehouseError::NotFound("employee table does not exist".into()))?;

        let operation = statement.get_label(OPERATION_LABEL).unwrap_or_default();
        match operation {
            ops::ADD => {
                let record = EmployeeRecord {
                    employee_id: allocator::next_id(rows.iter().map(|r| r.employee_id).max())?,
                    name: string_param(statement, "name")?,
                    age: int_param(statement, "age")?,
                    salary: float_param(statement, "salary")?,
                };
                let row = Row::new().with("employee_id", Value::Int64(record.employee_id));
                rows.push(record);
                Ok(vec![row])
            }
            ops::LIST => {
                let mut sorted = rows.clone();
                sorted.sort_by_key(|r| r.employee_id);
                Ok(sorted.iter().map(EmployeeRecord::to_row).collect())
            }
            ops::DELETE => {
                let employee_id = int_param(statement, "employee_id")?;
                rows.retain(|r| r.employee_id != employee_id);
                Ok(Vec::new())
            }
            ops::MEDIAN_AGE => {
                let median = approx_median(rows.iter().map(|r| r.age).collect());
                Ok(median_row(NumericColumn::Age, median.map(Value::Int64)))
            }
            ops::MEDIAN_SALARY => {
                let median = approx_median(rows.iter().map(|r| r.salary).collect());
                Ok(median_row(NumericColumn::Salary, median.map(Value::Float64)))
            }
            other => Err(WarehouseError::InvalidQuery(format!(
                "in-memory warehouse cannot evaluate statement with operation '{other}'"
            ))),
        }
    }
}

/// Middle boundary of a two-bucket split over the sorted values: the upper
/// of the two middle elements when the count is even.
fn approx_median<T: Copy + PartialOrd>(mut values: Vec<T>) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Some(values[values.len() / 2])
}

/// An aggregate over an empty table yields no row at all.
fn median_row(column: NumericColumn, value: Option<Value>) -> Vec<Row> {
    value
        .map(|v| vec![Row::new().with(column.median_alias(), v)])
        .unwrap_or_default()
}

fn bound<'a>(statement: &'a Statement, name: &str) -> Result<&'a Value, WarehouseError> {
    statement
        .param(name)
        .map(|p| &p.value)
        .ok_or_else(|| WarehouseError::InvalidQuery(format!("query parameter @{name} has no binding")))
}

fn null_param(name: &str) -> WarehouseError {
    WarehouseError::InvalidQuery(format!("query parameter @{name} must not be NULL"))
}

fn int_param(statement: &Statement, name: &str) -> Result<i64, WarehouseError> {
    match bound(statement, name)? {
        Value::Int64(v) => Ok(*v),
        _ => Err(null_param(name)),
    }
}

fn float_param(statement: &Statement, name: &str) -> Result<f64, WarehouseError> {
    match bound(statement, name)? {
        Value::Float64(v) => Ok(*v),
        _ => Err(null_param(name)),
    }
}

fn string_param(statement: &Statement, name: &str) -> Result<String, WarehouseError> {
    match bound(statement, name)? {
        Value::String(v) => Ok(v.clone()),
        _ => Err(null_param(name)),
    }
}
