//! The `Warehouse` trait: the contract every backend must fulfil.

use async_trait::async_trait;

use crate::{Row, Statement, WarehouseError};

/// An analytical store that executes parameterized statements.
///
/// One call is one execution unit: a single statement or a multi-statement
/// script, sent and awaited as a whole.  Implementations hold no per-request
/// state and must be shareable across tasks.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Short backend name used in logs (`"bigquery"`, `"memory"`, …).
    fn backend(&self) -> &'static str;

    /// Execute `statement` and return the rows of its final result set.
    ///
    /// Statements without a result set (DML, DDL) return an empty vector.
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, WarehouseError>;

    /// Release any resources held by the backend.
    async fn close(&self) -> Result<(), WarehouseError> {
        Ok(())
    }
}
