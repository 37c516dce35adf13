//! Employee record repository.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use warehouse::{Row, Statement, Warehouse};

use crate::classifier::classify;
use crate::query::{ops, EmployeeQueries, NumericColumn};
use crate::{EmployeeRecord, NewEmployee, ServiceError, ServiceResult, TableRef};

/// Façade over one employee table.
///
/// Holds the injected warehouse handle and the table reference, nothing
/// else: every call reads the live table.  Failures come back as classified
/// [`ServiceError`]s; raw warehouse errors never escape.
pub struct EmployeeRepository {
    warehouse: Arc<dyn Warehouse>,
    queries: EmployeeQueries,
}

impl EmployeeRepository {
    /// Bind a repository to `table` on `warehouse`.
    pub fn open(warehouse: Arc<dyn Warehouse>, table: TableRef) -> Self {
        info!(backend = warehouse.backend(), table = %table, "opening employee repository");
        Self {
            warehouse,
            queries: EmployeeQueries::new(table),
        }
    }

    pub fn table(&self) -> &TableRef {
        self.queries.table()
    }

    /// Release the warehouse handle.
    pub async fn close(&self) -> ServiceResult<()> {
        info!(table = %self.table(), "closing employee repository");
        self.warehouse.close().await.map_err(|e| classify("close", e))
    }

    /// Insert a record and return its newly allocated identifier.
    ///
    /// Identifier allocation and insert run as one script, but concurrent
    /// calls are not serialized and may receive the same identifier.
    #[instrument(skip(self, employee), fields(table = %self.table()))]
    pub async fn add(&self, employee: &NewEmployee) -> ServiceResult<i64> {
        let rows = self.run(ops::ADD, self.queries.insert(employee)).await?;

        let employee_id = rows
            .first()
            .map(|row| row.get_i64("employee_id"))
            .transpose()
            .map_err(|e| classify(ops::ADD, e))?
            .flatten()
            .ok_or_else(|| ServiceError::unknown("insert did not return an employee_id"))?;

        info!(employee_id, "employee added");
        Ok(employee_id)
    }

    /// All records, ascending by identifier.
    #[instrument(skip(self), fields(table = %self.table()))]
    pub async fn list(&self) -> ServiceResult<Vec<EmployeeRecord>> {
        let rows = self.run(ops::LIST, self.queries.select_all()).await?;
        rows.iter()
            .map(EmployeeRecord::from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| classify(ops::LIST, e))
    }

    /// Delete by identifier.  An identifier with no row is not an error.
    #[instrument(skip(self), fields(table = %self.table()))]
    pub async fn delete_by_id(&self, employee_id: i64) -> ServiceResult<()> {
        self.run(ops::DELETE, self.queries.delete_by_id(employee_id)).await?;
        info!(employee_id, "employee deleted");
        Ok(())
    }

    /// Approximate median age; `None` when the table is empty.
    #[instrument(skip(self), fields(table = %self.table()))]
    pub async fn median_age(&self) -> ServiceResult<Option<i64>> {
        let column = NumericColumn::Age;
        let rows = self.run(column.median_operation(), self.queries.median(column)).await?;
        first_value(&rows, |row| row.get_i64(column.median_alias()))
            .map_err(|e| classify(column.median_operation(), e))
    }

    /// Approximate median salary; `None` when the table is empty.
    #[instrument(skip(self), fields(table = %self.table()))]
    pub async fn median_salary(&self) -> ServiceResult<Option<f64>> {
        let column = NumericColumn::Salary;
        let rows = self.run(column.median_operation(), self.queries.median(column)).await?;
        first_value(&rows, |row| row.get_f64(column.median_alias()))
            .map_err(|e| classify(column.median_operation(), e))
    }

    async fn run(&self, operation: &str, statement: Statement) -> ServiceResult<Vec<Row>> {
        debug!(operation, sql = %statement.sql, "executing statement");
        self.warehouse
            .query(&statement)
            .await
            .map_err(|e| classify(operation, e))
    }
}

/// Aggregates may come back as no row or as a row holding NULL; both are
/// absent.
fn first_value<T, E>(
    rows: &[Row],
    read: impl FnOnce(&Row) -> Result<Option<T>, E>,
) -> Result<Option<T>, E> {
    match rows.first() {
        Some(row) => read(row),
        None => Ok(None),
    }
}
