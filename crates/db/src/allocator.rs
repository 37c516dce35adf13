//! Surrogate identifier allocation.
//!
//! The warehouse has no sequence object.  The next identifier is
//! `max(existing) + 1`, read inside the same script that inserts the row so
//! the read and the write travel as one job.  Two concurrent scripts can
//! still read the same maximum and insert duplicate identifiers; deleting
//! the current maximum lets its identifier be issued again.

use warehouse::WarehouseError;

use crate::TableRef;

/// Script variable holding the identifier allocated for the insert.
pub const NEXT_ID_VARIABLE: &str = "new_id";

/// `DECLARE` fragment that evaluates the next identifier against the live
/// table.
pub fn declare_next_id(table: &TableRef) -> String {
    format!(
        "DECLARE {NEXT_ID_VARIABLE} INT64 DEFAULT (\n  SELECT IFNULL(MAX(employee_id), 0) + 1\n  FROM {}\n);",
        table.quoted()
    )
}

/// The allocation policy, for backends that evaluate it in process.
///
/// Fails like the warehouse's INT64 overflow once the maximum is `i64::MAX`.
pub fn next_id(current_max: Option<i64>) -> Result<i64, WarehouseError> {
    current_max
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| WarehouseError::InvalidQuery("int64 overflow allocating employee_id".into()))
}
