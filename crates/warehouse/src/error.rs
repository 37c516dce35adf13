//! Warehouse-level error type.

use thiserror::Error;

/// Errors returned by a warehouse's `query` method.
///
/// The variants follow the failure categories the backend reports, so the
/// service layer can classify them without inspecting messages:
/// - `InvalidQuery`: malformed statement or bad parameter binding.
/// - `NotFound`: the referenced project, dataset or table is missing.
/// - `Unavailable`: transient service/API failure; a retry may succeed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WarehouseError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("warehouse unavailable: {0}")]
    Unavailable(String),

    /// The backend answered, but the payload did not have the expected shape.
    #[error("could not decode warehouse response: {0}")]
    Decode(String),

    #[error("warehouse error: {0}")]
    Other(String),
}
