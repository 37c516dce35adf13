//! Maps warehouse failures onto the service's error taxonomy.

use tracing::warn;
use warehouse::WarehouseError;

use crate::error::{ErrorKind, ServiceError};

/// The outcome a warehouse error category maps to.
pub fn kind_of(err: &WarehouseError) -> ErrorKind {
    match err {
        WarehouseError::InvalidQuery(_) => ErrorKind::Validation,
        WarehouseError::NotFound(_) => ErrorKind::NotFound,
        WarehouseError::Unavailable(_) => ErrorKind::Transient,
        WarehouseError::Decode(_) | WarehouseError::Other(_) => ErrorKind::Unknown,
    }
}

/// Classify `err` raised while running `operation`.
///
/// Logged once here; callers receive the tagged result and nothing else.
pub fn classify(operation: &str, err: WarehouseError) -> ServiceError {
    let kind = kind_of(&err);
    warn!(operation, kind = %kind, error = %err, "warehouse operation failed");
    ServiceError::new(kind, err.to_string())
}
