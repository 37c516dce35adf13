//! Typed error types for the db crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of outcomes a failed repository operation maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed statement or bad parameter binding.
    #[serde(rename = "validation_error")]
    Validation,
    /// The referenced table or dataset does not exist.
    #[serde(rename = "not_found")]
    NotFound,
    /// Backend unavailable; the caller may retry.
    #[serde(rename = "transient_error")]
    Transient,
    #[serde(rename = "unknown_error")]
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::NotFound => "not_found",
            Self::Transient => "transient_error",
            Self::Unknown => "unknown_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure: an [`ErrorKind`] plus a human-readable message.
///
/// This is the only error type that crosses the repository boundary.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Whether the caller may reasonably retry.  The service never does.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Transient
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Invalid table reference in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("table reference '{0}' must have the form project.dataset.table")]
    Malformed(String),

    #[error("invalid {part} identifier '{value}'")]
    InvalidIdentifier { part: &'static str, value: String },
}
