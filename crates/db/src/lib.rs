//! `db` crate: the employee data service.
//!
//! Translates typed record operations into parameterized warehouse
//! statements, allocates surrogate identifiers, and classifies backend
//! failures.  Knows nothing about HTTP.

pub mod allocator;
pub mod classifier;
pub mod error;
pub mod memory;
pub mod models;
pub mod query;
pub mod repository;
pub mod table;

pub use error::{ConfigError, ErrorKind, ServiceError, ServiceResult};
pub use memory::MemoryWarehouse;
pub use models::{EmployeeRecord, NewEmployee};
pub use repository::EmployeeRepository;
pub use table::TableRef;

#[cfg(test)]
mod repository_tests;
