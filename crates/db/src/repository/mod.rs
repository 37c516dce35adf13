//! Repositories, one per table.
//!
//! Every operation builds its statement through `query`, runs it on the
//! injected warehouse, and returns a `ServiceResult<T>`.

pub mod employees;

pub use employees::EmployeeRepository;
