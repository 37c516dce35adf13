//! `warehouse` crate: the `Warehouse` trait and its implementations.
//!
//! Every backend, the BigQuery REST client and the in-process doubles alike,
//! must implement [`Warehouse`].  The `db` crate dispatches all statements
//! through this trait object and never sees a concrete client.

pub mod auth;
pub mod bigquery;
pub mod error;
pub mod mock;
pub mod row;
pub mod statement;
pub mod traits;

pub use auth::{ApplicationDefault, StaticToken, TokenSource};
pub use bigquery::{BigQueryConfig, BigQueryWarehouse};
pub use error::WarehouseError;
pub use row::Row;
pub use statement::{ParamType, QueryParameter, Statement, Value};
pub use traits::Warehouse;
