//! `MockWarehouse`: a test double for `Warehouse`.
//!
//! Useful in unit tests where the exact rows (or failure) a backend hands
//! back matter more than real query evaluation.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{Row, Statement, Warehouse, WarehouseError};

/// Behaviour injected into `MockWarehouse` at construction time.
pub enum MockBehaviour {
    /// Return these rows for every statement.
    ReturnRows(Vec<Row>),
    /// Fail every statement with this error.
    Fail(WarehouseError),
}

/// A mock warehouse that records every statement it receives and answers
/// with a programmer-specified result.
///
/// Statements are validated first, exactly as a real backend would, so a
/// badly bound statement fails with `InvalidQuery` whatever the behaviour.
pub struct MockWarehouse {
    /// What the warehouse will do when `query` is called.
    pub behaviour: MockBehaviour,
    /// All statements seen (in call order).
    pub calls: Arc<Mutex<Vec<Statement>>>,
    closed: AtomicBool,
}

impl MockWarehouse {
    /// Create a mock that always succeeds with the given rows.
    pub fn returning(rows: Vec<Row>) -> Self {
        Self::with_behaviour(MockBehaviour::ReturnRows(rows))
    }

    /// Create a mock that always fails with `err`.
    pub fn failing(err: WarehouseError) -> Self {
        Self::with_behaviour(MockBehaviour::Fail(err))
    }

    fn with_behaviour(behaviour: MockBehaviour) -> Self {
        Self {
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of statements executed against this mock.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The most recent statement, if any.
    pub fn last_call(&self) -> Option<Statement> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Warehouse for MockWarehouse {
    fn backend(&self) -> &'static str {
        "mock"
    }

    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, WarehouseError> {
        self.calls.lock().unwrap().push(statement.clone());
        statement.validate()?;

        match &self.behaviour {
            MockBehaviour::ReturnRows(rows) => Ok(rows.clone()),
            MockBehaviour::Fail(err) => Err(err.clone()),
        }
    }

    async fn close(&self) -> Result<(), WarehouseError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
