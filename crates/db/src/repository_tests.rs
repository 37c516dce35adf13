//! Repository tests.
//!
//! Scenario tests run against `MemoryWarehouse`, which evaluates the real
//! statements the repository builds.  Tests that care about a backend's
//! exact answer (NULL aggregates, failures) use the scripted `MockWarehouse`.

use std::sync::Arc;

use warehouse::mock::MockWarehouse;
use warehouse::{ParamType, QueryParameter, Row, Value, Warehouse, WarehouseError};

use crate::classifier::classify;
use crate::query::{ops, EmployeeQueries, OPERATION_LABEL};
use crate::{EmployeeRecord, EmployeeRepository, ErrorKind, MemoryWarehouse, NewEmployee, TableRef};

fn table() -> TableRef {
    TableRef::new("test-project", "hr", "employees").unwrap()
}

fn repo_on(warehouse: Arc<dyn Warehouse>) -> EmployeeRepository {
    EmployeeRepository::open(warehouse, table())
}

fn record(employee_id: i64, name: &str, age: i64, salary: f64) -> EmployeeRecord {
    EmployeeRecord { employee_id, name: name.into(), age, salary }
}

// ============================================================
// End-to-end scenario against the in-memory table
// ============================================================

#[tokio::test]
async fn alice_and_bob_lifecycle() {
    let wh = Arc::new(MemoryWarehouse::new());
    let repo = repo_on(wh.clone());

    let alice = repo.add(&NewEmployee::new("Alice", 30, 50000.0)).await.expect("add Alice");
    assert_eq!(alice, 1);
    let bob = repo.add(&NewEmployee::new("Bob", 25, 40000.0)).await.expect("add Bob");
    assert_eq!(bob, 2);

    assert_eq!(
        repo.list().await.unwrap(),
        vec![record(1, "Alice", 30, 50000.0), record(2, "Bob", 25, 40000.0)]
    );

    let median_age = repo.median_age().await.unwrap().expect("non-empty table");
    assert!(median_age == 25 || median_age == 30, "got {median_age}");

    repo.delete_by_id(1).await.expect("delete Alice");
    assert_eq!(repo.list().await.unwrap(), vec![record(2, "Bob", 25, 40000.0)]);
}

#[tokio::test]
async fn sequential_adds_return_fresh_positive_ids() {
    let repo = repo_on(Arc::new(MemoryWarehouse::new()));
    let mut seen = Vec::new();

    for i in 0..10 {
        let id = repo.add(&NewEmployee::new(format!("emp-{i}"), 20 + i, 1000.0)).await.unwrap();
        assert!(id > 0);
        assert!(!seen.contains(&id), "id {id} reissued");
        seen.push(id);
    }
}

#[tokio::test]
async fn ids_continue_from_the_existing_maximum() {
    let wh = Arc::new(MemoryWarehouse::with_rows(vec![
        record(7, "Carol", 41, 70000.0),
        record(3, "Dan", 35, 65000.0),
    ]));
    let repo = repo_on(wh);

    assert_eq!(repo.add(&NewEmployee::new("Eve", 29, 45000.0)).await.unwrap(), 8);
}

#[tokio::test]
async fn add_past_the_largest_id_is_rejected_without_writing() {
    let wh = Arc::new(MemoryWarehouse::with_rows(vec![record(i64::MAX, "Last", 60, 1.0)]));
    let repo = repo_on(wh.clone());

    let err = repo.add(&NewEmployee::new("Overflow", 30, 2.0)).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(wh.rows(), vec![record(i64::MAX, "Last", 60, 1.0)]);
}

#[tokio::test]
async fn deleting_the_maximum_lets_its_id_be_reissued() {
    let repo = repo_on(Arc::new(MemoryWarehouse::new()));
    repo.add(&NewEmployee::new("A", 20, 1.0)).await.unwrap();
    let second = repo.add(&NewEmployee::new("B", 21, 2.0)).await.unwrap();

    repo.delete_by_id(second).await.unwrap();

    assert_eq!(repo.add(&NewEmployee::new("C", 22, 3.0)).await.unwrap(), second);
}

#[tokio::test]
async fn list_is_ordered_by_id_whatever_the_insertion_order() {
    let wh = Arc::new(MemoryWarehouse::with_rows(vec![
        record(5, "E", 50, 5.0),
        record(1, "A", 10, 1.0),
        record(3, "C", 30, 3.0),
    ]));
    let ids: Vec<i64> = repo_on(wh).list().await.unwrap().iter().map(|r| r.employee_id).collect();
    assert_eq!(ids, vec![1, 3, 5]);
}

#[tokio::test]
async fn empty_table_lists_nothing_and_has_no_medians() {
    let repo = repo_on(Arc::new(MemoryWarehouse::new()));
    assert!(repo.list().await.unwrap().is_empty());
    assert_eq!(repo.median_age().await.unwrap(), None);
    assert_eq!(repo.median_salary().await.unwrap(), None);
}

#[tokio::test]
async fn deleting_an_absent_id_succeeds() {
    let wh = Arc::new(MemoryWarehouse::with_rows(vec![record(1, "A", 10, 1.0)]));
    let repo = repo_on(wh.clone());

    repo.delete_by_id(42).await.expect("absent id is not an error");
    assert_eq!(wh.rows(), vec![record(1, "A", 10, 1.0)]);
}

#[tokio::test]
async fn median_salary_over_odd_count() {
    let wh = Arc::new(MemoryWarehouse::with_rows(vec![
        record(1, "A", 20, 30000.0),
        record(2, "B", 30, 90000.0),
        record(3, "C", 40, 50000.0),
    ]));
    assert_eq!(repo_on(wh).median_salary().await.unwrap(), Some(50000.0));
}

// ============================================================
// Error classification through the repository
// ============================================================

#[tokio::test]
async fn text_bound_where_integer_expected_is_a_validation_error() {
    let wh = Arc::new(MemoryWarehouse::new());
    let queries = EmployeeQueries::new(table());

    let mut stmt = queries.insert(&NewEmployee::new("Mallory", 0, 1.0));
    for p in stmt.params.iter_mut().filter(|p| p.name == "age") {
        *p = QueryParameter::new("age", ParamType::Int64, Value::String("thirty".into()));
    }

    let err = wh.query(&stmt).await.map_err(|e| classify(ops::ADD, e)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(wh.rows().is_empty(), "table must be unchanged");
}

#[tokio::test]
async fn rejected_add_leaves_the_table_unchanged() {
    let wh = Arc::new(MemoryWarehouse::with_rows(vec![record(1, "A", 10, 1.0)]));
    wh.fail_next(WarehouseError::InvalidQuery("Query parameter 'age' has type STRING".into()));
    let repo = repo_on(wh.clone());

    let err = repo.add(&NewEmployee::new("B", 20, 2.0)).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(wh.rows(), vec![record(1, "A", 10, 1.0)]);
}

#[tokio::test]
async fn missing_table_is_not_found() {
    let repo = repo_on(Arc::new(MemoryWarehouse::without_table()));
    assert_eq!(repo.list().await.unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(repo.median_age().await.unwrap_err().kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn transient_failure_is_surfaced_once_without_retry() {
    let mock = Arc::new(MockWarehouse::failing(WarehouseError::Unavailable("503 backendError".into())));
    let repo = repo_on(mock.clone());

    let err = repo.delete_by_id(1).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Transient);
    assert!(err.is_retryable());
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn garbled_rows_are_unknown_errors() {
    let mock = Arc::new(MockWarehouse::returning(vec![
        Row::new().with("employee_id", Value::String("one".into())),
    ]));
    let repo = repo_on(mock);

    assert_eq!(repo.list().await.unwrap_err().kind, ErrorKind::Unknown);
    assert_eq!(
        repo.add(&NewEmployee::new("A", 1, 1.0)).await.unwrap_err().kind,
        ErrorKind::Unknown
    );
}

#[tokio::test]
async fn add_without_a_returned_id_is_unknown() {
    let repo = repo_on(Arc::new(MockWarehouse::returning(Vec::new())));
    assert_eq!(
        repo.add(&NewEmployee::new("A", 1, 1.0)).await.unwrap_err().kind,
        ErrorKind::Unknown
    );
}

// ============================================================
// Backend answer shapes
// ============================================================

#[tokio::test]
async fn null_aggregate_row_is_absent_not_zero() {
    let mock = Arc::new(MockWarehouse::returning(vec![
        Row::new().with("median_age", Value::Null).with("median_salary", Value::Null),
    ]));
    let repo = repo_on(mock);

    assert_eq!(repo.median_age().await.unwrap(), None);
    assert_eq!(repo.median_salary().await.unwrap(), None);
}

#[tokio::test]
async fn statements_carry_operation_labels() {
    let mock = Arc::new(MockWarehouse::returning(Vec::new()));
    let repo = repo_on(mock.clone());

    repo.delete_by_id(9).await.unwrap();
    let stmt = mock.last_call().expect("one statement sent");
    assert_eq!(stmt.get_label(OPERATION_LABEL), Some(ops::DELETE));
    assert_eq!(stmt.param("employee_id").map(|p| &p.value), Some(&Value::Int64(9)));
}

#[tokio::test]
async fn close_releases_the_warehouse() {
    let mock = Arc::new(MockWarehouse::returning(Vec::new()));
    let repo = repo_on(mock.clone());
    repo.close().await.unwrap();
    assert!(mock.is_closed());
}
