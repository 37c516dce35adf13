//! Statement builders for the employee table.
//!
//! Every builder returns SQL text with `@name` placeholders and the matching
//! typed bindings.  Only the table reference (trusted configuration) is
//! formatted into the text; caller values always travel as parameters.

use warehouse::{QueryParameter, Statement};

use crate::allocator::{self, NEXT_ID_VARIABLE};
use crate::{NewEmployee, TableRef};

/// Job label naming the repository operation behind a statement.
pub const OPERATION_LABEL: &str = "operation";

/// Values of [`OPERATION_LABEL`].
pub mod ops {
    pub const ADD: &str = "employee_add";
    pub const LIST: &str = "employee_list";
    pub const DELETE: &str = "employee_delete";
    pub const MEDIAN_AGE: &str = "employee_median_age";
    pub const MEDIAN_SALARY: &str = "employee_median_salary";
}

/// Numeric columns that have a median statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericColumn {
    Age,
    Salary,
}

impl NumericColumn {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Salary => "salary",
        }
    }

    /// Result column of the median statement.
    pub fn median_alias(&self) -> &'static str {
        match self {
            Self::Age => "median_age",
            Self::Salary => "median_salary",
        }
    }

    pub fn median_operation(&self) -> &'static str {
        match self {
            Self::Age => ops::MEDIAN_AGE,
            Self::Salary => ops::MEDIAN_SALARY,
        }
    }
}

/// Builds the statements for one configured table.
#[derive(Debug, Clone)]
pub struct EmployeeQueries {
    table: TableRef,
}

impl EmployeeQueries {
    pub fn new(table: TableRef) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Allocate the next identifier, insert the row, and select the
    /// identifier back, as one script.
    pub fn insert(&self, employee: &NewEmployee) -> Statement {
        let table = self.table.quoted();
        let sql = format!(
            "{declare}\n\
             INSERT INTO {table} (employee_id, name, age, salary)\n\
             VALUES ({NEXT_ID_VARIABLE}, @name, @age, @salary);\n\
             SELECT {NEXT_ID_VARIABLE} AS employee_id;",
            declare = allocator::declare_next_id(&self.table),
        );

        Statement::new(sql)
            .bind(QueryParameter::string("name", employee.name.as_str()))
            .bind(QueryParameter::int64("age", employee.age))
            .bind(QueryParameter::float64("salary", employee.salary))
            .label(OPERATION_LABEL, ops::ADD)
    }

    pub fn select_all(&self) -> Statement {
        let sql = format!(
            "SELECT employee_id, name, age, salary\nFROM {}\nORDER BY employee_id ASC",
            self.table.quoted()
        );
        Statement::new(sql).label(OPERATION_LABEL, ops::LIST)
    }

    pub fn delete_by_id(&self, employee_id: i64) -> Statement {
        let sql = format!(
            "DELETE FROM {} WHERE employee_id = @employee_id",
            self.table.quoted()
        );
        Statement::new(sql)
            .bind(QueryParameter::int64("employee_id", employee_id))
            .label(OPERATION_LABEL, ops::DELETE)
    }

    /// `APPROX_QUANTILES(col, 2)[OFFSET(1)]`: the middle boundary of a
    /// two-bucket split.  Approximate for even-sized inputs, and kept that
    /// way so results match the warehouse's own primitive.
    pub fn median(&self, column: NumericColumn) -> Statement {
        let sql = format!(
            "SELECT APPROX_QUANTILES({col}, 2)[OFFSET(1)] AS {alias}\nFROM {table}",
            col = column.column(),
            alias = column.median_alias(),
            table = self.table.quoted(),
        );
        Statement::new(sql).label(OPERATION_LABEL, column.median_operation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warehouse::{ParamType, Value};

    fn queries() -> EmployeeQueries {
        EmployeeQueries::new(TableRef::new("proj", "hr", "employees").unwrap())
    }

    #[test]
    fn insert_is_one_script_with_typed_bindings() {
        let stmt = queries().insert(&NewEmployee::new("Alice", 30, 50000.0));

        let declare = stmt.sql.find("DECLARE new_id").expect("allocates an id");
        let insert = stmt.sql.find("INSERT INTO `proj.hr.employees`").expect("inserts");
        let select = stmt.sql.find("SELECT new_id AS employee_id").expect("returns the id");
        assert!(declare < insert && insert < select);

        let types: Vec<(&str, ParamType)> =
            stmt.params.iter().map(|p| (p.name.as_str(), p.param_type)).collect();
        assert_eq!(
            types,
            vec![("name", ParamType::String), ("age", ParamType::Int64), ("salary", ParamType::Float64)]
        );
        assert_eq!(stmt.get_label(OPERATION_LABEL), Some(ops::ADD));
        assert!(stmt.validate().is_ok());
    }

    #[test]
    fn caller_values_never_reach_the_statement_text() {
        let hostile = "Robert'); DELETE FROM employees; --";
        let stmt = queries().insert(&NewEmployee::new(hostile, 30, 1.0));

        assert!(!stmt.sql.contains(hostile));
        assert_eq!(stmt.param("name").unwrap().value, Value::String(hostile.into()));

        let stmt = queries().delete_by_id(987654321);
        assert!(!stmt.sql.contains("987654321"));
        assert_eq!(stmt.param("employee_id").unwrap().value, Value::Int64(987654321));
    }

    #[test]
    fn select_all_orders_by_identifier() {
        let stmt = queries().select_all();
        assert!(stmt.sql.ends_with("ORDER BY employee_id ASC"));
        assert!(stmt.params.is_empty());
        assert!(stmt.validate().is_ok());
    }

    #[test]
    fn medians_use_the_two_bucket_quantile() {
        let age = queries().median(NumericColumn::Age);
        assert!(age.sql.contains("APPROX_QUANTILES(age, 2)[OFFSET(1)] AS median_age"));
        assert_eq!(age.get_label(OPERATION_LABEL), Some(ops::MEDIAN_AGE));

        let salary = queries().median(NumericColumn::Salary);
        assert!(salary.sql.contains("APPROX_QUANTILES(salary, 2)[OFFSET(1)] AS median_salary"));
        assert_eq!(salary.get_label(OPERATION_LABEL), Some(ops::MEDIAN_SALARY));
    }
}
