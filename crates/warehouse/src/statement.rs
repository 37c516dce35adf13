//! Parameterized statements.
//!
//! A [`Statement`] is SQL text with `@name` placeholders plus a parallel list
//! of typed bindings.  Caller-supplied values only ever travel in the
//! bindings; the text itself is built from trusted configuration.

use std::collections::BTreeMap;
use std::fmt;

use crate::WarehouseError;

// ---------------------------------------------------------------------------
// Types and values
// ---------------------------------------------------------------------------

/// Declared type of a query parameter.
///
/// Must match the stored column type exactly; the warehouse would otherwise
/// coerce silently or reject the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int64,
    String,
    Float64,
}

impl ParamType {
    /// The type name used in GoogleSQL (`INT64`, `STRING`, `FLOAT64`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int64 => "INT64",
            Self::String => "STRING",
            Self::Float64 => "FLOAT64",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar value, either bound as a parameter or read back from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int64(i64),
    Float64(f64),
    String(String),
}

impl Value {
    /// Name of the value's runtime type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Int64(_) => "INT64",
            Self::Float64(_) => "FLOAT64",
            Self::String(_) => "STRING",
        }
    }

    /// Whether this value may be bound under `ty`.  `NULL` fits every type.
    pub fn matches(&self, ty: ParamType) -> bool {
        matches!(
            (self, ty),
            (Self::Null, _)
                | (Self::Int64(_), ParamType::Int64)
                | (Self::Float64(_), ParamType::Float64)
                | (Self::String(_), ParamType::String)
        )
    }
}

/// One named, typed binding.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameter {
    pub name: String,
    pub param_type: ParamType,
    pub value: Value,
}

impl QueryParameter {
    /// Raw constructor; the value is not checked against the type until
    /// [`Statement::validate`] runs.
    pub fn new(name: impl Into<String>, param_type: ParamType, value: Value) -> Self {
        Self {
            name: name.into(),
            param_type,
            value,
        }
    }

    pub fn int64(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, ParamType::Int64, Value::Int64(value))
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ParamType::String, Value::String(value.into()))
    }

    pub fn float64(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, ParamType::Float64, Value::Float64(value))
    }
}

// ---------------------------------------------------------------------------
// Statement
// ---------------------------------------------------------------------------

/// SQL text (a single statement or a multi-statement script) together with
/// its bindings and job labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<QueryParameter>,
    /// Key/value labels attached to the job (lowercase, `[a-z0-9_-]`).
    pub labels: BTreeMap<String, String>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Default::default()
        }
    }

    /// Add a binding.
    pub fn bind(mut self, param: QueryParameter) -> Self {
        self.params.push(param);
        self
    }

    /// Attach a job label.
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn get_label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn param(&self, name: &str) -> Option<&QueryParameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Names of every `@name` placeholder in the text, in order of appearance.
    ///
    /// Quoted literals, backtick identifiers and `@@system` variables are
    /// skipped.
    pub fn placeholders(&self) -> Vec<&str> {
        let sql = self.sql.as_str();
        let bytes = sql.as_bytes();
        let mut found = Vec::new();
        let mut quote: Option<u8> = None;
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            if let Some(q) = quote {
                if b == b'\\' {
                    i += 2;
                    continue;
                }
                if b == q {
                    quote = None;
                }
                i += 1;
                continue;
            }

            match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'@' if bytes.get(i + 1) == Some(&b'@') => {
                    i += 2;
                    while i < bytes.len() && is_ident_byte(bytes[i]) {
                        i += 1;
                    }
                    continue;
                }
                b'@' => {
                    let start = i + 1;
                    let mut end = start;
                    while end < bytes.len() && is_ident_byte(bytes[end]) {
                        end += 1;
                    }
                    if end > start {
                        found.push(&sql[start..end]);
                    }
                    i = end;
                    continue;
                }
                _ => {}
            }
            i += 1;
        }

        found
    }

    /// Check that every placeholder is bound and every binding's value fits
    /// its declared type.
    ///
    /// # Errors
    /// `WarehouseError::InvalidQuery` describing the first violation found.
    pub fn validate(&self) -> Result<(), WarehouseError> {
        if self.sql.trim().is_empty() {
            return Err(WarehouseError::InvalidQuery("empty statement".into()));
        }

        for param in &self.params {
            if !param.value.matches(param.param_type) {
                return Err(WarehouseError::InvalidQuery(format!(
                    "parameter @{} is declared {} but bound to a {} value",
                    param.name,
                    param.param_type,
                    param.value.type_name()
                )));
            }
        }

        for name in self.placeholders() {
            if self.param(name).is_none() {
                return Err(WarehouseError::InvalidQuery(format!(
                    "query parameter @{name} has no binding"
                )));
            }
        }

        Ok(())
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
