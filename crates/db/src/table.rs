//! Fully qualified table reference.

use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// `project.dataset.table`, validated at construction.
///
/// This is the only value ever interpolated into statement text, so each
/// part is restricted to the warehouse's identifier charset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    project: String,
    dataset: String,
    table: String,
}

impl TableRef {
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let project = project.into();
        let dataset = dataset.into();
        let table = table.into();

        check("project", &project, |c| c.is_ascii_alphanumeric() || c == '-')?;
        check("dataset", &dataset, |c| c.is_ascii_alphanumeric() || c == '_')?;
        check("table", &table, |c| c.is_ascii_alphanumeric() || c == '_')?;

        Ok(Self { project, dataset, table })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Backtick-quoted form for statement text.
    pub fn quoted(&self) -> String {
        format!("`{self}`")
    }
}

fn check(part: &'static str, value: &str, allowed: impl Fn(char) -> bool) -> Result<(), ConfigError> {
    if value.is_empty() || value.len() > 1024 || !value.chars().all(allowed) {
        return Err(ConfigError::InvalidIdentifier {
            part,
            value: value.to_string(),
        });
    }
    Ok(())
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

impl FromStr for TableRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [project, dataset, table] => Self::new(*project, *dataset, *table),
            _ => Err(ConfigError::Malformed(s.to_string())),
        }
    }
}
