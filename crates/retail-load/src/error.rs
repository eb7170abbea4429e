use std::fmt;

use thiserror::Error;

/// Cause attached to a wrapped storage failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Bundle contract violations, detected before any storage call
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Bundle is missing table '{0}'")]
    MissingTable(String),

    #[error("Bundle table '{0}' is empty")]
    EmptyTable(String),

    #[error("Bundle carries unexpected table '{0}'")]
    UnexpectedTable(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Schema phase failed for table '{table}': {source}")]
    Schema { table: String, source: BoxError },

    #[error("Insert phase failed for table '{table}': {source}")]
    Insert { table: String, source: BoxError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Validation,
    Schema,
    Insert,
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadPhase::Validation => "validation",
            LoadPhase::Schema => "schema",
            LoadPhase::Insert => "insert",
        })
    }
}

impl LoadError {
    pub fn phase(&self) -> LoadPhase {
        match self {
            LoadError::Validation(_) => LoadPhase::Validation,
            LoadError::Schema { .. } => LoadPhase::Schema,
            LoadError::Insert { .. } => LoadPhase::Insert,
        }
    }

    /// Table the failure concerns
    pub fn table(&self) -> &str {
        match self {
            LoadError::Validation(
                ValidationError::MissingTable(t)
                | ValidationError::EmptyTable(t)
                | ValidationError::UnexpectedTable(t),
            ) => t,
            LoadError::Schema { table, .. } | LoadError::Insert { table, .. } => table,
        }
    }

    pub(crate) fn schema(table: &str, source: impl Into<BoxError>) -> Self {
        LoadError::Schema {
            table: table.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn insert(table: &str, source: impl Into<BoxError>) -> Self {
        LoadError::Insert {
            table: table.to_string(),
            source: source.into(),
        }
    }
}
