//! FILENAME: core/engine/src/error.rs

use crate::value::ColumnType;
use thiserror::Error;

/// Violations of the table invariants (unique names, equal lengths,
/// conforming values) and lookups of unknown columns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Column '{column}' row {row}: expected {expected} value, found {found}")]
    TypeMismatch {
        column: String,
        row: usize,
        expected: ColumnType,
        found: &'static str,
    },

    #[error("Cannot append column '{column}': {found} rows into a {expected} column")]
    AppendType {
        column: String,
        expected: ColumnType,
        found: ColumnType,
    },
}

/// Failure to compute a derived column. A single failing row aborts the
/// whole derivation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DerivationError {
    #[error("Source column not found: {0}")]
    UnknownColumn(String),

    #[error("Derived column already exists: {0}")]
    DuplicateColumn(String),

    #[error("Column '{column}' is {found}, '{derivation}' needs {expected}")]
    SourceType {
        column: String,
        derivation: &'static str,
        expected: &'static str,
        found: ColumnType,
    },

    #[error("Invalid timestamp pattern: {0}")]
    InvalidPattern(String),

    #[error("Deriving '{column}' failed at row {row}: {reason}")]
    Row {
        column: String,
        row: usize,
        reason: String,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}
