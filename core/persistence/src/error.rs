//! FILENAME: core/persistence/src/error.rs

use engine::{ColumnType, TableError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX read error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Source '{0}' has no header row")]
    Empty(String),

    #[error("Source '{source_name}' is missing declared column '{column}'")]
    MissingColumn { source_name: String, column: String },

    #[error("Source '{source_name}' row {row} has {found} cells, the header has {expected}")]
    ExtraCells {
        source_name: String,
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Column '{column}' row {row}: cannot read '{value}' as {expected}")]
    TypeMismatch {
        column: String,
        row: usize,
        expected: ColumnType,
        value: String,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}
