//! FILENAME: core/chart-engine/src/error.rs

use engine::ColumnType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldBindingError {
    #[error("Field not found: {0}")]
    UnknownField(String),

    #[error("Field '{field}' is {found}, the '{channel}' channel needs numbers")]
    NonNumericField {
        field: String,
        channel: &'static str,
        found: ColumnType,
    },

    #[error("Field '{field}' row {row} has negative value {value}")]
    NegativeValue { field: String, row: usize, value: f64 },

    #[error("Field '{field}' row {row} is not a finite number ({value})")]
    NonFiniteValue { field: String, row: usize, value: f64 },

    #[error("Duplicate heatmap cell at row '{row}', column '{column}'")]
    DuplicateCell { row: String, column: String },

    #[error("Field '{field}' row {row} is missing")]
    MissingValue { field: String, row: usize },

    #[error("Chart '{chart}' binds no fields to the '{channel}' channel")]
    EmptyBinding { chart: String, channel: &'static str },
}
