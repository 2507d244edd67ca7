//! FILENAME: core/aggregate-engine/src/error.rs

use engine::{ColumnType, TableError};
use thiserror::Error;

use crate::definition::AggregationType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    #[error("Unsupported aggregation function: {0}")]
    UnsupportedAggregation(String),

    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error("Cannot apply {function} to {found} column '{column}'")]
    NonNumericColumn {
        column: String,
        function: AggregationType,
        found: ColumnType,
    },

    #[error("Sort key is not an output column: {0}")]
    UnknownSortKey(String),

    #[error("Output column defined twice: {0}")]
    DuplicateOutput(String),

    #[error("Aggregation has neither group keys nor measures")]
    NoMeasures,

    #[error("Measure '{0}' needs a value column")]
    MissingMeasureColumn(String),

    #[error(transparent)]
    Table(#[from] TableError),
}
