//! FILENAME: core/report-engine/src/error.rs

use std::fmt;
use std::sync::Arc;

use aggregate_engine::AggregationError;
use chart_engine::FieldBindingError;
use engine::{DerivationError, TableError};
use persistence::DataSourceError;
use thiserror::Error;

/// Why one dataset or chart could not be produced.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source '{0}' is not loaded")]
    UnknownSource(String),

    /// A source failed to load; every dataset and chart reading it reports
    /// the load error.
    #[error("Source '{name}' failed to load: {source}")]
    SourceFailed {
        name: String,
        source: Arc<PipelineError>,
    },

    #[error("Dataset '{0}' is not defined")]
    UnknownDataset(String),

    /// An upstream dataset failed; every chart reading it reports the cause.
    #[error("Dataset '{name}' failed: {source}")]
    Dataset {
        name: String,
        source: Arc<PipelineError>,
    },

    #[error("Step {index} ({step}) failed: {source}")]
    Step {
        index: usize,
        step: &'static str,
        #[source]
        source: Box<PipelineError>,
    },

    #[error(transparent)]
    Load(#[from] DataSourceError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Derivation(#[from] DerivationError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Binding(#[from] FieldBindingError),
}

impl PipelineError {
    /// The innermost error, past source, dataset and step wrappers.
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::SourceFailed { source, .. } => source.root_cause(),
            PipelineError::Dataset { source, .. } => source.root_cause(),
            PipelineError::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A chart that could not be produced while assembling.
#[derive(Debug)]
pub struct ChartFailure {
    pub section: String,
    pub chart_id: String,
    pub error: PipelineError,
}

impl fmt::Display for ChartFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}: {}", self.section, self.chart_id, self.error)
    }
}

/// Assembly refused to build a report because charts failed.
#[derive(Debug)]
pub struct AssemblyError {
    pub failures: Vec<ChartFailure>,
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} chart(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for AssemblyError {}

/// A report definition that cannot be read or is inconsistent.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid report definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Name '{0}' is used by more than one source or dataset")]
    DuplicateName(String),

    #[error("Dataset '{dataset}' reads unknown input '{input}'")]
    UnknownInput { dataset: String, input: String },

    #[error("Chart '{chart}' reads unknown dataset '{dataset}'")]
    UnknownDataset { chart: String, dataset: String },

    #[error("Chart id '{0}' is used more than once")]
    DuplicateChart(String),

    #[error("'{owner}' appends unknown input '{input}'")]
    UnknownUnionInput { owner: String, input: String },
}
