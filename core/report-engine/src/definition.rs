//! FILENAME: core/report-engine/src/definition.rs
//! Report Definition - The serializable configuration of one report page.
//!
//! A report names its sources, builds named datasets from them through
//! ordered steps, and lays out sections of narrative and charts. Every
//! query of a page is written down here as data instead of SQL text.

use std::collections::HashSet;
use std::path::Path;

use aggregate_engine::{AggregationError, AggregationSpec, AggregationType, Measure, SortKey};
use chart_engine::ChartSpec;
use engine::{DerivedFieldSpec, Predicate};
use persistence::SourceSpec;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ============================================================================
// STEPS
// ============================================================================

/// A measure as written in configuration. The function name stays a string
/// until the step runs, so an unknown name only fails its own section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureDefinition {
    pub function: String,
    #[serde(default)]
    pub column: Option<String>,
    pub alias: String,
}

/// Configuration form of an aggregation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregationDefinition {
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub measures: Vec<MeasureDefinition>,
    #[serde(default)]
    pub sort: Vec<SortKey>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl AggregationDefinition {
    /// Resolves function names into a runnable spec.
    pub fn to_spec(&self) -> Result<AggregationSpec, AggregationError> {
        let measures = self
            .measures
            .iter()
            .map(|m| {
                Ok(Measure {
                    function: AggregationType::parse(&m.function)?,
                    column: m.column.clone(),
                    alias: m.alias.clone(),
                })
            })
            .collect::<Result<Vec<_>, AggregationError>>()?;

        Ok(AggregationSpec {
            group_by: self.group_by.clone(),
            measures,
            sort: self.sort.clone(),
            limit: self.limit,
        })
    }
}

/// One transformation in a dataset or chart pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Filter(Predicate),
    Derive(DerivedFieldSpec),
    Aggregate(AggregationDefinition),
    Select { columns: Vec<String> },
    Drop { columns: Vec<String> },
    /// Drops every column that has a missing value.
    DropIncomplete,
    /// Appends the rows of another source or dataset with the same columns.
    /// With `label_column`, a categorical column records where each row
    /// came from, so one chart can draw one series per input.
    Union {
        input: String,
        #[serde(default)]
        label_column: Option<String>,
        /// Label of the rows already in the table; defaults to the name the
        /// pipeline started from.
        #[serde(default)]
        label: Option<String>,
        /// Label of the appended rows; defaults to `input`.
        #[serde(default)]
        input_label: Option<String>,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Filter(_) => "filter",
            Step::Derive(_) => "derive",
            Step::Aggregate(_) => "aggregate",
            Step::Select { .. } => "select",
            Step::Drop { .. } => "drop",
            Step::DropIncomplete => "drop_incomplete",
            Step::Union { .. } => "union",
        }
    }
}

/// Every union in `steps` must read a name from `known`.
fn check_union_inputs(
    owner: &str,
    steps: &[Step],
    known: &HashSet<&str>,
) -> Result<(), ConfigError> {
    for step in steps {
        if let Step::Union { input, .. } = step {
            if !known.contains(input.as_str()) {
                return Err(ConfigError::UnknownUnionInput {
                    owner: owner.to_string(),
                    input: input.clone(),
                });
            }
        }
    }
    Ok(())
}

// ============================================================================
// DATASETS & SECTIONS
// ============================================================================

/// A named table built from a source or an earlier dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDefinition {
    pub name: String,
    /// Source name or the name of a dataset declared earlier.
    pub input: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A chart slot: the dataset it reads, chart-specific steps and the chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDefinition {
    /// Dataset or source name.
    pub dataset: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(flatten)]
    pub chart: ChartSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub heading: String,
    #[serde(default)]
    pub narrative: Vec<String>,
    #[serde(default)]
    pub charts: Vec<ChartDefinition>,
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDefinition {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
    #[serde(default)]
    pub datasets: Vec<DatasetDefinition>,
    #[serde(default)]
    pub sections: Vec<SectionDefinition>,
}

impl ReportDefinition {
    /// Parses and validates a JSON report definition.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let definition: ReportDefinition = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Reads, parses and validates a JSON report definition file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Checks structural consistency: unique names, references to known
    /// sources and earlier datasets (inputs and unions), unique chart ids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut tables: HashSet<&str> = HashSet::new();

        for source in &self.sources {
            if !tables.insert(source.name.as_str()) {
                return Err(ConfigError::DuplicateName(source.name.clone()));
            }
        }

        for dataset in &self.datasets {
            if !tables.contains(dataset.input.as_str()) {
                return Err(ConfigError::UnknownInput {
                    dataset: dataset.name.clone(),
                    input: dataset.input.clone(),
                });
            }
            check_union_inputs(&dataset.name, &dataset.steps, &tables)?;
            if !tables.insert(dataset.name.as_str()) {
                return Err(ConfigError::DuplicateName(dataset.name.clone()));
            }
        }

        let mut chart_ids: HashSet<&str> = HashSet::new();
        for section in &self.sections {
            for chart in &section.charts {
                if !chart_ids.insert(chart.chart.id.as_str()) {
                    return Err(ConfigError::DuplicateChart(chart.chart.id.clone()));
                }
                if !tables.contains(chart.dataset.as_str()) {
                    return Err(ConfigError::UnknownDataset {
                        chart: chart.chart.id.clone(),
                        dataset: chart.dataset.clone(),
                    });
                }
                check_union_inputs(&chart.chart.id, &chart.steps, &tables)?;
            }
        }

        Ok(())
    }
}
