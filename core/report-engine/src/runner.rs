//! FILENAME: core/report-engine/src/runner.rs
//! Report Runner - Drives sources through datasets and charts.
//!
//! Sources are loaded once. Datasets are built in declaration order, each
//! from a source or an earlier dataset. Every chart then runs its own steps
//! on a dataset and binds the result. A failure stays local: a broken
//! dataset fails only the charts that read it, a broken chart only itself.

use std::collections::HashMap;
use std::sync::Arc;

use aggregate_engine::aggregate;
use chart_engine::{bind, RenderableChart};
use engine::{derive, log_debug, log_enter, log_error, log_exit, log_info, Column, Table};
use persistence::{load, DataSourceError, SourceSpec};

use crate::assembler::{assemble_with_placeholders, ChartResult, SectionInput};
use crate::definition::{ChartDefinition, ReportDefinition, Step};
use crate::error::PipelineError;
use crate::view::Report;

// ============================================================================
// SOURCES
// ============================================================================

/// Source tables by name. A source that failed to load keeps its error, so
/// everything reading it reports the real cause.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    tables: HashMap<String, Table>,
    failed: HashMap<String, Arc<PipelineError>>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, table: Table) {
        let name = name.into();
        self.failed.remove(&name);
        self.tables.insert(name, table);
    }

    pub fn with_table(mut self, name: impl Into<String>, table: Table) -> Self {
        self.insert(name, table);
        self
    }

    /// Marks `name` as failed to load.
    pub fn record_failure(&mut self, name: impl Into<String>, error: DataSourceError) {
        let name = name.into();
        self.tables.remove(&name);
        self.failed.insert(name, Arc::new(PipelineError::Load(error)));
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// The loaded table, the recorded load error, or `UnknownSource`.
    pub fn table(&self, name: &str) -> Result<Table, PipelineError> {
        if let Some(table) = self.tables.get(name) {
            return Ok(table.clone());
        }
        match self.failed.get(name) {
            Some(cause) => Err(PipelineError::SourceFailed {
                name: name.to_string(),
                source: Arc::clone(cause),
            }),
            None => Err(PipelineError::UnknownSource(name.to_string())),
        }
    }

    /// Sources that failed to load, with their load errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
        self.failed.iter().map(|(name, error)| (name.as_str(), error.as_ref()))
    }

    /// Number of loaded tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Loads every source. A source that fails is recorded in the set instead
/// of aborting the others.
pub fn load_sources(specs: &[SourceSpec]) -> SourceSet {
    let mut sources = SourceSet::new();

    for spec in specs {
        match load(spec) {
            Ok(table) => sources.insert(spec.name.clone(), table),
            Err(error) => {
                log_error!("REPORT", "source {} failed to load: {}", spec.name, error);
                sources.record_failure(spec.name.clone(), error);
            }
        }
    }

    sources
}

// ============================================================================
// STEPS
// ============================================================================

type DatasetResult = Result<Table, Arc<PipelineError>>;

/// What a step can read besides its own table: the sources, the datasets
/// built so far and the name its pipeline started from.
pub struct StepInputs<'a> {
    origin: &'a str,
    sources: &'a SourceSet,
    datasets: Option<&'a HashMap<String, DatasetResult>>,
}

impl<'a> StepInputs<'a> {
    pub fn new(origin: &'a str, sources: &'a SourceSet) -> Self {
        StepInputs {
            origin,
            sources,
            datasets: None,
        }
    }

    fn with_datasets(mut self, datasets: &'a HashMap<String, DatasetResult>) -> Self {
        self.datasets = Some(datasets);
        self
    }

    /// A dataset name shadows a source of the same name.
    fn resolve(&self, name: &str) -> Result<Table, PipelineError> {
        match self.datasets.and_then(|datasets| datasets.get(name)) {
            Some(Ok(table)) => Ok(table.clone()),
            Some(Err(cause)) => Err(PipelineError::Dataset {
                name: name.to_string(),
                source: Arc::clone(cause),
            }),
            None => self.sources.table(name),
        }
    }
}

fn constant_column(name: &str, label: &str, rows: usize) -> Column {
    Column::categorical(name, std::iter::repeat(label).take(rows))
}

fn union(
    table: &Table,
    input: &str,
    labels: Option<(&str, &str, &str)>,
    inputs: &StepInputs<'_>,
) -> Result<Table, PipelineError> {
    let mut above = table.clone();
    let mut below = inputs.resolve(input)?;

    if let Some((column, label, input_label)) = labels {
        // Chained unions keep the labels already written
        if above.column(column).is_none() {
            above = above.with_column(constant_column(column, label, above.row_count()))?;
        }
        below = below.with_column(constant_column(column, input_label, below.row_count()))?;
    }

    Ok(above.append(&below)?)
}

/// Applies one step to a table.
pub fn apply_step(
    table: &Table,
    step: &Step,
    inputs: &StepInputs<'_>,
) -> Result<Table, PipelineError> {
    let result = match step {
        Step::Filter(predicate) => table.filter_by(predicate)?,
        Step::Derive(spec) => derive(table, spec)?,
        Step::Aggregate(definition) => aggregate(table, &definition.to_spec()?)?,
        Step::Select { columns } => {
            let names: Vec<&str> = columns.iter().map(String::as_str).collect();
            table.select(&names)?
        }
        Step::Drop { columns } => {
            let names: Vec<&str> = columns.iter().map(String::as_str).collect();
            table.drop_columns(&names)?
        }
        Step::DropIncomplete => table.drop_incomplete_columns(),
        Step::Union {
            input,
            label_column,
            label,
            input_label,
        } => {
            let labels = label_column.as_deref().map(|column| {
                (
                    column,
                    label.as_deref().unwrap_or(inputs.origin),
                    input_label.as_deref().unwrap_or(input),
                )
            });
            union(table, input, labels, inputs)?
        }
    };
    Ok(result)
}

/// Applies `steps` in order. The error names the step that failed.
pub fn run_steps(
    table: &Table,
    steps: &[Step],
    inputs: &StepInputs<'_>,
) -> Result<Table, PipelineError> {
    let mut current = table.clone();
    for (index, step) in steps.iter().enumerate() {
        current = apply_step(&current, step, inputs).map_err(|source| PipelineError::Step {
            index,
            step: step.name(),
            source: Box::new(source),
        })?;
        log_debug!(
            "REPORT",
            "step {} ({}) -> rows={} columns={}",
            index,
            step.name(),
            current.row_count(),
            current.column_count()
        );
    }
    Ok(current)
}

// ============================================================================
// RUNNER
// ============================================================================

/// Runs a report definition against loaded sources.
pub struct ReportRunner<'d> {
    definition: &'d ReportDefinition,
}

impl<'d> ReportRunner<'d> {
    pub fn new(definition: &'d ReportDefinition) -> Self {
        ReportRunner { definition }
    }

    /// Builds every declared dataset. Failed datasets are kept as errors so
    /// dependents can report the cause.
    pub fn build_datasets(&self, sources: &SourceSet) -> HashMap<String, DatasetResult> {
        let mut datasets: HashMap<String, DatasetResult> = HashMap::new();

        for dataset in &self.definition.datasets {
            let inputs = StepInputs::new(&dataset.input, sources).with_datasets(&datasets);
            let result = inputs
                .resolve(&dataset.input)
                .and_then(|table| run_steps(&table, &dataset.steps, &inputs))
                .map_err(Arc::new);

            match &result {
                Ok(table) => log_info!(
                    "REPORT",
                    "dataset {} rows={} columns={}",
                    dataset.name,
                    table.row_count(),
                    table.column_count()
                ),
                Err(error) => log_error!("REPORT", "dataset {} failed: {}", dataset.name, error),
            }
            datasets.insert(dataset.name.clone(), result);
        }

        datasets
    }

    /// Runs every section and chart. Narrative passes through untouched.
    pub fn run(&self, sources: &SourceSet) -> Vec<SectionInput> {
        log_enter!(
            "REPORT",
            "run",
            "sections={} datasets={}",
            self.definition.sections.len(),
            self.definition.datasets.len()
        );

        let datasets = self.build_datasets(sources);
        let sections: Vec<SectionInput> = self
            .definition
            .sections
            .iter()
            .map(|section| SectionInput {
                heading: section.heading.clone(),
                narrative: section.narrative.clone(),
                charts: section
                    .charts
                    .iter()
                    .map(|chart| ChartResult {
                        chart_id: chart.chart.id.clone(),
                        result: run_chart(chart, sources, &datasets),
                    })
                    .collect(),
            })
            .collect();

        log_exit!("REPORT", "run", "sections={}", sections.len());
        sections
    }

    /// Loads the sources, runs everything and assembles a page with
    /// placeholders for the charts that failed.
    pub fn render(&self) -> Report {
        let sources = load_sources(&self.definition.sources);
        assemble_with_placeholders(self.definition.title.clone(), self.run(&sources))
    }
}

fn run_chart(
    chart: &ChartDefinition,
    sources: &SourceSet,
    datasets: &HashMap<String, DatasetResult>,
) -> Result<RenderableChart, PipelineError> {
    let inputs = StepInputs::new(&chart.dataset, sources).with_datasets(datasets);
    let table = inputs.resolve(&chart.dataset)?;
    let shaped = run_steps(&table, &chart.steps, &inputs)?;
    let renderable = bind(&shaped, &chart.chart)?;
    log_debug!("REPORT", "chart {} bound from {} rows", chart.chart.id, shaped.row_count());
    Ok(renderable)
}
