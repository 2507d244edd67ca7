//! FILENAME: core/report-engine/src/assembler.rs
//! Report Assembler - Combines narrative and chart results into a Report.
//!
//! Section and chart order is exactly the order of the inputs. Strict
//! assembly fails when any chart failed and names every failure; lenient
//! assembly swaps failed charts for placeholders.

use chart_engine::RenderableChart;
use engine::{log_info, log_warn};

use crate::error::{AssemblyError, ChartFailure, PipelineError};
use crate::view::{ChartSlot, Report, Section};

/// The outcome of one chart pipeline.
#[derive(Debug)]
pub struct ChartResult {
    pub chart_id: String,
    pub result: Result<RenderableChart, PipelineError>,
}

impl ChartResult {
    pub fn ready(chart: RenderableChart) -> Self {
        ChartResult {
            chart_id: chart.id.clone(),
            result: Ok(chart),
        }
    }

    pub fn failed(chart_id: impl Into<String>, error: PipelineError) -> Self {
        ChartResult {
            chart_id: chart_id.into(),
            result: Err(error),
        }
    }
}

/// One section before assembly.
#[derive(Debug)]
pub struct SectionInput {
    pub heading: String,
    pub narrative: Vec<String>,
    pub charts: Vec<ChartResult>,
}

impl SectionInput {
    pub fn new(heading: impl Into<String>) -> Self {
        SectionInput {
            heading: heading.into(),
            narrative: Vec::new(),
            charts: Vec::new(),
        }
    }

    pub fn with_paragraph(mut self, text: impl Into<String>) -> Self {
        self.narrative.push(text.into());
        self
    }

    pub fn with_chart(mut self, chart: ChartResult) -> Self {
        self.charts.push(chart);
        self
    }
}

/// Builds a Report, failing if any chart failed. The error lists every
/// failed chart, not just the first.
pub fn assemble(title: Option<String>, inputs: Vec<SectionInput>) -> Result<Report, AssemblyError> {
    let mut sections = Vec::with_capacity(inputs.len());
    let mut failures = Vec::new();

    for input in inputs {
        let mut charts = Vec::with_capacity(input.charts.len());
        for chart in input.charts {
            match chart.result {
                Ok(renderable) => charts.push(ChartSlot::Ready(renderable)),
                Err(error) => failures.push(ChartFailure {
                    section: input.heading.clone(),
                    chart_id: chart.chart_id,
                    error,
                }),
            }
        }
        sections.push(Section {
            heading: input.heading,
            narrative: input.narrative,
            charts,
        });
    }

    if !failures.is_empty() {
        for failure in &failures {
            log_warn!("REPORT", "chart failed: {}", failure);
        }
        return Err(AssemblyError { failures });
    }

    log_info!("REPORT", "assembled sections={}", sections.len());
    Ok(Report { title, sections })
}

/// Builds a Report, replacing every failed chart with an Unavailable slot
/// that carries the failure reason.
pub fn assemble_with_placeholders(title: Option<String>, inputs: Vec<SectionInput>) -> Report {
    let mut unavailable = 0usize;

    let sections: Vec<Section> = inputs
        .into_iter()
        .map(|input| {
            let charts = input
                .charts
                .into_iter()
                .map(|chart| match chart.result {
                    Ok(renderable) => ChartSlot::Ready(renderable),
                    Err(error) => {
                        log_warn!(
                            "REPORT",
                            "chart {} in '{}' unavailable: {}",
                            chart.chart_id,
                            input.heading,
                            error
                        );
                        unavailable += 1;
                        ChartSlot::Unavailable {
                            chart_id: chart.chart_id,
                            reason: error.to_string(),
                        }
                    }
                })
                .collect();
            Section {
                heading: input.heading,
                narrative: input.narrative,
                charts,
            }
        })
        .collect();

    log_info!(
        "REPORT",
        "assembled sections={} unavailable_charts={}",
        sections.len(),
        unavailable
    );
    Report { title, sections }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_engine::{bind, ChartSpec};
    use engine::{Column, Table};

    fn sales_chart(id: &str) -> RenderableChart {
        let table = Table::new(vec![
            Column::text("product", ["A", "B"]),
            Column::numeric("qty", [4.0, 5.0]),
        ])
        .unwrap();
        bind(&table, &ChartSpec::bar(id, "product", "qty")).unwrap()
    }

    fn inputs() -> Vec<SectionInput> {
        vec![
            SectionInput::new("Overview")
                .with_paragraph("Sales by product.")
                .with_chart(ChartResult::ready(sales_chart("first"))),
            SectionInput::new("Details")
                .with_chart(ChartResult::failed(
                    "broken",
                    PipelineError::UnknownDataset("orders".to_string()),
                ))
                .with_chart(ChartResult::ready(sales_chart("second")))
                .with_chart(ChartResult::failed(
                    "also_broken",
                    PipelineError::UnknownSource("cases".to_string()),
                )),
        ]
    }

    #[test]
    fn test_assemble_keeps_order() {
        let inputs = vec![
            SectionInput::new("One").with_chart(ChartResult::ready(sales_chart("a"))),
            SectionInput::new("Two")
                .with_chart(ChartResult::ready(sales_chart("b")))
                .with_chart(ChartResult::ready(sales_chart("c"))),
        ];
        let report = assemble(Some("Sales".to_string()), inputs).unwrap();

        let headings: Vec<&str> = report.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["One", "Two"]);
        let ids: Vec<&str> = report.sections[1].charts.iter().map(|c| c.chart_id()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(report.title.as_deref(), Some("Sales"));
    }

    #[test]
    fn test_assemble_reports_every_failure() {
        let err = assemble(None, inputs()).unwrap_err();
        let ids: Vec<&str> = err.failures.iter().map(|f| f.chart_id.as_str()).collect();
        assert_eq!(ids, vec!["broken", "also_broken"]);
        assert_eq!(err.failures[0].section, "Details");

        let message = err.to_string();
        assert!(message.starts_with("2 chart(s) failed"));
        assert!(message.contains("orders"));
        assert!(message.contains("cases"));
    }

    #[test]
    fn test_placeholders_replace_failed_charts() {
        let report = assemble_with_placeholders(None, inputs());
        assert_eq!(report.unavailable_count(), 2);

        let ids: Vec<&str> = report.sections[1].charts.iter().map(|c| c.chart_id()).collect();
        assert_eq!(ids, vec!["broken", "second", "also_broken"]);
        match &report.sections[1].charts[0] {
            ChartSlot::Unavailable { reason, .. } => assert!(reason.contains("orders")),
            other => panic!("unexpected slot: {other:?}"),
        }
        assert!(report.chart("second").is_some());
        assert_eq!(report.sections[0].narrative, vec!["Sales by product.".to_string()]);
    }

    #[test]
    fn test_empty_report() {
        let report = assemble(None, Vec::new()).unwrap();
        assert!(report.sections.is_empty());
        assert_eq!(report, Report::default());
    }
}
