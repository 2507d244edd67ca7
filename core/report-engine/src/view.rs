//! FILENAME: core/report-engine/src/view.rs
//! Report View - The assembled page handed to the presentation layer.

use chart_engine::RenderableChart;
use serde::{Deserialize, Serialize};

/// What occupies a chart position in a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartSlot {
    Ready(RenderableChart),
    /// The chart failed; the renderer shows `reason` in its place.
    Unavailable { chart_id: String, reason: String },
}

impl ChartSlot {
    pub fn chart_id(&self) -> &str {
        match self {
            ChartSlot::Ready(chart) => &chart.id,
            ChartSlot::Unavailable { chart_id, .. } => chart_id,
        }
    }

    pub fn chart(&self) -> Option<&RenderableChart> {
        match self {
            ChartSlot::Ready(chart) => Some(chart),
            ChartSlot::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ChartSlot::Ready(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    /// Paragraphs, in reading order.
    pub narrative: Vec<String>,
    /// Charts in declaration order.
    pub charts: Vec<ChartSlot>,
}

/// An ordered list of sections, ready to render.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Report {
    pub title: Option<String>,
    pub sections: Vec<Section>,
}

impl Report {
    /// Looks a chart slot up by id across all sections.
    pub fn chart_slot(&self, chart_id: &str) -> Option<&ChartSlot> {
        self.sections
            .iter()
            .flat_map(|s| s.charts.iter())
            .find(|slot| slot.chart_id() == chart_id)
    }

    pub fn chart(&self, chart_id: &str) -> Option<&RenderableChart> {
        self.chart_slot(chart_id).and_then(ChartSlot::chart)
    }

    pub fn unavailable_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| s.charts.iter())
            .filter(|slot| !slot.is_ready())
            .count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
