//! FILENAME: core/chart-engine/src/definition.rs
//! Chart Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a chart: its kind,
//! which table columns feed which visual channel, and display options.
//! These structures are designed to be:
//! - Serializable (report definitions are plain JSON)
//! - Built per report section and never persisted on their own
//! - Free of data: binding resolves them against a Table

use engine::{NumberFormat, Value};
use serde::{Deserialize, Serialize};

// ============================================================================
// DISPLAY OPTIONS
// ============================================================================

/// Bar direction. Horizontal bars put categories on the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Presentation settings shared by every chart kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    /// Label of the secondary value axis (bar + line overlays).
    pub secondary_y_label: Option<String>,
    /// Format for every numeric value the chart displays.
    pub number_format: NumberFormat,
    pub show_legend: bool,
    /// Named colour scale for heatmaps (e.g., "YlGnBu").
    pub color_scale: Option<String>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            title: None,
            x_label: None,
            y_label: None,
            secondary_y_label: None,
            number_format: NumberFormat::General,
            show_legend: true,
            color_scale: None,
        }
    }
}

// ============================================================================
// FIELD BINDINGS
// ============================================================================

/// Bindings for bar and line charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianBinding {
    /// Category (bar) or position (line) field.
    pub x: String,
    /// One series per field. Must be numeric.
    pub y: Vec<String>,
    /// Splits every y field into one series per distinct value.
    #[serde(default)]
    pub color: Option<String>,
    /// Field shown as the hover title of each point.
    #[serde(default)]
    pub hover: Option<String>,
    /// Numeric field drawn on a second value axis.
    #[serde(default)]
    pub secondary_y: Option<String>,
    #[serde(default)]
    pub orientation: Orientation,
    /// For timestamp x fields: insert an empty point for every calendar day
    /// missing between the first and last observation.
    #[serde(default)]
    pub fill_missing_days: bool,
}

/// Bindings for a row x column heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixBinding {
    pub rows: String,
    pub columns: String,
    pub value: String,
    /// Exactly these row keys, in this order. Keys not listed are dropped,
    /// listed keys without data become empty rows.
    #[serde(default)]
    pub row_order: Option<Vec<Value>>,
    #[serde(default)]
    pub column_order: Option<Vec<Value>>,
}

/// Bindings for sunburst / treemap style charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyBinding {
    /// Label fields from the outermost level inwards.
    pub path: Vec<String>,
    /// Non-negative leaf size.
    pub value: String,
}

/// Bindings for point markers on a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoBinding {
    pub latitude: String,
    pub longitude: String,
    /// Numeric field driving the marker radius.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    /// Radius = size * size_scale.
    #[serde(default = "default_size_scale")]
    pub size_scale: f64,
}

fn default_size_scale() -> f64 {
    1.0
}

/// The chart kind together with its kind-specific bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ChartBinding {
    Bar(CartesianBinding),
    Line(CartesianBinding),
    HeatmapMatrix(MatrixBinding),
    HierarchicalProportion(HierarchyBinding),
    GeographicPoint(GeoBinding),
}

impl ChartBinding {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ChartBinding::Bar(_) => "bar",
            ChartBinding::Line(_) => "line",
            ChartBinding::HeatmapMatrix(_) => "heatmap-matrix",
            ChartBinding::HierarchicalProportion(_) => "hierarchical-proportion",
            ChartBinding::GeographicPoint(_) => "geographic-point",
        }
    }

    /// Every field the chart reads, in binding order.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ChartBinding::Bar(b) | ChartBinding::Line(b) => std::iter::once(b.x.as_str())
                .chain(b.y.iter().map(String::as_str))
                .chain(b.color.as_deref())
                .chain(b.hover.as_deref())
                .chain(b.secondary_y.as_deref())
                .collect(),
            ChartBinding::HeatmapMatrix(b) => {
                vec![b.rows.as_str(), b.columns.as_str(), b.value.as_str()]
            }
            ChartBinding::HierarchicalProportion(b) => b
                .path
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(b.value.as_str()))
                .collect(),
            ChartBinding::GeographicPoint(b) => [b.latitude.as_str(), b.longitude.as_str()]
                .into_iter()
                .chain(b.size.as_deref())
                .chain(b.label.as_deref())
                .collect(),
        }
    }
}

// ============================================================================
// CHART SPEC
// ============================================================================

/// A complete chart description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Identifier, unique within a report.
    pub id: String,
    #[serde(flatten)]
    pub binding: ChartBinding,
    #[serde(default)]
    pub display: DisplayOptions,
}

impl ChartSpec {
    pub fn new(id: impl Into<String>, binding: ChartBinding) -> Self {
        ChartSpec {
            id: id.into(),
            binding,
            display: DisplayOptions::default(),
        }
    }

    /// Bar chart of `y` per `x`.
    pub fn bar(id: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self::new(id, ChartBinding::Bar(CartesianBinding::new(x, y)))
    }

    /// Line chart of `y` along `x`.
    pub fn line(id: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self::new(id, ChartBinding::Line(CartesianBinding::new(x, y)))
    }

    pub fn heatmap(
        id: impl Into<String>,
        rows: impl Into<String>,
        columns: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            ChartBinding::HeatmapMatrix(MatrixBinding {
                rows: rows.into(),
                columns: columns.into(),
                value: value.into(),
                row_order: None,
                column_order: None,
            }),
        )
    }

    pub fn hierarchy(id: impl Into<String>, path: &[&str], value: impl Into<String>) -> Self {
        Self::new(
            id,
            ChartBinding::HierarchicalProportion(HierarchyBinding {
                path: path.iter().map(|p| p.to_string()).collect(),
                value: value.into(),
            }),
        )
    }

    pub fn geo(
        id: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            ChartBinding::GeographicPoint(GeoBinding {
                latitude: latitude.into(),
                longitude: longitude.into(),
                size: None,
                label: None,
                size_scale: default_size_scale(),
            }),
        )
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.display.title = Some(title.into());
        self
    }

    pub fn with_axis_labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.display.x_label = Some(x.into());
        self.display.y_label = Some(y.into());
        self
    }

    pub fn with_number_format(mut self, format: NumberFormat) -> Self {
        self.display.number_format = format;
        self
    }

    pub fn without_legend(mut self) -> Self {
        self.display.show_legend = false;
        self
    }

    /// Adjusts the kind-specific bindings in place.
    pub fn map_binding(mut self, f: impl FnOnce(&mut ChartBinding)) -> Self {
        f(&mut self.binding);
        self
    }
}

impl CartesianBinding {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        CartesianBinding {
            x: x.into(),
            y: vec![y.into()],
            color: None,
            hover: None,
            secondary_y: None,
            orientation: Orientation::Vertical,
            fill_missing_days: false,
        }
    }
}
