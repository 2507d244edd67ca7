//! FILENAME: core/chart-engine/src/view.rs
//! Chart View - Renderable output for the presentation layer.
//!
//! A RenderableChart has every field reference resolved: it carries the
//! actual points, cells, nodes or markers plus their display text, so the
//! renderer never looks at the source table.

use engine::Value;
use serde::{Deserialize, Serialize};

use crate::definition::Orientation;

// ============================================================================
// BAR / LINE
// ============================================================================

/// Which value axis a series is drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Primary,
    Secondary,
}

/// One point of a bar or line series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Raw x value, kept for ordering and time axes.
    pub x: Value,
    pub x_label: String,
    /// None draws a gap.
    pub y: Option<f64>,
    /// Formatted y, empty for gaps.
    pub y_text: String,
    pub hover: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Legend entry: the y field, or the colour value when split by colour.
    pub name: String,
    /// Source field of the y values.
    pub field: String,
    pub axis: Axis,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianView {
    pub orientation: Orientation,
    pub series: Vec<Series>,
}

impl CartesianView {
    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }
}

// ============================================================================
// HEATMAP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    /// None when the (row, column) combination has no data.
    pub value: Option<f64>,
    pub text: String,
    /// A row for this combination exists, even if its value is missing.
    pub observed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixView {
    pub row_keys: Vec<Value>,
    pub row_labels: Vec<String>,
    pub column_keys: Vec<Value>,
    pub column_labels: Vec<String>,
    /// `cells[row][column]`.
    pub cells: Vec<Vec<MatrixCell>>,
    /// Range of the observed values, for the colour scale.
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub color_scale: Option<String>,
}

impl MatrixView {
    /// Looks a cell up by its row and column labels.
    pub fn cell(&self, row_label: &str, column_label: &str) -> Option<&MatrixCell> {
        let row = self.row_labels.iter().position(|l| l == row_label)?;
        let column = self.column_labels.iter().position(|l| l == column_label)?;
        self.cells.get(row)?.get(column)
    }

    pub fn value(&self, row_label: &str, column_label: &str) -> Option<f64> {
        self.cell(row_label, column_label).and_then(|cell| cell.value)
    }
}

// ============================================================================
// HIERARCHY
// ============================================================================

/// A node of a part-to-whole tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub label: String,
    /// Labels from the outermost level down to this node.
    pub path: Vec<String>,
    pub value: f64,
    /// value / parent value; top-level nodes divide by the grand total.
    pub share_of_parent: f64,
    /// value / grand total.
    pub share_of_root: f64,
    /// e.g. "DKI Jakarta 32%".
    pub text: String,
    pub children: Vec<HierarchyNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyView {
    pub total: f64,
    pub nodes: Vec<HierarchyNode>,
}

impl HierarchyView {
    /// Finds the node at `path` (outermost label first).
    pub fn find(&self, path: &[&str]) -> Option<&HierarchyNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.iter().find(|n| n.label == *first)?;
        for label in rest {
            node = node.children.iter().find(|n| n.label == *label)?;
        }
        Some(node)
    }
}

// ============================================================================
// GEOGRAPHIC
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub position: GeoCoordinate,
    /// Unscaled size value.
    pub size: Option<f64>,
    /// size * size_scale.
    pub radius: Option<f64>,
    pub label: Option<String>,
    /// e.g. "DKI Jakarta: 10,321 cases" style text built from label and size.
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoView {
    /// Mean of all point positions; None without points.
    pub center: Option<GeoCoordinate>,
    pub points: Vec<GeoPoint>,
}

// ============================================================================
// RENDERABLE CHART
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ChartBody {
    Bar(CartesianView),
    Line(CartesianView),
    HeatmapMatrix(MatrixView),
    HierarchicalProportion(HierarchyView),
    GeographicPoint(GeoView),
}

/// A fully bound chart. Contains no unresolved field references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderableChart {
    pub id: String,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub secondary_y_label: Option<String>,
    pub show_legend: bool,
    pub body: ChartBody,
}

impl RenderableChart {
    pub fn as_cartesian(&self) -> Option<&CartesianView> {
        match &self.body {
            ChartBody::Bar(view) | ChartBody::Line(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&MatrixView> {
        match &self.body {
            ChartBody::HeatmapMatrix(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_hierarchy(&self) -> Option<&HierarchyView> {
        match &self.body {
            ChartBody::HierarchicalProportion(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_geo(&self) -> Option<&GeoView> {
        match &self.body {
            ChartBody::GeographicPoint(view) => Some(view),
            _ => None,
        }
    }
}
