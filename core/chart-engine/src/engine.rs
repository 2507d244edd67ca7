//! FILENAME: core/chart-engine/src/engine.rs
//! Chart Binding Engine - Resolves a ChartSpec against a Table.
//!
//! Binding is a pure mapping: every referenced field must exist and numeric
//! channels must be fed by numeric columns. No aggregation happens here; the
//! table is expected to be shaped already.

use chrono::{Duration, NaiveTime};
use engine::{
    format_number, format_value, log_debug, log_enter, log_exit, Column, ColumnType, NumberFormat,
    Table, Value,
};
use rustc_hash::FxHashMap;

use crate::definition::{
    CartesianBinding, ChartBinding, ChartSpec, DisplayOptions, GeoBinding, HierarchyBinding,
    MatrixBinding,
};
use crate::error::FieldBindingError;
use crate::view::{
    Axis, CartesianView, ChartBody, GeoCoordinate, GeoPoint, GeoView, HierarchyNode, HierarchyView,
    MatrixCell, MatrixView, RenderableChart, Series, SeriesPoint,
};

/// Display label for missing category values.
pub const BLANK_LABEL: &str = "(blank)";

// ============================================================================
// FIELD HELPERS
// ============================================================================

fn field<'t>(table: &'t Table, name: &str) -> Result<&'t Column, FieldBindingError> {
    table
        .column(name)
        .ok_or_else(|| FieldBindingError::UnknownField(name.to_string()))
}

fn numeric_field<'t>(
    table: &'t Table,
    name: &str,
    channel: &'static str,
) -> Result<&'t Column, FieldBindingError> {
    let column = field(table, name)?;
    match column.column_type() {
        ColumnType::Numeric => Ok(column),
        found => Err(FieldBindingError::NonNumericField {
            field: name.to_string(),
            channel,
            found,
        }),
    }
}

fn label(value: &Value) -> String {
    if value.is_missing() {
        BLANK_LABEL.to_string()
    } else {
        value.display()
    }
}

fn required_number(column: &Column, row: usize) -> Result<f64, FieldBindingError> {
    column.values()[row]
        .as_f64()
        .ok_or_else(|| FieldBindingError::MissingValue {
            field: column.name().to_string(),
            row,
        })
}

// ============================================================================
// BAR / LINE
// ============================================================================

fn series_points(
    x: &Column,
    y: &Column,
    hover: Option<&Column>,
    rows: &[usize],
    format: &NumberFormat,
) -> Vec<SeriesPoint> {
    rows.iter()
        .map(|&row| {
            let y_value = &y.values()[row];
            SeriesPoint {
                x: x.values()[row].clone(),
                x_label: label(&x.values()[row]),
                y: y_value.as_f64(),
                y_text: format_value(y_value, format),
                hover: hover.map(|h| label(&h.values()[row])),
            }
        })
        .collect()
}

/// Inserts an empty point for every calendar day missing between two
/// consecutive timestamp points.
fn fill_missing_days(points: Vec<SeriesPoint>) -> Vec<SeriesPoint> {
    let mut filled: Vec<SeriesPoint> = Vec::with_capacity(points.len());
    for point in points {
        if let (Some(prev), Some(next)) = (
            filled.last().and_then(|p: &SeriesPoint| p.x.as_timestamp()),
            point.x.as_timestamp(),
        ) {
            let mut day = prev.date() + Duration::days(1);
            while day < next.date() {
                let x = Value::Timestamp(day.and_time(NaiveTime::MIN));
                filled.push(SeriesPoint {
                    x_label: x.display(),
                    x,
                    y: None,
                    y_text: String::new(),
                    hover: None,
                });
                day += Duration::days(1);
            }
        }
        filled.push(point);
    }
    filled
}

fn bind_cartesian(
    table: &Table,
    chart_id: &str,
    binding: &CartesianBinding,
    display: &DisplayOptions,
) -> Result<CartesianView, FieldBindingError> {
    if binding.y.is_empty() {
        return Err(FieldBindingError::EmptyBinding {
            chart: chart_id.to_string(),
            channel: "y",
        });
    }

    let x = field(table, &binding.x)?;
    let ys = binding
        .y
        .iter()
        .map(|name| numeric_field(table, name, "y"))
        .collect::<Result<Vec<_>, _>>()?;
    let hover = binding.hover.as_deref().map(|name| field(table, name)).transpose()?;
    let color = binding.color.as_deref().map(|name| field(table, name)).transpose()?;
    let secondary = binding
        .secondary_y
        .as_deref()
        .map(|name| numeric_field(table, name, "secondary_y"))
        .transpose()?;

    let all_rows: Vec<usize> = (0..table.row_count()).collect();

    // Colour groups in first-seen order
    let groups: Vec<(Option<String>, Vec<usize>)> = match color {
        Some(color) => {
            let mut order: Vec<(Option<String>, Vec<usize>)> = Vec::new();
            let mut index: FxHashMap<&Value, usize> = FxHashMap::default();
            for (row, value) in color.values().iter().enumerate() {
                let slot = *index.entry(value).or_insert_with(|| {
                    order.push((Some(label(value)), Vec::new()));
                    order.len() - 1
                });
                order[slot].1.push(row);
            }
            order
        }
        None => vec![(None, all_rows.clone())],
    };

    let mut series = Vec::with_capacity(ys.len() * groups.len() + 1);
    for y in &ys {
        for (group, rows) in &groups {
            let name = match group {
                Some(group) if ys.len() == 1 => group.clone(),
                Some(group) => format!("{} ({})", y.name(), group),
                None => y.name().to_string(),
            };
            series.push(Series {
                name,
                field: y.name().to_string(),
                axis: Axis::Primary,
                points: series_points(x, y, hover, rows, &display.number_format),
            });
        }
    }

    if let Some(secondary) = secondary {
        series.push(Series {
            name: secondary.name().to_string(),
            field: secondary.name().to_string(),
            axis: Axis::Secondary,
            points: series_points(x, secondary, hover, &all_rows, &display.number_format),
        });
    }

    if binding.fill_missing_days && x.column_type() == ColumnType::Timestamp {
        for s in &mut series {
            s.points = fill_missing_days(std::mem::take(&mut s.points));
        }
    }

    Ok(CartesianView {
        orientation: binding.orientation,
        series,
    })
}

// ============================================================================
// HEATMAP
// ============================================================================

/// Explicit order (coerced to the column type) or observed keys ascending.
fn matrix_keys(column: &Column, explicit: Option<&Vec<Value>>) -> Vec<Value> {
    match explicit {
        Some(order) => {
            let mut keys: Vec<Value> = Vec::with_capacity(order.len());
            for key in order.iter().map(|k| k.coerce_to(column.column_type())) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            keys
        }
        None => {
            let mut keys: Vec<Value> = column.values().to_vec();
            keys.sort();
            keys.dedup();
            keys
        }
    }
}

fn bind_matrix(
    table: &Table,
    binding: &MatrixBinding,
    display: &DisplayOptions,
) -> Result<MatrixView, FieldBindingError> {
    let rows = field(table, &binding.rows)?;
    let columns = field(table, &binding.columns)?;
    let values = numeric_field(table, &binding.value, "value")?;

    let row_keys = matrix_keys(rows, binding.row_order.as_ref());
    let column_keys = matrix_keys(columns, binding.column_order.as_ref());

    let mut observed: FxHashMap<(&Value, &Value), Option<f64>> = FxHashMap::default();
    for row in 0..table.row_count() {
        let key = (&rows.values()[row], &columns.values()[row]);
        if observed.insert(key, values.values()[row].as_f64()).is_some() {
            return Err(FieldBindingError::DuplicateCell {
                row: label(key.0),
                column: label(key.1),
            });
        }
    }

    let cells: Vec<Vec<MatrixCell>> = row_keys
        .iter()
        .map(|r| {
            column_keys
                .iter()
                .map(|c| {
                    let cell = observed.get(&(r, c)).copied();
                    let value = cell.flatten();
                    MatrixCell {
                        value,
                        text: value
                            .map(|v| format_number(v, &display.number_format))
                            .unwrap_or_default(),
                        observed: cell.is_some(),
                    }
                })
                .collect()
        })
        .collect();

    let present = cells.iter().flatten().filter_map(|cell| cell.value);
    let (min, max) = present.fold((None, None), |(min, max): (Option<f64>, Option<f64>), v| {
        (
            Some(min.map_or(v, |m| m.min(v))),
            Some(max.map_or(v, |m| m.max(v))),
        )
    });

    Ok(MatrixView {
        row_labels: row_keys.iter().map(label).collect(),
        column_labels: column_keys.iter().map(label).collect(),
        row_keys,
        column_keys,
        cells,
        min,
        max,
        color_scale: display.color_scale.clone(),
    })
}

// ============================================================================
// HIERARCHY
// ============================================================================

/// Tree under construction; children keep first-seen order. Nodes are
/// keyed on the level value, so a missing value and a literal "(blank)"
/// text stay separate nodes.
#[derive(Default)]
struct NodeBuilder {
    key: Value,
    value: f64,
    children: Vec<NodeBuilder>,
}

impl NodeBuilder {
    fn child(&mut self, key: &Value) -> &mut NodeBuilder {
        let pos = match self.children.iter().position(|c| c.key == *key) {
            Some(pos) => pos,
            None => {
                self.children.push(NodeBuilder {
                    key: key.clone(),
                    ..NodeBuilder::default()
                });
                self.children.len() - 1
            }
        };
        &mut self.children[pos]
    }

    fn finish(self, parent_path: &[String], parent_total: f64, root_total: f64) -> HierarchyNode {
        let share = |total: f64| if total != 0.0 { self.value / total } else { 0.0 };
        let share_of_parent = share(parent_total);
        let share_of_root = share(root_total);

        let label = label(&self.key);
        let mut path = parent_path.to_vec();
        path.push(label.clone());

        let text = format!(
            "{} {}",
            label,
            format_number(share_of_parent, &NumberFormat::percent(0))
        );
        let value = self.value;
        let children = self
            .children
            .into_iter()
            .map(|child| child.finish(&path, value, root_total))
            .collect();

        HierarchyNode {
            label,
            path,
            value,
            share_of_parent,
            share_of_root,
            text,
            children,
        }
    }
}

fn bind_hierarchy(
    table: &Table,
    chart_id: &str,
    binding: &HierarchyBinding,
) -> Result<HierarchyView, FieldBindingError> {
    if binding.path.is_empty() {
        return Err(FieldBindingError::EmptyBinding {
            chart: chart_id.to_string(),
            channel: "path",
        });
    }

    let levels = binding
        .path
        .iter()
        .map(|name| field(table, name))
        .collect::<Result<Vec<_>, _>>()?;
    let values = numeric_field(table, &binding.value, "value")?;

    let mut root = NodeBuilder::default();
    for row in 0..table.row_count() {
        let value = required_number(values, row)?;
        if !value.is_finite() {
            return Err(FieldBindingError::NonFiniteValue {
                field: values.name().to_string(),
                row,
                value,
            });
        }
        if value < 0.0 {
            return Err(FieldBindingError::NegativeValue {
                field: values.name().to_string(),
                row,
                value,
            });
        }

        root.value += value;
        let mut node = &mut root;
        for level in &levels {
            node = node.child(&level.values()[row]);
            node.value += value;
        }
    }

    let total = root.value;
    let nodes = root
        .children
        .into_iter()
        .map(|child| child.finish(&[], total, total))
        .collect();

    Ok(HierarchyView { total, nodes })
}

// ============================================================================
// GEOGRAPHIC
// ============================================================================

fn bind_geo(
    table: &Table,
    binding: &GeoBinding,
    display: &DisplayOptions,
) -> Result<GeoView, FieldBindingError> {
    let latitude = numeric_field(table, &binding.latitude, "latitude")?;
    let longitude = numeric_field(table, &binding.longitude, "longitude")?;
    let size = binding
        .size
        .as_deref()
        .map(|name| numeric_field(table, name, "size"))
        .transpose()?;
    let labels = binding.label.as_deref().map(|name| field(table, name)).transpose()?;

    let mut points = Vec::with_capacity(table.row_count());
    for row in 0..table.row_count() {
        let position = GeoCoordinate {
            latitude: required_number(latitude, row)?,
            longitude: required_number(longitude, row)?,
        };
        let size_value = size.and_then(|column| column.values()[row].as_f64());
        let label_text = labels.map(|column| label(&column.values()[row]));
        let size_text = size_value.map(|v| format_number(v, &display.number_format));

        let tooltip = match (&label_text, &size_text) {
            (Some(l), Some(s)) => format!("{}: {}", l, s),
            (Some(l), None) => l.clone(),
            (None, Some(s)) => s.clone(),
            (None, None) => format!("{}, {}", position.latitude, position.longitude),
        };

        points.push(GeoPoint {
            position,
            size: size_value,
            radius: size_value.map(|v| v * binding.size_scale),
            label: label_text,
            tooltip,
        });
    }

    let center = if points.is_empty() {
        None
    } else {
        let n = points.len() as f64;
        Some(GeoCoordinate {
            latitude: points.iter().map(|p| p.position.latitude).sum::<f64>() / n,
            longitude: points.iter().map(|p| p.position.longitude).sum::<f64>() / n,
        })
    };

    Ok(GeoView { center, points })
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Resolves `spec` against `table` into a renderable chart.
pub fn bind(table: &Table, spec: &ChartSpec) -> Result<RenderableChart, FieldBindingError> {
    log_enter!(
        "CHART",
        "bind",
        "id={} kind={} rows={}",
        spec.id,
        spec.binding.kind_name(),
        table.row_count()
    );

    if let Some(missing) = spec.binding.fields().into_iter().find(|f| table.column(f).is_none()) {
        log_debug!("CHART", "chart {} references unknown field {}", spec.id, missing);
        return Err(FieldBindingError::UnknownField(missing.to_string()));
    }

    let display = &spec.display;
    let body = match &spec.binding {
        ChartBinding::Bar(b) => ChartBody::Bar(bind_cartesian(table, &spec.id, b, display)?),
        ChartBinding::Line(b) => ChartBody::Line(bind_cartesian(table, &spec.id, b, display)?),
        ChartBinding::HeatmapMatrix(b) => ChartBody::HeatmapMatrix(bind_matrix(table, b, display)?),
        ChartBinding::HierarchicalProportion(b) => {
            ChartBody::HierarchicalProportion(bind_hierarchy(table, &spec.id, b)?)
        }
        ChartBinding::GeographicPoint(b) => {
            ChartBody::GeographicPoint(bind_geo(table, b, display)?)
        }
    };

    log_exit!("CHART", "bind", "id={}", spec.id);
    Ok(RenderableChart {
        id: spec.id.clone(),
        title: display.title.clone(),
        x_label: display.x_label.clone(),
        y_label: display.y_label.clone(),
        secondary_y_label: display.secondary_y_label.clone(),
        show_legend: display.show_legend,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Orientation;

    fn heatmap_table() -> Table {
        Table::new(vec![
            Column::text("day", ["A", "A", "B", "B"]),
            Column::numeric("hour", [1.0, 2.0, 3.0, 1.0]),
            Column::numeric("sales", [10.0, 20.0, 0.0, 5.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_heatmap_missing_is_not_zero() {
        let spec = ChartSpec::heatmap("h", "day", "hour", "sales");
        let chart = bind(&heatmap_table(), &spec).unwrap();
        let matrix = chart.as_matrix().unwrap();

        assert_eq!(matrix.row_labels, vec!["A", "B"]);
        assert_eq!(matrix.column_labels, vec!["1", "2", "3"]);
        assert_eq!(matrix.value("A", "1"), Some(10.0));
        assert_eq!(matrix.value("A", "2"), Some(20.0));
        assert_eq!(matrix.value("A", "3"), None);
        assert_eq!(matrix.cell("A", "3").unwrap().text, "");
        // Observed zero stays a zero
        assert_eq!(matrix.value("B", "3"), Some(0.0));
        assert_eq!(matrix.min, Some(0.0));
        assert_eq!(matrix.max, Some(20.0));
    }

    #[test]
    fn test_heatmap_explicit_order_reindexes() {
        let spec = ChartSpec::heatmap("h", "day", "hour", "sales").map_binding(|b| {
            if let ChartBinding::HeatmapMatrix(m) = b {
                m.row_order = Some(vec![Value::text("C"), Value::text("B")]);
            }
        });
        let chart = bind(&heatmap_table(), &spec).unwrap();
        let matrix = chart.as_matrix().unwrap();

        assert_eq!(matrix.row_labels, vec!["C", "B"]);
        assert!(matrix.cells[0].iter().all(|cell| cell.value.is_none()));
        assert_eq!(matrix.value("B", "1"), Some(5.0));
        assert!(matrix.cell("A", "1").is_none());
    }

    #[test]
    fn test_heatmap_observed_missing_differs_from_absent() {
        let table = Table::new(vec![
            Column::text("day", ["A", "B"]),
            Column::numeric("hour", [1.0, 2.0]),
            Column::new("sales", ColumnType::Numeric, vec![Value::Missing, Value::Number(3.0)])
                .unwrap(),
        ])
        .unwrap();
        let chart = bind(&table, &ChartSpec::heatmap("h", "day", "hour", "sales")).unwrap();
        let matrix = chart.as_matrix().unwrap();

        let recorded = matrix.cell("A", "1").unwrap();
        assert_eq!(recorded.value, None);
        assert!(recorded.observed);

        let absent = matrix.cell("A", "2").unwrap();
        assert_eq!(absent.value, None);
        assert!(!absent.observed);

        assert!(matrix.cell("B", "2").unwrap().observed);
        assert_eq!(matrix.min, Some(3.0));
    }

    #[test]
    fn test_heatmap_duplicate_cell() {
        let table = Table::new(vec![
            Column::text("day", ["A", "A"]),
            Column::numeric("hour", [1.0, 1.0]),
            Column::numeric("sales", [1.0, 2.0]),
        ])
        .unwrap();
        let err = bind(&table, &ChartSpec::heatmap("h", "day", "hour", "sales")).unwrap_err();
        assert_eq!(
            err,
            FieldBindingError::DuplicateCell {
                row: "A".to_string(),
                column: "1".to_string()
            }
        );
    }

    #[test]
    fn test_hierarchy_shares() {
        let table = Table::new(vec![
            Column::text("island", ["Java", "Java", "Sumatra"]),
            Column::text("location", ["DKI Jakarta", "Jawa Barat", "Riau"]),
            Column::numeric("cases", [32.0, 20.0, 48.0]),
        ])
        .unwrap();
        let spec = ChartSpec::hierarchy("s", &["island", "location"], "cases");
        let chart = bind(&table, &spec).unwrap();
        let tree = chart.as_hierarchy().unwrap();

        assert_eq!(tree.total, 100.0);
        let java = tree.find(&["Java"]).unwrap();
        assert_eq!(java.value, 52.0);
        assert_eq!(java.share_of_parent, 0.52);

        let dki = tree.find(&["Java", "DKI Jakarta"]).unwrap();
        assert_eq!(dki.share_of_parent, 32.0 / 52.0);
        assert_eq!(dki.share_of_root, 0.32);
        assert_eq!(dki.text, "DKI Jakarta 62%");
        assert_eq!(dki.path, vec!["Java", "DKI Jakarta"]);
    }

    #[test]
    fn test_hierarchy_rejects_bad_values() {
        let negative = Table::new(vec![
            Column::text("k", ["a", "b"]),
            Column::numeric("v", [1.0, -2.0]),
        ])
        .unwrap();
        assert!(matches!(
            bind(&negative, &ChartSpec::hierarchy("s", &["k"], "v")),
            Err(FieldBindingError::NegativeValue { row: 1, .. })
        ));

        // NaN would otherwise spread into every ancestor share
        let nan = Table::new(vec![
            Column::text("k", ["a", "b"]),
            Column::numeric("v", [1.0, f64::NAN]),
        ])
        .unwrap();
        assert!(matches!(
            bind(&nan, &ChartSpec::hierarchy("s", &["k"], "v")),
            Err(FieldBindingError::NonFiniteValue { row: 1, .. })
        ));

        let missing = Table::new(vec![
            Column::text("k", ["a"]),
            Column::new("v", ColumnType::Numeric, vec![Value::Missing]).unwrap(),
        ])
        .unwrap();
        assert!(matches!(
            bind(&missing, &ChartSpec::hierarchy("s", &["k"], "v")),
            Err(FieldBindingError::MissingValue { row: 0, .. })
        ));
    }

    #[test]
    fn test_hierarchy_zero_total_and_blank_labels() {
        let table = Table::new(vec![
            Column::new("k", ColumnType::String, vec![Value::Missing]).unwrap(),
            Column::numeric("v", [0.0]),
        ])
        .unwrap();
        let tree = bind(&table, &ChartSpec::hierarchy("s", &["k"], "v")).unwrap();
        let node = tree.as_hierarchy().unwrap().find(&[BLANK_LABEL]).unwrap();
        assert_eq!(node.share_of_parent, 0.0);
        assert_eq!(node.share_of_root, 0.0);
    }

    #[test]
    fn test_hierarchy_missing_and_blank_text_stay_apart() {
        let table = Table::new(vec![
            Column::new(
                "k",
                ColumnType::String,
                vec![Value::Missing, Value::text(BLANK_LABEL), Value::Missing],
            )
            .unwrap(),
            Column::numeric("v", [1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let chart = bind(&table, &ChartSpec::hierarchy("s", &["k"], "v")).unwrap();
        let tree = chart.as_hierarchy().unwrap();

        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.nodes[0].label, BLANK_LABEL);
        assert_eq!(tree.nodes[0].value, 4.0);
        assert_eq!(tree.nodes[1].label, BLANK_LABEL);
        assert_eq!(tree.nodes[1].value, 2.0);
    }

    #[test]
    fn test_bar_with_color_and_secondary_axis() {
        let table = Table::new(vec![
            Column::text("location", ["Jakarta", "Bali", "Riau"]),
            Column::numeric("total_cases", [300.0, 100.0, 200.0]),
            Column::numeric("population_density", [16000.0, 750.0, 80.0]),
        ])
        .unwrap();
        let spec = ChartSpec::bar("cases", "location", "total_cases")
            .with_number_format(NumberFormat::grouped(0))
            .map_binding(|b| {
                if let ChartBinding::Bar(c) = b {
                    c.color = Some("location".to_string());
                    c.secondary_y = Some("population_density".to_string());
                    c.orientation = Orientation::Horizontal;
                }
            });
        let chart = bind(&table, &spec).unwrap();
        let view = chart.as_cartesian().unwrap();

        assert_eq!(view.orientation, Orientation::Horizontal);
        assert_eq!(view.series.len(), 4);
        assert_eq!(view.series_named("Bali").unwrap().points[0].y, Some(100.0));
        let density = view.series_named("population_density").unwrap();
        assert_eq!(density.axis, Axis::Secondary);
        assert_eq!(density.points[0].y_text, "16,000");
    }

    #[test]
    fn test_line_gaps_and_missing_days() {
        let day = |d: u32| {
            let date = chrono::NaiveDate::from_ymd_opt(2023, 1, d).unwrap();
            Value::Timestamp(date.and_time(NaiveTime::MIN))
        };
        let sales = vec![Value::Number(5.0), Value::Missing, Value::Number(7.0)];
        let table = Table::new(vec![
            Column::new("date", ColumnType::Timestamp, vec![day(1), day(2), day(5)]).unwrap(),
            Column::new("sales", ColumnType::Numeric, sales).unwrap(),
        ])
        .unwrap();
        let spec = ChartSpec::line("trend", "date", "sales").map_binding(|b| {
            if let ChartBinding::Line(c) = b {
                c.fill_missing_days = true;
            }
        });
        let chart = bind(&table, &spec).unwrap();
        let points = &chart.as_cartesian().unwrap().series[0].points;

        assert_eq!(points.len(), 5);
        assert_eq!(points[1].y, None);
        assert_eq!(points[2].x_label, "2023-01-03");
        assert_eq!(points[4].y, Some(7.0));
    }

    #[test]
    fn test_geo_points() {
        let table = Table::new(vec![
            Column::text("location", ["DKI Jakarta", "Bali"]),
            Column::numeric("latitude", [-6.0, -8.0]),
            Column::numeric("longitude", [106.0, 115.0]),
            Column::numeric("total_cases", [1000.0, 500.0]),
        ])
        .unwrap();
        let spec = ChartSpec::geo("map", "latitude", "longitude").map_binding(|b| {
            if let ChartBinding::GeographicPoint(g) = b {
                g.size = Some("total_cases".to_string());
                g.label = Some("location".to_string());
                g.size_scale = 0.2;
            }
        });
        let chart = bind(&table, &spec).unwrap();
        let geo = chart.as_geo().unwrap();

        assert_eq!(geo.center, Some(GeoCoordinate { latitude: -7.0, longitude: 110.5 }));
        assert_eq!(geo.points[0].radius, Some(200.0));
        assert_eq!(geo.points[1].tooltip, "Bali: 500");
    }

    #[test]
    fn test_binding_errors() {
        let table = heatmap_table();
        assert_eq!(
            bind(&table, &ChartSpec::bar("b", "day", "revenue")).unwrap_err(),
            FieldBindingError::UnknownField("revenue".to_string())
        );
        assert!(matches!(
            bind(&table, &ChartSpec::bar("b", "hour", "day")),
            Err(FieldBindingError::NonNumericField { channel: "y", .. })
        ));

        let missing_coord = Table::new(vec![
            Column::new("lat", ColumnType::Numeric, vec![Value::Missing]).unwrap(),
            Column::numeric("lon", [1.0]),
        ])
        .unwrap();
        assert!(matches!(
            bind(&missing_coord, &ChartSpec::geo("g", "lat", "lon")),
            Err(FieldBindingError::MissingValue { row: 0, .. })
        ));
    }
}
