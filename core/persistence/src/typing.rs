//! FILENAME: core/persistence/src/typing.rs
//! PURPOSE: Turns raw source cells into typed engine columns.
//! CONTEXT: Both readers hand over a header row plus raw cells. Declared
//! columns are checked against their declared type, the rest are inferred.

use chrono::NaiveDateTime;
use engine::{log_debug, parse_timestamp, Column, ColumnType, Table, Value};

use crate::{DataSourceError, SourceSpec};

/// A cell as read from the file, before typing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Timestamp(NaiveDateTime),
}

impl RawCell {
    /// Text cells that are blank after trimming count as empty.
    pub(crate) fn text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(raw.to_string())
        }
    }

    fn describe(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.clone(),
            RawCell::Number(n) => Value::Number(*n).display(),
            RawCell::Timestamp(ts) => Value::Timestamp(*ts).display(),
        }
    }
}

/// Lowercase, spaces to underscores, parentheses removed.
/// `"Total Cases (Province)"` becomes `"total_cases_province"`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace(['(', ')'], "")
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Converts one raw cell to a value of `column_type`, or None when the cell
/// cannot be represented in that type.
fn typed_value(cell: &RawCell, column_type: ColumnType, formats: &[String]) -> Option<Value> {
    match (cell, column_type) {
        (RawCell::Empty, _) => Some(Value::Missing),
        (RawCell::Number(n), ColumnType::Numeric) => Some(Value::Number(*n)),
        (RawCell::Text(s), ColumnType::Numeric) => parse_number(s).map(Value::Number),
        (RawCell::Timestamp(ts), ColumnType::Timestamp) => Some(Value::Timestamp(*ts)),
        (RawCell::Text(s), ColumnType::Timestamp) => {
            parse_timestamp(s, formats).map(Value::Timestamp)
        }
        (RawCell::Text(s), ColumnType::String | ColumnType::Categorical) => {
            Some(Value::Text(s.clone()))
        }
        (other, ColumnType::String | ColumnType::Categorical) => {
            Some(Value::Text(other.describe()))
        }
        _ => None,
    }
}

/// Picks Numeric, then Timestamp, then String for an undeclared column.
fn infer_type(cells: &[&RawCell], formats: &[String]) -> ColumnType {
    let filled: Vec<&RawCell> = cells.iter().copied().filter(|c| **c != RawCell::Empty).collect();
    if filled.is_empty() {
        return ColumnType::String;
    }
    for candidate in [ColumnType::Numeric, ColumnType::Timestamp] {
        if filled.iter().all(|cell| typed_value(cell, candidate, formats).is_some()) {
            return candidate;
        }
    }
    ColumnType::String
}

/// Rows wider than the header lose no data: blank trailing cells are
/// dropped, anything else fails the load.
fn check_row_widths(
    spec: &SourceSpec,
    width: usize,
    rows: &[Vec<RawCell>],
) -> Result<(), DataSourceError> {
    for (row, cells) in rows.iter().enumerate() {
        if cells.len() <= width {
            continue;
        }
        if cells[width..].iter().any(|cell| *cell != RawCell::Empty) {
            return Err(DataSourceError::ExtraCells {
                source_name: spec.name.clone(),
                row,
                found: cells.len(),
                expected: width,
            });
        }
        log_debug!(
            "LOAD",
            "source={} row={} ignoring {} blank trailing cells",
            spec.name,
            row,
            cells.len() - width
        );
    }
    Ok(())
}

/// Builds the table for `spec` from a header row and the raw data rows.
/// Short rows are padded with empty cells.
pub(crate) fn build_table(
    spec: &SourceSpec,
    headers: Vec<String>,
    rows: Vec<Vec<RawCell>>,
) -> Result<Table, DataSourceError> {
    check_row_widths(spec, headers.len(), &rows)?;

    let headers: Vec<String> = if spec.normalize_headers {
        headers.iter().map(|h| normalize_header(h)).collect()
    } else {
        headers.iter().map(|h| h.trim().to_string()).collect()
    };

    if let Some(decl) = spec.columns.iter().find(|decl| !headers.contains(&decl.name)) {
        return Err(DataSourceError::MissingColumn {
            source_name: spec.name.clone(),
            column: decl.name.clone(),
        });
    }

    let empty = RawCell::Empty;
    let mut columns = Vec::with_capacity(headers.len());

    for (index, header) in headers.iter().enumerate() {
        let cells: Vec<&RawCell> = rows
            .iter()
            .map(|row| row.get(index).unwrap_or(&empty))
            .collect();

        let column_type = match spec.declared_type(header) {
            Some(declared) => declared,
            None => infer_type(&cells, &spec.timestamp_formats),
        };

        let values = cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                typed_value(cell, column_type, &spec.timestamp_formats).ok_or_else(|| {
                    DataSourceError::TypeMismatch {
                        column: header.clone(),
                        row,
                        expected: column_type,
                        value: cell.describe(),
                    }
                })
            })
            .collect::<Result<Vec<Value>, DataSourceError>>()?;

        columns.push(Column::new(header.clone(), column_type, values)?);
    }

    Ok(Table::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_rows(rows: &[&[&str]]) -> Vec<Vec<RawCell>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| RawCell::text(cell)).collect())
            .collect()
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Total Cases (Province)"), "total_cases_province");
        assert_eq!(normalize_header(" Location ISO Code "), "location_iso_code");
    }

    #[test]
    fn test_inferred_types() {
        let spec = SourceSpec::new("t", "t.csv");
        let table = build_table(
            &spec,
            headers(&["qty", "date", "store"]),
            text_rows(&[&["2", "2023-01-01", "Lower Manhattan"], &["", "2023-01-02", "Astoria"]]),
        )
        .unwrap();

        assert_eq!(
            table.schema(),
            vec![
                ("qty", ColumnType::Numeric),
                ("date", ColumnType::Timestamp),
                ("store", ColumnType::String)
            ]
        );
        assert_eq!(table.column("qty").unwrap().values()[1], Value::Missing);
    }

    #[test]
    fn test_declared_type_mismatch() {
        let spec = SourceSpec::new("t", "t.csv").with_column("qty", ColumnType::Numeric);
        let rows = text_rows(&[&["1"], &["two"]]);
        let err = build_table(&spec, headers(&["qty"]), rows).unwrap_err();
        match err {
            DataSourceError::TypeMismatch { column, row, value, .. } => {
                assert_eq!(column, "qty");
                assert_eq!(row, 1);
                assert_eq!(value, "two");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_declared_column() {
        let spec = SourceSpec::new("t", "t.csv").with_column("unit_price", ColumnType::Numeric);
        let err = build_table(&spec, headers(&["qty"]), text_rows(&[&["1"]])).unwrap_err();
        assert!(matches!(
            err,
            DataSourceError::MissingColumn { column, .. } if column == "unit_price"
        ));
    }

    #[test]
    fn test_numbers_in_declared_text_column() {
        let spec = SourceSpec::new("t", "t.xlsx").with_column("code", ColumnType::Categorical);
        let rows = vec![vec![RawCell::Number(31.0)]];
        let table = build_table(&spec, headers(&["code"]), rows).unwrap();
        assert_eq!(table.column("code").unwrap().values()[0], Value::text("31"));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let spec = SourceSpec::new("t", "t.csv");
        let rows = text_rows(&[&["1", "x"], &["2"]]);
        let table = build_table(&spec, headers(&["a", "b"]), rows).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("b").unwrap().values()[1], Value::Missing);
    }

    #[test]
    fn test_cells_beyond_header() {
        let spec = SourceSpec::new("t", "t.csv");

        // A trailing delimiter leaves a blank cell that is dropped
        let rows = text_rows(&[&["1", "x", " "]]);
        let table = build_table(&spec, headers(&["a", "b"]), rows).unwrap();
        assert_eq!(table.column_count(), 2);

        let rows = text_rows(&[&["1", "x"], &["2", "y", "z"]]);
        let err = build_table(&spec, headers(&["a", "b"]), rows).unwrap_err();
        match err {
            DataSourceError::ExtraCells { row, found, expected, .. } => {
                assert_eq!(row, 1);
                assert_eq!(found, 3);
                assert_eq!(expected, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
