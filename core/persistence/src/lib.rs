//! FILENAME: core/persistence/src/lib.rs
//! Source loading for the reporting pipeline.
//!
//! Reads flat CSV files and XLSX workbooks into immutable engine Tables.
//! A load is all-or-nothing: either every row is typed according to the
//! declared schema or the whole source fails.

mod csv_reader;
mod error;
mod typing;
mod xlsx_reader;

pub use csv_reader::load_csv_reader;
pub use error::DataSourceError;
pub use typing::normalize_header;

use engine::{log_enter, log_exit, log_info, ColumnType, Table};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// SOURCE SPEC
// ============================================================================

/// File formats a source can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Infers the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" | "tsv" => Some(SourceFormat::Csv),
            "xlsx" | "xlsm" => Some(SourceFormat::Xlsx),
            _ => None,
        }
    }
}

/// A column the caller expects to find, with the type its values must have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDecl {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnDecl {
            name: name.into(),
            column_type,
        }
    }
}

/// Where a table comes from and what it must look like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Name the loaded table is registered under.
    pub name: String,
    pub path: PathBuf,
    /// Taken from the file extension when absent.
    #[serde(default)]
    pub format: Option<SourceFormat>,
    /// Field delimiter for delimited text.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Worksheet to read; the first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
    /// Declared columns. Columns not listed here get an inferred type.
    #[serde(default)]
    pub columns: Vec<ColumnDecl>,
    /// Extra timestamp formats, tried before the built-in ones.
    #[serde(default)]
    pub timestamp_formats: Vec<String>,
    /// Lowercase headers, replace spaces with `_` and strip parentheses
    /// before matching declared columns.
    #[serde(default)]
    pub normalize_headers: bool,
}

fn default_delimiter() -> char {
    ','
}

impl SourceSpec {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        SourceSpec {
            name: name.into(),
            path: path.into(),
            format: None,
            delimiter: default_delimiter(),
            sheet: None,
            columns: Vec::new(),
            timestamp_formats: Vec::new(),
            normalize_headers: false,
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnDecl::new(name, column_type));
        self
    }

    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_formats.push(format.into());
        self
    }

    pub fn normalized(mut self) -> Self {
        self.normalize_headers = true;
        self
    }

    /// The declared type of `column`, if any.
    pub fn declared_type(&self, column: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|decl| decl.name == column)
            .map(|decl| decl.column_type)
    }

    /// Explicit format, falling back to the file extension.
    pub fn resolved_format(&self) -> Result<SourceFormat, DataSourceError> {
        self.format
            .or_else(|| SourceFormat::from_path(&self.path))
            .ok_or_else(|| DataSourceError::UnsupportedFormat(self.path.display().to_string()))
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Loads the source described by `spec` into a Table.
pub fn load(spec: &SourceSpec) -> Result<Table, DataSourceError> {
    log_enter!("LOAD", "load", "source={} path={}", spec.name, spec.path.display());

    let table = match spec.resolved_format()? {
        SourceFormat::Csv => csv_reader::load_csv(spec)?,
        SourceFormat::Xlsx => xlsx_reader::load_xlsx(spec)?,
    };

    log_info!(
        "LOAD",
        "source={} rows={} columns={}",
        spec.name,
        table.row_count(),
        table.column_count()
    );
    log_exit!("LOAD", "load", "source={}", spec.name);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("data/sales.CSV")), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_path(Path::new("cases.xlsx")), Some(SourceFormat::Xlsx));
        assert_eq!(SourceFormat::from_path(Path::new("notes.md")), None);
        assert_eq!(SourceFormat::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_unsupported_format() {
        let spec = SourceSpec::new("notes", "notes.md");
        assert!(matches!(load(&spec), Err(DataSourceError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let spec = SourceSpec::new("sales", "/definitely/not/here.csv");
        assert!(matches!(load(&spec), Err(DataSourceError::Io(_))));
    }

    #[test]
    fn test_spec_from_json_defaults() {
        let spec: SourceSpec = serde_json::from_str(
            r#"{"name": "sales", "path": "sales.csv",
                "columns": [{"name": "unit_price", "type": "numeric"}]}"#,
        )
        .unwrap();
        assert_eq!(spec.delimiter, ',');
        assert_eq!(spec.format, None);
        assert_eq!(spec.declared_type("unit_price"), Some(ColumnType::Numeric));
        assert_eq!(spec.declared_type("store"), None);
    }
}
