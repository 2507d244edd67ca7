//! FILENAME: core/persistence/src/csv_reader.rs

use std::fs::File;
use std::io::Read;

use csv::ReaderBuilder;
use engine::{log_debug, Table};

use crate::typing::{build_table, RawCell};
use crate::{DataSourceError, SourceSpec};

pub(crate) fn load_csv(spec: &SourceSpec) -> Result<Table, DataSourceError> {
    let file = File::open(&spec.path)?;
    load_csv_reader(file, spec)
}

/// Loads delimited text from any reader. `spec.path` and `spec.format` are
/// ignored; the remaining settings apply as for a file load.
pub fn load_csv_reader<R: Read>(reader: R, spec: &SourceSpec) -> Result<Table, DataSourceError> {
    let delimiter = u8::try_from(spec.delimiter).map_err(|_| {
        DataSourceError::UnsupportedFormat(format!("delimiter '{}'", spec.delimiter))
    })?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(DataSourceError::Empty(spec.name.clone()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(RawCell::text).collect::<Vec<_>>());
    }

    log_debug!(
        "LOAD",
        "csv source={} headers={} records={}",
        spec.name,
        headers.len(),
        rows.len()
    );
    build_table(spec, headers, rows)
}
