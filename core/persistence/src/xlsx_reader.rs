// FILENAME: core\persistence\src\xlsx_reader.rs

use crate::typing::{build_table, RawCell};
use crate::{DataSourceError, SourceSpec};
use calamine::{open_workbook, Data, Reader, Xlsx};
use engine::{log_debug, log_warn, time_only_anchor, Table};

pub(crate) fn load_xlsx(spec: &SourceSpec) -> Result<Table, DataSourceError> {
    let mut workbook: Xlsx<_> = open_workbook(&spec.path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    let sheet_name = match &spec.sheet {
        Some(name) if sheet_names.contains(name) => name.clone(),
        Some(name) => return Err(DataSourceError::SheetNotFound(name.clone())),
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| DataSourceError::Empty(spec.name.clone()))?,
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => return Err(DataSourceError::Empty(spec.name.clone())),
    };

    let mut data = Vec::new();
    for (row_idx, row) in rows.enumerate() {
        let cells = row
            .iter()
            .enumerate()
            .map(|(col_idx, cell)| raw_cell(cell, row_idx, col_idx))
            .collect::<Vec<_>>();
        data.push(cells);
    }

    log_debug!(
        "LOAD",
        "xlsx source={} sheet={} headers={} records={}",
        spec.name,
        sheet_name,
        headers.len(),
        data.len()
    );
    build_table(spec, headers, data)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn raw_cell(cell: &Data, row_idx: usize, col_idx: usize) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::text(s),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            // Serials below one hold only a time of day
            Some(ts) if (0.0..1.0).contains(&dt.as_f64()) => {
                RawCell::Timestamp(time_only_anchor().and_time(ts.time()))
            }
            Some(ts) => RawCell::Timestamp(ts),
            None => RawCell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::text(s),
        Data::Error(e) => {
            log_warn!(
                "LOAD",
                "cell error {:?} at row {} column {}, loaded as missing",
                e,
                row_idx,
                col_idx
            );
            RawCell::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{ColumnType, Value};
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    fn write_covid_workbook(path: &std::path::Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("cases").unwrap();
        sheet.write_string(0, 0, "Location").unwrap();
        sheet.write_string(0, 1, "Total Cases").unwrap();
        sheet.write_string(0, 2, "Date").unwrap();

        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let date = ExcelDateTime::from_ymd(2021, 5, 31).unwrap();
        let rows = [("DKI Jakarta", 32.0), ("Jawa Barat", 20.0)];
        for (row, (location, cases)) in rows.iter().enumerate() {
            let row = row as u32 + 1;
            sheet.write_string(row, 0, *location).unwrap();
            sheet.write_number(row, 1, *cases).unwrap();
            sheet.write_datetime_with_format(row, 2, &date, &date_format).unwrap();
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_load_xlsx_named_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covid.xlsx");
        write_covid_workbook(&path);

        let spec = crate::SourceSpec::new("covid", &path)
            .with_sheet("cases")
            .normalized()
            .with_column("total_cases", ColumnType::Numeric);
        let table = crate::load(&spec).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), vec!["location", "total_cases", "date"]);
        assert_eq!(table.column("total_cases").unwrap().values()[0], Value::Number(32.0));
        assert_eq!(table.column("date").unwrap().column_type(), ColumnType::Timestamp);
        assert_eq!(table.column("date").unwrap().values()[1].display(), "2021-05-31");
    }

    #[test]
    fn test_unknown_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covid.xlsx");
        write_covid_workbook(&path);

        let spec = crate::SourceSpec::new("covid", &path).with_sheet("Sheet9");
        assert!(matches!(
            crate::load(&spec),
            Err(DataSourceError::SheetNotFound(name)) if name == "Sheet9"
        ));
    }

    #[test]
    fn test_time_only_cells_share_the_text_anchor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("times.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "transaction_time").unwrap();
        let time = ExcelDateTime::from_hms(7, 30, 0).unwrap();
        let time_format = Format::new().set_num_format("hh:mm:ss");
        sheet.write_datetime_with_format(1, 0, &time, &time_format).unwrap();
        workbook.save(&path).unwrap();

        let spec = crate::SourceSpec::new("times", &path)
            .with_column("transaction_time", ColumnType::Timestamp);
        let table = crate::load(&spec).unwrap();
        let ts = table.column("transaction_time").unwrap().values()[0].as_timestamp().unwrap();

        // Same key a CSV "07:30:00" cell produces
        let from_text = engine::parse_timestamp("07:30:00", &[]).unwrap();
        assert_eq!(ts.date(), time_only_anchor());
        assert_eq!(ts.date(), from_text.date());
        assert_eq!(ts.format("%H:%M").to_string(), "07:30");
    }
}
