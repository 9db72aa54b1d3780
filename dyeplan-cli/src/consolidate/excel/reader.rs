//! Read workbook bytes into datasets

use std::io::Cursor;

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Xlsx, open_workbook_from_rs};
use chrono::NaiveDateTime;

use crate::consolidate::{Dataset, Value};

fn open(bytes: &[u8]) -> Result<Xlsx<Cursor<&[u8]>>> {
    open_workbook_from_rs(Cursor::new(bytes)).context("Failed to open workbook (is it an .xlsx file?)")
}

/// Sheet names in workbook order
pub fn list_sheets(bytes: &[u8]) -> Result<Vec<String>> {
    let workbook = open(bytes)?;
    Ok(workbook.sheet_names())
}

/// Read one sheet as a dataset; the first non-empty row is the header
pub fn read_sheet(bytes: &[u8], sheet_name: &str) -> Result<Dataset> {
    let mut workbook = open(bytes)?;
    let range = workbook
        .worksheet_range(sheet_name)
        .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

    let dataset = range_to_dataset(&range);
    log::debug!(
        "Read sheet '{}': {} rows, {} columns",
        sheet_name,
        dataset.len(),
        dataset.width()
    );
    Ok(dataset)
}

/// Read the first sheet of a workbook (auxiliary exports have a single sheet)
pub fn read_single_sheet_dataset(bytes: &[u8]) -> Result<Dataset> {
    let sheet_name = list_sheets(bytes)?
        .into_iter()
        .next()
        .context("Excel file has no sheets")?;
    read_sheet(bytes, &sheet_name)
}

fn range_to_dataset(range: &Range<Data>) -> Dataset {
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_value).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(Value::is_empty));

    let Some(header) = rows.next() else {
        return Dataset::default();
    };

    let names: Vec<String> = header.iter().map(|v| v.to_string()).collect();
    Dataset::from_rows(&names, rows.collect())
}

/// Convert a calamine cell into a value
pub fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) => Value::Number(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Value::DateTime(naive),
            None => Value::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(Value::DateTime)
            .unwrap_or_else(|| Value::String(s.clone())),
        Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) => Value::Empty,
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
