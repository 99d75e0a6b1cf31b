//! `.xlsx` codec
//!
//! Reads the first worksheet with calamine and writes output with
//! rust_xlsxwriter. Cell types survive the round trip: text, numbers,
//! booleans and dates are written back as what they were read as.

use super::{Cell, Table, WorkbookError};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

/// Days from the Excel epoch (1899-12-30) to the Unix epoch
const EXCEL_UNIX_EPOCH_DAYS: f64 = 25_569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Read the first worksheet; the first row becomes the header
pub fn read_workbook(path: &Path) -> Result<Table, WorkbookError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(WorkbookError::NoWorksheet)??;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|data| to_cell(data).text().into_owned())
            .collect(),
        None => Vec::new(),
    };
    let data: Vec<Vec<Cell>> = rows.map(|row| row.iter().map(to_cell).collect()).collect();

    Ok(Table::new(headers, data))
}

/// Write header + rows to a new workbook at `path`
pub fn write_workbook(table: &Table, path: &Path) -> Result<(), WorkbookError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (col, header) in table.headers().iter().enumerate() {
        worksheet.write_string(0, column_number(col)?, header)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let row_number = u32::try_from(index + 1)
            .map_err(|_| WorkbookError::TooLarge(format!("{} rows", table.len())))?;
        for (col, cell) in row.iter().enumerate() {
            let col = column_number(col)?;
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    worksheet.write_string(row_number, col, text)?;
                }
                Cell::Number(number) => {
                    worksheet.write_number(row_number, col, *number)?;
                }
                Cell::Bool(flag) => {
                    worksheet.write_boolean(row_number, col, *flag)?;
                }
                Cell::DateTime(at) => {
                    let format = if at.num_seconds_from_midnight() == 0 {
                        &date_format
                    } else {
                        &datetime_format
                    };
                    worksheet.write_number_with_format(row_number, col, excel_serial(at), format)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Most recently modified `.xlsx` in `dir`, ignoring Office lock files
pub fn find_latest_workbook(dir: &Path) -> Result<Option<PathBuf>, WorkbookError> {
    let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !is_workbook(&path) {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        if latest.as_ref().map_or(true, |(best, _)| modified > *best) {
            latest = Some((modified, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

/// Output path: `<output_dir>/<input stem>__<YYYYMMDD_HHMMSS>.xlsx`
pub fn output_path_for(input: &Path, output_dir: &Path, at: DateTime<Utc>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "workbook".to_string());
    output_dir.join(format!(
        "{}__{}.xlsx",
        stem,
        kwc_common::time::output_stamp(at)
    ))
}

fn is_workbook(path: &Path) -> bool {
    let is_lock_file = path
        .file_name()
        .map(|n| n.to_string_lossy().starts_with("~$"))
        .unwrap_or(false);
    let is_xlsx = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    is_xlsx && !is_lock_file
}

fn column_number(col: usize) -> Result<u16, WorkbookError> {
    u16::try_from(col).map_err(|_| WorkbookError::TooLarge(format!("column {}", col)))
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(text) => Cell::from(text.clone()),
        Data::Float(number) => Cell::Number(*number),
        Data::Int(number) => Cell::Number(*number as f64),
        Data::Bool(flag) => Cell::Bool(*flag),
        Data::DateTime(at) if at.is_datetime() => at
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or(Cell::Number(at.as_f64())),
        // Durations keep their numeric value
        Data::DateTime(duration) => Cell::Number(duration.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::from(text.clone()),
        Data::Error(error) => Cell::Text(error.to_string()),
    }
}

/// Excel serial date-time (1900 date system)
fn excel_serial(at: &NaiveDateTime) -> f64 {
    at.and_utc().timestamp_millis() as f64 / MILLIS_PER_DAY + EXCEL_UNIX_EPOCH_DAYS
}
