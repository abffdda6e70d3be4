use crate::error::AppError;
use crate::types::{CellValue, RawRow};
use crate::util::parse_iso_datetime;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use log::debug;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

pub const ACCEPTED_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub blank_rows: usize,
    pub date_cells: usize,
    pub columns: Vec<String>,
}

/// Reject anything that is not an Excel workbook before touching its bytes.
pub fn check_file_type(file_name: &str) -> Result<(), AppError> {
    let lower = file_name.to_lowercase();
    if ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        Ok(())
    } else {
        Err(AppError::InvalidFileType { file_name: file_name.to_string() })
    }
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>, AppError> {
    std::fs::read(path).map_err(AppError::FileRead)
}

/// Parse the first sheet of a workbook into header-keyed rows.
///
/// The first row is the header. Every header column is present on every row
/// (blank cells become `CellValue::Empty`), fully blank rows are skipped, and
/// date-typed cells come back as real dates. Keeping blank cells as keys
/// means a missing column is detected from the header, not the first row.
pub fn parse_workbook(bytes: Vec<u8>) -> Result<(Vec<RawRow>, LoadReport), AppError> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| AppError::Workbook(e.to_string()))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(r) => r.map_err(|e| AppError::Workbook(e.to_string()))?,
        None => return Ok((Vec::new(), LoadReport::default())),
    };

    let mut rows_iter = range.rows();
    let Some(header_cells) = rows_iter.next() else {
        return Ok((Vec::new(), LoadReport::default()));
    };
    let columns = header_names(header_cells);

    let mut report = LoadReport { columns: columns.clone(), ..LoadReport::default() };
    let mut rows = Vec::new();
    for cells in rows_iter {
        report.total_rows += 1;
        let values: Vec<CellValue> = cells.iter().map(convert_cell).collect();
        if values.iter().all(|v| matches!(v, CellValue::Empty)) {
            report.blank_rows += 1;
            continue;
        }
        report.date_cells += values.iter().filter(|v| matches!(v, CellValue::Date(_))).count();

        let mut row = RawRow::new();
        for (idx, name) in columns.iter().enumerate() {
            let value = values.get(idx).cloned().unwrap_or(CellValue::Empty);
            row.insert(name.clone(), value);
        }
        rows.push(row);
    }
    debug!(
        "parsed {} data rows ({} blank skipped) across {} columns",
        rows.len(),
        report.blank_rows,
        columns.len()
    );
    Ok((rows, report))
}

/// Header text per column. Blank headers become `__EMPTY`, `__EMPTY_1`, ...
/// and repeated names get a `_1`, `_2` suffix so no column is lost.
fn header_names(cells: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut blanks = 0usize;
    cells
        .iter()
        .map(|cell| {
            let text = convert_cell(cell).to_text();
            let base = if text.trim().is_empty() {
                let name = if blanks == 0 { "__EMPTY".to_string() } else { format!("__EMPTY_{}", blanks) };
                blanks += 1;
                name
            } else {
                text
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 { base } else { format!("{}_{}", base, count) };
            *count += 1;
            name
        })
        .collect()
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Text(e.to_string()),
        Data::DateTime(dt) => {
            if dt.is_datetime() {
                dt.as_datetime().map(CellValue::Date).unwrap_or(CellValue::Number(dt.as_f64()))
            } else {
                CellValue::Number(dt.as_f64())
            }
        }
        Data::DateTimeIso(s) => parse_iso_datetime(s).map(CellValue::Date).unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
