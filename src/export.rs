// Export payloads for the ranked view and the spreadsheet writers that
// consume them.
use crate::config::AppConfig;
use crate::display::ValueStyle;
use crate::error::{AppError, ExportKind};
use crate::types::{CellValue, RankedView, TopN, ViewSelection};
use crate::util::{format_date_mdy, sanitize_file_part};
use crate::view::{NOT_AVAILABLE, UNNAMED_ITEM};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::path::Path;

pub const SHEET_NAME: &str = "Items List";

/// Document-agnostic table: ordered headers plus one row per ranked record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// Column that holds the ranked numeric value.
    pub value_index: usize,
    pub value_format: String,
}

impl ExportTable {
    /// Character widths per column, clamped to 10..=50.
    pub fn column_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let longest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(cell_width)
                    .fold(name.chars().count(), usize::max);
                longest.clamp(10, 50)
            })
            .collect()
    }
}

fn cell_width(cell: &CellValue) -> usize {
    match cell {
        CellValue::Date(d) => format_date_mdy(d).len(),
        other => other.to_text().chars().count(),
    }
}

fn cell_or(cell: Option<&CellValue>, fallback: &str) -> CellValue {
    match cell {
        Some(c) if !c.is_blank() => c.clone(),
        _ => CellValue::Text(fallback.to_string()),
    }
}

fn cell_or_empty(cell: Option<&CellValue>) -> CellValue {
    cell.cloned().unwrap_or(CellValue::Empty)
}

/// Build the export table. Identity columns are added only when ranking by
/// the duration-style column. An empty view is refused.
pub fn build_table(view: &RankedView, config: &AppConfig, kind: ExportKind) -> Result<ExportTable, AppError> {
    if view.is_empty() {
        return Err(AppError::ExportRefused(kind));
    }
    let sel = &view.selection;
    let cols = &config.columns;
    let display = &config.display;
    let with_identity = display.style(&sel.value_column) == ValueStyle::Duration;

    let mut columns = vec![
        "Rank".to_string(),
        sel.label_column.clone(),
        display.display_name(&sel.value_column),
        "Status".to_string(),
        cols.created_date.clone(),
        cols.paid_date.clone(),
        cols.purpose.clone(),
    ];
    if with_identity {
        columns.extend([
            cols.requester.clone(),
            cols.code.clone(),
            cols.paid_by.clone(),
            cols.payment_method.clone(),
        ]);
    }

    let rows = view
        .entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let row = &entry.record.row;
            let mut cells = vec![
                CellValue::Number((idx + 1) as f64),
                cell_or(row.get(&sel.label_column), UNNAMED_ITEM),
                CellValue::Number(entry.value),
                CellValue::Text(entry.record.payment_status.to_string()),
                cell_or_empty(row.get(&cols.created_date)),
                cell_or_empty(row.get(&cols.paid_date)),
                cell_or(row.get(&cols.purpose), NOT_AVAILABLE),
            ];
            if with_identity {
                cells.extend([
                    cell_or_empty(row.get(&cols.requester)),
                    cell_or_empty(row.get(&cols.code)),
                    cell_or_empty(row.get(&cols.paid_by)),
                    cell_or_empty(row.get(&cols.payment_method)),
                ]);
            }
            cells
        })
        .collect();

    Ok(ExportTable {
        columns,
        rows,
        value_index: 2,
        value_format: display.number_format(&sel.value_column),
    })
}

/// `Top_10_Items_Supply_Name_by_Total_Paid_2024-05-01`
pub fn file_stem(selection: &ViewSelection, config: &AppConfig, today: NaiveDate) -> String {
    let scope = match selection.top_n {
        TopN::Limit(n) => format!("Top_{}_Items", n),
        TopN::All => "All_Items".to_string(),
    };
    format!(
        "{}_{}_by_{}_{}",
        scope,
        sanitize_file_part(&selection.label_column),
        sanitize_file_part(&config.display.display_name(&selection.value_column)),
        today.format("%Y-%m-%d")
    )
}

pub fn spreadsheet_file_name(selection: &ViewSelection, config: &AppConfig, today: NaiveDate, ext: &str) -> String {
    format!("{}.{}", file_stem(selection, config, today), ext)
}

pub fn pdf_file_name(selection: &ViewSelection, config: &AppConfig, today: NaiveDate) -> String {
    format!("Report_{}.pdf", file_stem(selection, config, today))
}

/// Writes an export table to a file.
pub trait SpreadsheetWriter {
    fn extension(&self) -> &'static str;

    fn write_table(&self, table: &ExportTable, path: &Path) -> Result<(), AppError>;
}

pub struct XlsxTableWriter;

impl SpreadsheetWriter for XlsxTableWriter {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn write_table(&self, table: &ExportTable, path: &Path) -> Result<(), AppError> {
        let fail = |e: rust_xlsxwriter::XlsxError| AppError::export_failed(ExportKind::Spreadsheet, e);
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME).map_err(fail)?;

        let header = Format::new().set_bold();
        let date_format = Format::new().set_num_format("mm/dd/yyyy");
        let value_format = Format::new().set_num_format(&table.value_format);

        for (col, name) in table.columns.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, name, &header).map_err(fail)?;
        }
        for (r, cells) in table.rows.iter().enumerate() {
            let row = (r + 1) as u32;
            for (c, cell) in cells.iter().enumerate() {
                let col = c as u16;
                match cell {
                    CellValue::Empty => {}
                    CellValue::Number(n) if c == table.value_index => {
                        sheet.write_number_with_format(row, col, *n, &value_format).map_err(fail)?;
                    }
                    CellValue::Number(n) => {
                        sheet.write_number(row, col, *n).map_err(fail)?;
                    }
                    CellValue::Text(s) => {
                        sheet.write_string(row, col, s).map_err(fail)?;
                    }
                    CellValue::Bool(b) => {
                        sheet.write_boolean(row, col, *b).map_err(fail)?;
                    }
                    CellValue::Date(d) => {
                        sheet.write_datetime_with_format(row, col, d, &date_format).map_err(fail)?;
                    }
                }
            }
        }
        for (col, width) in table.column_widths().into_iter().enumerate() {
            sheet.set_column_width(col as u16, width as f64).map_err(fail)?;
        }

        workbook.save(path).map_err(fail)
    }
}

/// Same table as plain CSV; dates in `MM/DD/YYYY`.
pub struct CsvTableWriter;

impl SpreadsheetWriter for CsvTableWriter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write_table(&self, table: &ExportTable, path: &Path) -> Result<(), AppError> {
        let fail = |e: csv::Error| AppError::export_failed(ExportKind::Spreadsheet, e);
        let mut wtr = csv::Writer::from_path(path).map_err(fail)?;
        wtr.write_record(&table.columns).map_err(fail)?;
        for cells in &table.rows {
            let record: Vec<String> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Date(d) => format_date_mdy(d),
                    other => other.to_text(),
                })
                .collect();
            wtr.write_record(&record).map_err(fail)?;
        }
        wtr.flush().map_err(|e| AppError::export_failed(ExportKind::Spreadsheet, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_workbook;
    use crate::normalize::normalize;
    use crate::ranking::rank;
    use crate::types::{ChartType, RawRow};
    use pretty_assertions::assert_eq;

    fn ranked(value_column: &str, top_n: TopN) -> RankedView {
        let rows: Vec<RawRow> = vec![
            [
                ("Supply Name", "Acme"),
                ("Total", "250"),
                ("Processing Speed", "4"),
                ("Paid Method", "EFT"),
                ("PV Code", "PV-9"),
                ("Requester", "Sok"),
                ("Paid By", "Finance"),
                ("Purpose", "Toner"),
            ]
            .into_iter()
            .collect(),
            [("Supply Name", ""), ("Total", "90"), ("Processing Speed", "11"), ("Paid Method", "")]
                .into_iter()
                .collect(),
        ];
        let data = normalize(rows, "Paid Method");
        let sel = ViewSelection {
            top_n,
            value_column: value_column.into(),
            label_column: "Supply Name".into(),
            chart_type: ChartType::Bar,
        };
        rank(&data, &sel).unwrap()
    }

    #[test]
    fn base_columns_for_currency_ranking() {
        let cfg = AppConfig::default();
        let table = build_table(&ranked("Total", TopN::limit(10)), &cfg, ExportKind::Spreadsheet).unwrap();
        assert_eq!(
            table.columns,
            vec!["Rank", "Supply Name", "Total Paid", "Status", "Created Date", "Paid Date", "Purpose"]
        );
        assert_eq!(
            table.rows[1],
            vec![
                CellValue::Number(2.0),
                CellValue::Text(UNNAMED_ITEM.into()),
                CellValue::Number(90.0),
                CellValue::Text("Unpaid".into()),
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Text(NOT_AVAILABLE.into()),
            ]
        );
        assert_eq!(table.value_format, "\"$\"#,##0.00");
    }

    #[test]
    fn duration_ranking_adds_identity_columns() {
        let cfg = AppConfig::default();
        let table = build_table(&ranked("Processing Speed", TopN::All), &cfg, ExportKind::Spreadsheet).unwrap();
        assert_eq!(&table.columns[7..], &["Requester", "PV Code", "Paid By", "Paid Method"]);
        // ranked by speed: the 11-day row comes first
        assert_eq!(table.rows[0][2], CellValue::Number(11.0));
        assert_eq!(table.rows[1][7], CellValue::Text("Sok".into()));
        assert_eq!(table.rows[1][10], CellValue::Text("EFT".into()));
        assert_eq!(table.columns[2], "Processing Speed Days");
    }

    #[test]
    fn empty_view_is_refused() {
        let cfg = AppConfig::default();
        let mut view = ranked("Total", TopN::All);
        view.entries.clear();
        let err = build_table(&view, &cfg, ExportKind::Spreadsheet).unwrap_err();
        assert!(matches!(err, AppError::ExportRefused(ExportKind::Spreadsheet)));
    }

    #[test]
    fn file_names_follow_selection() {
        let cfg = AppConfig::default();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let top = ranked("Total", TopN::limit(10)).selection;
        assert_eq!(
            spreadsheet_file_name(&top, &cfg, day, "xlsx"),
            "Top_10_Items_Supply_Name_by_Total_Paid_2024-05-01.xlsx"
        );
        let all = ranked("Processing Speed", TopN::All).selection;
        assert_eq!(pdf_file_name(&all, &cfg, day), "Report_All_Items_Supply_Name_by_Processing_Speed_Days_2024-05-01.pdf");
    }

    #[test]
    fn widths_are_clamped() {
        let table = ExportTable {
            columns: vec!["Rank".into(), "Purpose".into()],
            rows: vec![vec![CellValue::Number(1.0), CellValue::Text("x".repeat(80))]],
            value_index: 0,
            value_format: String::new(),
        };
        assert_eq!(table.column_widths(), vec![10, 50]);
    }

    #[test]
    fn xlsx_export_reads_back() {
        let cfg = AppConfig::default();
        let table = build_table(&ranked("Total", TopN::limit(10)), &cfg, ExportKind::Spreadsheet).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        XlsxTableWriter.write_table(&table, &path).unwrap();

        let (rows, report) = parse_workbook(std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(report.columns, table.columns);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Supply Name"), Some(&CellValue::Text("Acme".into())));
        assert_eq!(rows[0].get("Total Paid"), Some(&CellValue::Number(250.0)));
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let cfg = AppConfig::default();
        let table = build_table(&ranked("Total", TopN::limit(1)), &cfg, ExportKind::Spreadsheet).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        CsvTableWriter.write_table(&table, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Rank,Supply Name,Total Paid,Status,Created Date,Paid Date,Purpose");
        assert_eq!(lines[1], "1,Acme,250,Paid,,,Toner");
        assert_eq!(lines.len(), 2);
    }
}
