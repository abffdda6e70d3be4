// Session state: the loaded dataset, the current ranked view and chart, and
// the single status line shown to the user.
//
// Uploads and renders are ticketed. A result carrying anything but the
// newest ticket is dropped, so a slow earlier operation can never overwrite
// the outcome of a later one.
use crate::chart::{ChartBackend, ChartSlot};
use crate::config::AppConfig;
use crate::error::{AppError, ExportKind, StatusKind};
use crate::export::{build_table, file_stem, pdf_file_name, spreadsheet_file_name, SpreadsheetWriter};
use crate::loader::{check_file_type, parse_workbook, read_bytes};
use crate::normalize::normalize;
use crate::output::write_json;
use crate::pdf::{PdfRenderer, ReportPage};
use crate::ranking::rank;
use crate::summary::{summarize, summary_cards};
use crate::types::{DatasetSummary, DetailItem, NormalizedRecord, RankedView, SummaryCards, ViewSelection};
use crate::view::{chart_series, detail_items, heading};
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

pub const WELCOME: &str = "Welcome! Upload an Excel file to visualize your data.";
pub const INITIAL_PLACEHOLDER: &str = "Your top items will appear here after uploading a file.";
pub const NO_DATA_PLACEHOLDER: &str = "No data available. Please upload a file.";
pub const NO_VALID_DATA_PLACEHOLDER: &str = "No valid data for current selections.";
const NO_DATA_MESSAGE: &str = "No data to display. Check Excel content or column selections.";
const PROCESSING_MESSAGE: &str = "Processing Excel file...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        StatusMessage { kind: StatusKind::Info, text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        StatusMessage { kind: StatusKind::Success, text: text.into() }
    }
}

impl From<&AppError> for StatusMessage {
    fn from(err: &AppError) -> Self {
        StatusMessage { kind: err.severity(), text: err.to_string() }
    }
}

/// Identifies one file selection; only the newest may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket(u64);

#[derive(Debug)]
enum RenderOutcome {
    NoData,
    Ranked(RankedView),
    Failed(AppError),
}

/// A computed but not yet applied render.
#[derive(Debug)]
pub struct PendingRender {
    generation: u64,
    selection: ViewSelection,
    outcome: RenderOutcome,
}

pub struct Session<B: ChartBackend> {
    config: AppConfig,
    dataset: Vec<NormalizedRecord>,
    columns: Vec<String>,
    file_name: Option<String>,
    summary: DatasetSummary,
    ranked: Option<RankedView>,
    details: Vec<DetailItem>,
    placeholder: Option<String>,
    heading: String,
    chart: ChartSlot<B>,
    status: StatusMessage,
    upload_generation: u64,
    render_generation: u64,
    busy: bool,
}

impl<B: ChartBackend> Session<B> {
    pub fn new(config: AppConfig, backend: B) -> Self {
        let heading = heading(&config.defaults, &config);
        Session {
            config,
            dataset: Vec::new(),
            columns: Vec::new(),
            file_name: None,
            summary: DatasetSummary::default(),
            ranked: None,
            details: Vec::new(),
            placeholder: Some(INITIAL_PLACEHOLDER.to_string()),
            heading,
            chart: ChartSlot::new(backend),
            status: StatusMessage::info(WELCOME),
            upload_generation: 0,
            render_generation: 0,
            busy: false,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn details(&self) -> &[DetailItem] {
        &self.details
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn summary(&self) -> &DatasetSummary {
        &self.summary
    }

    pub fn summary_cards(&self) -> SummaryCards {
        summary_cards(&self.summary)
    }

    pub fn ranked(&self) -> Option<&RankedView> {
        self.ranked.as_ref()
    }

    pub fn dataset_len(&self) -> usize {
        self.dataset.len()
    }

    /// Header names of the loaded sheet, in sheet order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn chart(&self) -> &ChartSlot<B> {
        &self.chart
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Exports are offered only when a chart with at least one label is
    /// shown and nothing is in flight.
    pub fn exports_enabled(&self) -> bool {
        !self.busy && self.chart.has_data()
    }

    fn set_status(&mut self, status: StatusMessage) {
        match status.kind {
            StatusKind::Error => error!("{}", status.text),
            _ => debug!("status: {}", status.text),
        }
        self.status = status;
    }

    fn clear_dataset(&mut self) {
        self.dataset.clear();
        self.columns.clear();
        self.summary = DatasetSummary::default();
        self.ranked = None;
        self.details.clear();
        self.chart.clear();
        self.placeholder = Some(NO_DATA_PLACEHOLDER.to_string());
    }

    /// Start an upload. Files that are not Excel workbooks are rejected
    /// on the spot and clear the dataset.
    pub fn select_file(&mut self, file_name: &str) -> Option<UploadTicket> {
        self.upload_generation += 1;
        self.file_name = Some(file_name.to_string());
        if let Err(e) = check_file_type(file_name) {
            warn!("rejected upload '{}'", file_name);
            self.busy = false;
            self.clear_dataset();
            self.set_status(StatusMessage::from(&e));
            return None;
        }
        self.busy = true;
        self.set_status(StatusMessage::info(PROCESSING_MESSAGE));
        Some(UploadTicket(self.upload_generation))
    }

    /// Complete an upload with the bytes that were read for it. Returns
    /// `false` when the ticket was superseded and the result dropped.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        bytes: Result<Vec<u8>, AppError>,
        selection: &ViewSelection,
    ) -> bool {
        if ticket.0 != self.upload_generation {
            warn!("discarding stale upload #{} (latest is #{})", ticket.0, self.upload_generation);
            return false;
        }
        self.busy = false;

        let parsed = bytes.and_then(parse_workbook).and_then(|(rows, report)| {
            if rows.is_empty() {
                Err(AppError::ParseEmpty)
            } else {
                Ok((rows, report))
            }
        });
        match parsed {
            Ok((rows, report)) => {
                info!(
                    "loaded {} of {} rows ({} blank skipped, {} dates) with columns {:?}",
                    rows.len(),
                    report.total_rows,
                    report.blank_rows,
                    report.date_cells,
                    report.columns
                );
                self.columns = report.columns;
                self.dataset = normalize(rows, &self.config.columns.payment_method);
                self.summary = summarize(&self.dataset, &self.config.columns);
                self.render(selection);
            }
            Err(e) => {
                self.clear_dataset();
                self.heading = heading(selection, &self.config);
                self.set_status(StatusMessage::from(&e));
            }
        }
        true
    }

    /// Select, read and load `path` in one go.
    pub fn upload(&mut self, path: &Path, selection: &ViewSelection) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let Some(ticket) = self.select_file(&name) else {
            return false;
        };
        self.finish_upload(ticket, read_bytes(path), selection)
    }

    /// Take a render ticket and compute the ranked view for `selection`.
    /// Nothing visible changes until the result is committed.
    pub fn start_render(&mut self, selection: &ViewSelection) -> PendingRender {
        self.render_generation += 1;
        let outcome = if self.dataset.is_empty() {
            RenderOutcome::NoData
        } else {
            match rank(&self.dataset, selection) {
                Ok(view) if view.is_empty() => RenderOutcome::Failed(AppError::EmptyRankedView {
                    value_display: self.config.display.display_name(&selection.value_column),
                    scope: selection.top_n.scope(),
                }),
                Ok(view) => RenderOutcome::Ranked(view),
                Err(e) => RenderOutcome::Failed(e),
            }
        };
        PendingRender { generation: self.render_generation, selection: selection.clone(), outcome }
    }

    /// Apply a computed render. Returns `false` when a newer render was
    /// started in the meantime and this one was dropped.
    pub fn commit(&mut self, pending: PendingRender) -> bool {
        if pending.generation != self.render_generation {
            warn!("discarding stale render #{} (latest is #{})", pending.generation, self.render_generation);
            return false;
        }
        let selection = pending.selection;
        self.heading = heading(&selection, &self.config);

        match pending.outcome {
            RenderOutcome::NoData => {
                self.ranked = None;
                self.details.clear();
                self.chart.clear();
                if self.file_name.is_some() {
                    self.placeholder = Some(NO_DATA_PLACEHOLDER.to_string());
                    self.set_status(StatusMessage::info(NO_DATA_MESSAGE));
                }
            }
            RenderOutcome::Failed(e) => {
                self.ranked = None;
                self.details.clear();
                self.chart.clear();
                self.placeholder = Some(match &e {
                    AppError::ColumnNotFound { missing } => {
                        let names: Vec<String> = missing.iter().map(|m| m.to_string()).collect();
                        format!("Error: {}", names.join(" "))
                    }
                    _ => NO_VALID_DATA_PLACEHOLDER.to_string(),
                });
                self.set_status(StatusMessage::from(&e));
            }
            RenderOutcome::Ranked(view) => {
                self.details = detail_items(&view, &self.config);
                self.placeholder = None;
                let series = chart_series(&view, &self.config);
                self.ranked = Some(view);
                match self.chart.replace(series) {
                    Ok(()) => {
                        info!("rendered {}", self.heading);
                        if self.file_name.is_some() {
                            let text = format!(
                                "Chart updated: {} {} by {}.",
                                selection.top_n,
                                selection.label_column,
                                self.config.display.display_name(&selection.value_column)
                            );
                            self.set_status(StatusMessage::success(text));
                        }
                    }
                    Err(e) => self.set_status(StatusMessage::from(&e)),
                }
            }
        }
        true
    }

    /// Re-rank the loaded dataset for `selection` without re-parsing.
    pub fn render(&mut self, selection: &ViewSelection) {
        let pending = self.start_render(selection);
        self.commit(pending);
    }

    fn refuse_unless_ready(&self, kind: ExportKind) -> Result<&RankedView, AppError> {
        if self.busy {
            warn!("{} export requested while busy", kind);
            return Err(AppError::ExportRefused(kind));
        }
        match &self.ranked {
            Some(view) if self.chart.has_data() && !view.is_empty() => Ok(view),
            _ => {
                warn!("{} export refused: nothing to export", kind);
                Err(AppError::ExportRefused(kind))
            }
        }
    }

    fn report_export(&mut self, result: Result<PathBuf, AppError>, success: &str) -> Result<PathBuf, AppError> {
        match &result {
            Ok(path) => {
                info!("exported {}", path.display());
                self.set_status(StatusMessage::success(success));
            }
            Err(e) => self.set_status(StatusMessage::from(e)),
        }
        result
    }

    /// Clears the busy flag taken by a running export, then reports.
    fn finish_export(&mut self, result: Result<PathBuf, AppError>, success: &str) -> Result<PathBuf, AppError> {
        self.busy = false;
        self.report_export(result, success)
    }

    /// Write the ranked items with `writer` into `dir`.
    pub fn export_spreadsheet(
        &mut self,
        writer: &dyn SpreadsheetWriter,
        dir: &Path,
        today: NaiveDate,
    ) -> Result<PathBuf, AppError> {
        let prepared = self.refuse_unless_ready(ExportKind::Spreadsheet).and_then(|view| {
            let table = build_table(view, &self.config, ExportKind::Spreadsheet)?;
            let name = spreadsheet_file_name(&view.selection, &self.config, today, writer.extension());
            Ok((table, dir.join(name)))
        });
        let (table, path) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => return self.report_export(Err(e), ""),
        };
        self.busy = true;
        let result = writer.write_table(&table, &path).map(|()| path);
        self.finish_export(result, "Items list exported to Excel successfully!")
    }

    /// Capture the chart and write the one-page report into `dir`.
    pub fn export_pdf(&mut self, renderer: &dyn PdfRenderer, dir: &Path, today: NaiveDate) -> Result<PathBuf, AppError> {
        let selection = match self.refuse_unless_ready(ExportKind::Pdf).map(|view| view.selection.clone()) {
            Ok(selection) => selection,
            Err(e) => return self.report_export(Err(e), ""),
        };
        self.busy = true;
        let result = self.chart.snapshot().and_then(|png| {
            let page = ReportPage::new(&selection, &self.config, today, png);
            let path = dir.join(pdf_file_name(&selection, &self.config, today));
            renderer.render(&page, &path).map(|()| path)
        });
        self.finish_export(result, "Chart exported to PDF successfully!")
    }

    /// Write the declarative chart series as JSON into `dir`.
    pub fn export_chart_spec(&mut self, dir: &Path, today: NaiveDate) -> Result<PathBuf, AppError> {
        let result = self.refuse_unless_ready(ExportKind::ChartSpec).and_then(|view| {
            let path = dir.join(format!("{}.chart.json", file_stem(&view.selection, &self.config, today)));
            let series = self.chart.series().ok_or(AppError::ExportRefused(ExportKind::ChartSpec))?;
            write_json(&path, series).map_err(|e| AppError::export_failed(ExportKind::ChartSpec, e))?;
            Ok(path)
        });
        self.report_export(result, "Chart spec exported successfully!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MissingColumn;
    use crate::types::{CellValue, ChartType, TopN};
    use crate::view::ChartSeries;
    use pretty_assertions::assert_eq;
    use rust_xlsxwriter::Workbook;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeBackend {
        live: Rc<Cell<usize>>,
    }

    impl ChartBackend for FakeBackend {
        type Handle = ();

        fn create(&mut self, _series: &ChartSeries) -> Result<(), AppError> {
            self.live.set(self.live.get() + 1);
            Ok(())
        }

        fn destroy(&mut self, _handle: ()) {
            self.live.set(self.live.get() - 1);
        }

        fn snapshot(&mut self, _handle: &()) -> Result<Vec<u8>, AppError> {
            Ok(vec![1, 2, 3])
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        calls: RefCell<Vec<(usize, PathBuf)>>,
    }

    impl SpreadsheetWriter for RecordingWriter {
        fn extension(&self) -> &'static str {
            "xlsx"
        }

        fn write_table(&self, table: &crate::export::ExportTable, path: &Path) -> Result<(), AppError> {
            self.calls.borrow_mut().push((table.rows.len(), path.to_path_buf()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        pages: RefCell<Vec<ReportPage>>,
    }

    impl PdfRenderer for RecordingRenderer {
        fn render(&self, page: &ReportPage, _path: &Path) -> Result<(), AppError> {
            self.pages.borrow_mut().push(page.clone());
            Ok(())
        }
    }

    fn workbook(rows: &[&[&str]]) -> Vec<u8> {
        let mut wb = Workbook::new();
        let sheet = wb.add_worksheet();
        for (r, cells) in rows.iter().enumerate() {
            for (c, text) in cells.iter().enumerate() {
                if let Ok(n) = text.parse::<f64>() {
                    sheet.write_number(r as u32, c as u16, n).unwrap();
                } else if !text.is_empty() {
                    sheet.write_string(r as u32, c as u16, *text).unwrap();
                }
            }
        }
        wb.save_to_buffer().unwrap()
    }

    fn payments() -> Vec<u8> {
        workbook(&[
            &["Supply Name", "Total", "Paid Method", "PV Code"],
            &["A", "100", "EFT", "PV-1"],
            &["B", "50", "", ""],
            &["C", "200", "Cash", "PV-3"],
        ])
    }

    fn selection(top_n: TopN) -> ViewSelection {
        ViewSelection {
            top_n,
            value_column: "Total".into(),
            label_column: "Supply Name".into(),
            chart_type: ChartType::Bar,
        }
    }

    fn loaded(top_n: TopN) -> (Session<FakeBackend>, Rc<Cell<usize>>) {
        let backend = FakeBackend::default();
        let live = backend.live.clone();
        let mut session = Session::new(AppConfig::default(), backend);
        let ticket = session.select_file("payments.xlsx").unwrap();
        assert!(session.finish_upload(ticket, Ok(payments()), &selection(top_n)));
        (session, live)
    }

    #[test]
    fn starts_with_welcome_and_no_exports() {
        let session = Session::new(AppConfig::default(), FakeBackend::default());
        assert_eq!(session.status(), &StatusMessage::info(WELCOME));
        assert_eq!(session.placeholder(), Some(INITIAL_PLACEHOLDER));
        assert_eq!(session.heading(), "Top 10 Supply Name by Total Paid");
        assert!(!session.exports_enabled());
    }

    #[test]
    fn upload_ranks_and_summarizes() {
        let (session, live) = loaded(TopN::limit(2));
        let labels: Vec<&str> = session.details().iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["C", "A"]);
        assert_eq!(session.details()[0].value, "$200");
        assert_eq!(session.summary().total_paid_amount, 300.0);
        assert_eq!(session.summary().unique_label_count, 3);
        assert_eq!(session.summary().paid_code_count, 2);
        assert_eq!(session.columns(), &["Supply Name", "Total", "Paid Method", "PV Code"]);
        assert_eq!(session.status(), &StatusMessage::success("Chart updated: Top 2 Supply Name by Total Paid."));
        assert!(session.exports_enabled());
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn header_only_sheet_is_parse_empty() {
        let mut session = Session::new(AppConfig::default(), FakeBackend::default());
        let ticket = session.select_file("empty.xlsx").unwrap();
        assert!(session.is_busy());
        session.finish_upload(ticket, Ok(workbook(&[&["Supply Name", "Total"]])), &selection(TopN::limit(10)));
        assert_eq!(session.status(), &StatusMessage::info("Excel sheet is empty or could not be parsed."));
        assert_eq!(session.dataset_len(), 0);
        assert!(!session.exports_enabled());
        assert!(!session.is_busy());
        assert_eq!(session.placeholder(), Some(NO_DATA_PLACEHOLDER));
    }

    #[test]
    fn invalid_file_type_clears_everything() {
        let (mut session, live) = loaded(TopN::All);
        assert!(session.select_file("payments.csv").is_none());
        assert_eq!(session.status().kind, StatusKind::Error);
        assert_eq!(session.dataset_len(), 0);
        assert!(session.details().is_empty());
        assert!(!session.exports_enabled());
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn read_failure_clears_dataset() {
        let (mut session, _) = loaded(TopN::All);
        let ticket = session.select_file("broken.xlsx").unwrap();
        let io = std::io::Error::new(std::io::ErrorKind::Other, "gone");
        session.finish_upload(ticket, Err(AppError::FileRead(io)), &selection(TopN::All));
        assert_eq!(session.status(), &StatusMessage {
            kind: StatusKind::Error,
            text: "Error reading file. Ensure it is not corrupted.".into()
        });
        assert_eq!(session.dataset_len(), 0);
        assert!(!session.exports_enabled());
    }

    #[test]
    fn superseded_upload_is_dropped() {
        let mut session = Session::new(AppConfig::default(), FakeBackend::default());
        let first = session.select_file("old.xlsx").unwrap();
        let second = session.select_file("new.xlsx").unwrap();
        assert!(session.finish_upload(second, Ok(payments()), &selection(TopN::All)));
        let stale = workbook(&[&["Supply Name", "Total"], &["Z", "999"]]);
        assert!(!session.finish_upload(first, Ok(stale), &selection(TopN::All)));
        assert_eq!(session.dataset_len(), 3);
        assert_eq!(session.details()[0].label, "C");
    }

    #[test]
    fn stale_render_never_overwrites_newer_one() {
        let (mut session, _) = loaded(TopN::All);
        let slow = session.start_render(&selection(TopN::limit(1)));
        let fast = session.start_render(&selection(TopN::limit(2)));
        assert!(session.commit(fast));
        assert!(!session.commit(slow));
        assert_eq!(session.details().len(), 2);
        assert_eq!(session.heading(), "Top 2 Supply Name by Total Paid");
    }

    #[test]
    fn missing_column_keeps_dataset_and_blocks_render() {
        let (mut session, live) = loaded(TopN::All);
        let mut sel = selection(TopN::All);
        sel.label_column = "Vendor".into();
        session.render(&sel);
        assert_eq!(session.status().kind, StatusKind::Error);
        assert_eq!(
            session.status().text,
            AppError::ColumnNotFound { missing: vec![MissingColumn::Label("Vendor".into())] }.to_string()
        );
        assert_eq!(session.placeholder(), Some("Error: Label column 'Vendor' not found."));
        assert_eq!(session.dataset_len(), 3);
        assert_eq!(live.get(), 0);
        assert!(!session.exports_enabled());

        session.render(&selection(TopN::All));
        assert!(session.exports_enabled());
    }

    #[test]
    fn non_numeric_value_column_is_informational() {
        let mut session = Session::new(AppConfig::default(), FakeBackend::default());
        let ticket = session.select_file("p.xlsx").unwrap();
        let bytes = workbook(&[&["Supply Name", "Total"], &["A", "n/a"]]);
        session.finish_upload(ticket, Ok(bytes), &selection(TopN::limit(10)));
        assert_eq!(
            session.status(),
            &StatusMessage::info("No valid numerical data in 'Total Paid' for top 10 items. Check content or options.")
        );
        assert_eq!(session.placeholder(), Some(NO_VALID_DATA_PLACEHOLDER));
        assert!(!session.exports_enabled());
    }

    #[test]
    fn selection_change_before_upload_keeps_welcome() {
        let mut session = Session::new(AppConfig::default(), FakeBackend::default());
        let mut sel = selection(TopN::All);
        sel.chart_type = ChartType::Pie;
        session.render(&sel);
        assert_eq!(session.status(), &StatusMessage::info(WELCOME));
        assert_eq!(session.heading(), "All Supply Name by Total Paid");
        assert!(!session.exports_enabled());
    }

    #[test]
    fn refused_exports_never_reach_collaborators() {
        let mut session = Session::new(AppConfig::default(), FakeBackend::default());
        let writer = RecordingWriter::default();
        let renderer = RecordingRenderer::default();
        let dir = tempfile::tempdir().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let err = session.export_spreadsheet(&writer, dir.path(), day).unwrap_err();
        assert!(matches!(err, AppError::ExportRefused(ExportKind::Spreadsheet)));
        assert_eq!(session.status(), &StatusMessage::info("No items to export to Excel."));
        let err = session.export_pdf(&renderer, dir.path(), day).unwrap_err();
        assert!(matches!(err, AppError::ExportRefused(ExportKind::Pdf)));
        assert!(session.export_chart_spec(dir.path(), day).is_err());

        assert!(writer.calls.borrow().is_empty());
        assert!(renderer.pages.borrow().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn export_during_upload_keeps_the_upload_busy() {
        let (mut session, _) = loaded(TopN::All);
        let writer = RecordingWriter::default();
        let renderer = RecordingRenderer::default();
        let dir = tempfile::tempdir().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let ticket = session.select_file("next.xlsx").unwrap();
        assert!(session.is_busy());
        assert!(!session.exports_enabled());

        let err = session.export_spreadsheet(&writer, dir.path(), day).unwrap_err();
        assert!(matches!(err, AppError::ExportRefused(ExportKind::Spreadsheet)));
        assert!(session.export_pdf(&renderer, dir.path(), day).is_err());
        assert!(session.export_chart_spec(dir.path(), day).is_err());
        assert!(session.is_busy());
        assert!(!session.exports_enabled());
        assert!(writer.calls.borrow().is_empty());
        assert!(renderer.pages.borrow().is_empty());

        assert!(session.finish_upload(ticket, Ok(payments()), &selection(TopN::All)));
        assert!(!session.is_busy());
        assert!(session.exports_enabled());
        assert_eq!(session.file_name(), Some("next.xlsx"));
    }

    #[test]
    fn exports_use_current_view() {
        let (mut session, _) = loaded(TopN::limit(2));
        let writer = RecordingWriter::default();
        let renderer = RecordingRenderer::default();
        let dir = tempfile::tempdir().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let path = session.export_spreadsheet(&writer, dir.path(), day).unwrap();
        assert_eq!(path, dir.path().join("Top_2_Items_Supply_Name_by_Total_Paid_2024-05-01.xlsx"));
        assert_eq!(writer.calls.borrow()[0].0, 2);
        assert_eq!(session.status(), &StatusMessage::success("Items list exported to Excel successfully!"));

        let path = session.export_pdf(&renderer, dir.path(), day).unwrap();
        assert_eq!(path.file_name().unwrap(), "Report_Top_2_Items_Supply_Name_by_Total_Paid_2024-05-01.pdf");
        let page = &renderer.pages.borrow()[0];
        assert_eq!(page.chart_png, vec![1, 2, 3]);
        assert_eq!(page.subtitle, "Bar Chart: Top 2 \"Supply Name\" by \"Total Paid\"");
        assert!(session.exports_enabled());

        let spec = session.export_chart_spec(dir.path(), day).unwrap();
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(spec).unwrap()).unwrap();
        assert_eq!(json["labels"], serde_json::json!(["C", "A"]));
    }

    #[test]
    fn ranked_cells_keep_raw_values() {
        let (session, _) = loaded(TopN::All);
        let view = session.ranked().unwrap();
        assert_eq!(view.entries[0].record.row.get("PV Code"), Some(&CellValue::Text("PV-3".into())));
    }
}
