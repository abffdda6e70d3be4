// One-page landscape PDF report around the chart snapshot.
use crate::config::AppConfig;
use crate::error::{AppError, ExportKind};
use crate::types::ViewSelection;
use chrono::NaiveDate;
use genpdf::elements::{Break, Image as PdfImage, Paragraph};
use genpdf::style::{Style, StyledString};
use genpdf::{Alignment, Document, Element, Size};
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const REPORT_TITLE: &str = "Data Visualization Report";

const PAGE_WIDTH_MM: f64 = 297.0;
const PAGE_HEIGHT_MM: f64 = 210.0;
const MARGIN_MM: f64 = 14.0;
/// Room left for the chart after the three header lines.
const CHART_HEIGHT_MM: f64 = 140.0;
const MM_PER_INCH: f64 = 25.4;

/// Everything printed on the report page.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPage {
    pub title: String,
    pub generated_on: String,
    pub subtitle: String,
    pub chart_png: Vec<u8>,
}

impl ReportPage {
    pub fn new(selection: &ViewSelection, config: &AppConfig, today: NaiveDate, chart_png: Vec<u8>) -> Self {
        ReportPage {
            title: REPORT_TITLE.to_string(),
            generated_on: format!("Generated on: {}", today.format("%B %-d, %Y")),
            subtitle: format!(
                "{} Chart: {} \"{}\" by \"{}\"",
                selection.chart_type,
                selection.top_n,
                selection.label_column,
                config.display.display_name(&selection.value_column)
            ),
            chart_png,
        }
    }
}

pub trait PdfRenderer {
    fn render(&self, page: &ReportPage, path: &Path) -> Result<(), AppError>;
}

/// DPI that fits a `width` x `height` pixel image inside the printable
/// area while keeping its aspect ratio.
pub fn fit_dpi(width: u32, height: u32) -> f64 {
    let printable_width = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM) / MM_PER_INCH;
    let printable_height = CHART_HEIGHT_MM / MM_PER_INCH;
    let by_width = width as f64 / printable_width;
    let by_height = height as f64 / printable_height;
    by_width.max(by_height).max(1.0)
}

fn png_dimensions(png: &[u8]) -> Option<(u32, u32)> {
    // IHDR always follows the 8 byte signature and 8 byte chunk header.
    if png.len() < 24 || &png[12..16] != b"IHDR" {
        return None;
    }
    let w = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
    let h = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
    Some((w, h))
}

/// Renders with `genpdf`; fonts are loaded from `fonts_dir`.
pub struct GenPdfRenderer {
    fonts_dir: PathBuf,
}

impl GenPdfRenderer {
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Self {
        GenPdfRenderer { fonts_dir: fonts_dir.into() }
    }

    fn load_font(&self) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, AppError> {
        if let Ok(family) = genpdf::fonts::from_files(&self.fonts_dir, "LiberationSans", None) {
            return Ok(family);
        }
        genpdf::fonts::from_files(&self.fonts_dir, "Arial", None).map_err(|e| {
            AppError::export_failed(
                ExportKind::Pdf,
                format!("no usable font in {}: {}", self.fonts_dir.display(), e),
            )
        })
    }
}

impl PdfRenderer for GenPdfRenderer {
    fn render(&self, page: &ReportPage, path: &Path) -> Result<(), AppError> {
        let fail = |e: genpdf::error::Error| AppError::export_failed(ExportKind::Pdf, e);
        let (px_w, px_h) = png_dimensions(&page.chart_png)
            .ok_or_else(|| AppError::export_failed(ExportKind::Pdf, "chart snapshot is not a PNG image"))?;

        let mut doc = Document::new(self.load_font()?);
        doc.set_title(page.title.clone());
        doc.set_paper_size(Size::new(PAGE_WIDTH_MM, PAGE_HEIGHT_MM));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(MARGIN_MM as i32);
        doc.set_page_decorator(decorator);

        doc.push(
            Paragraph::new(StyledString::new(page.title.clone(), Style::new().bold().with_font_size(18)))
                .aligned(Alignment::Center),
        );
        doc.push(Paragraph::new(page.generated_on.clone()).styled(Style::new().with_font_size(10)));
        doc.push(Paragraph::new(page.subtitle.clone()).styled(Style::new().with_font_size(12)));
        doc.push(Break::new(1));

        // genpdf reads images from disk; the file must outlive `render_to_file`.
        let mut tmp = NamedTempFile::new().map_err(|e| AppError::export_failed(ExportKind::Pdf, e))?;
        tmp.write_all(&page.chart_png).map_err(|e| AppError::export_failed(ExportKind::Pdf, e))?;
        let mut image = PdfImage::from_path(tmp.path()).map_err(fail)?;
        image.set_dpi(fit_dpi(px_w, px_h));
        image.set_alignment(Alignment::Center);
        doc.push(image);

        debug!("rendering {}x{} chart into {}", px_w, px_h, path.display());
        doc.render_to_file(path).map_err(fail)?;
        info!("wrote report {}", path.display());
        Ok(())
    }
}
