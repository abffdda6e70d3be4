// Every failure the pipeline can surface to the user.
//
// Each variant renders as exactly one user-facing status line; `severity`
// decides whether it is shown as an error or as an informational notice.
use std::fmt;
use thiserror::Error;

/// How a status line is styled when it reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Error,
    Info,
    Success,
}

/// Which export action was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Spreadsheet,
    Pdf,
    ChartSpec,
}

impl ExportKind {
    fn refusal(self) -> &'static str {
        match self {
            ExportKind::Spreadsheet => "No items to export to Excel.",
            ExportKind::Pdf => "No chart data or items to export.",
            ExportKind::ChartSpec => "No chart data to export.",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::Spreadsheet => write!(f, "Excel"),
            ExportKind::Pdf => write!(f, "PDF Report"),
            ExportKind::ChartSpec => write!(f, "chart spec"),
        }
    }
}

/// Role a selected column plays in the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingColumn {
    Label(String),
    Value(String),
}

impl fmt::Display for MissingColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingColumn::Label(name) => write!(f, "Label column '{}' not found.", name),
            MissingColumn::Value(name) => write!(f, "Analysis column '{}' not found.", name),
        }
    }
}

fn describe_missing(missing: &[MissingColumn]) -> String {
    missing.iter().map(|m| format!("{} ", m)).collect()
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid file type. Please upload an Excel file (.xlsx or .xls).")]
    InvalidFileType { file_name: String },

    #[error("Error reading file. Ensure it is not corrupted.")]
    FileRead(#[source] std::io::Error),

    #[error("Error processing file: {0}")]
    Workbook(String),

    #[error("Excel sheet is empty or could not be parsed.")]
    ParseEmpty,

    #[error("{}Verify column names or select different ones.", describe_missing(.missing))]
    ColumnNotFound { missing: Vec<MissingColumn> },

    #[error("No valid numerical data in '{value_display}' for {scope} items. Check content or options.")]
    EmptyRankedView { value_display: String, scope: String },

    #[error("Failed to render chart: {0}")]
    RenderFailure(String),

    #[error("{}", .0.refusal())]
    ExportRefused(ExportKind),

    #[error("Failed to export {kind}: {reason}")]
    ExportFailed { kind: ExportKind, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    pub fn severity(&self) -> StatusKind {
        match self {
            AppError::ParseEmpty | AppError::EmptyRankedView { .. } | AppError::ExportRefused(_) => {
                StatusKind::Info
            }
            _ => StatusKind::Error,
        }
    }

    pub fn export_failed(kind: ExportKind, reason: impl fmt::Display) -> Self {
        AppError::ExportFailed { kind, reason: reason.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn column_error_names_every_missing_column() {
        let err = AppError::ColumnNotFound {
            missing: vec![
                MissingColumn::Label("Vendor".into()),
                MissingColumn::Value("Amount".into()),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Label column 'Vendor' not found. Analysis column 'Amount' not found. \
             Verify column names or select different ones."
        );
        assert_eq!(err.severity(), StatusKind::Error);
    }

    #[test]
    fn empty_view_and_refusals_are_informational() {
        let empty = AppError::EmptyRankedView { value_display: "Total Paid".into(), scope: "top 10".into() };
        assert_eq!(empty.severity(), StatusKind::Info);
        assert_eq!(
            empty.to_string(),
            "No valid numerical data in 'Total Paid' for top 10 items. Check content or options."
        );
        assert_eq!(AppError::ParseEmpty.severity(), StatusKind::Info);
        let refused = AppError::ExportRefused(ExportKind::Spreadsheet);
        assert_eq!(refused.severity(), StatusKind::Info);
        assert_eq!(refused.to_string(), "No items to export to Excel.");
    }

    #[test]
    fn io_and_render_failures_are_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert_eq!(AppError::FileRead(io).severity(), StatusKind::Error);
        assert_eq!(AppError::RenderFailure("boom".into()).severity(), StatusKind::Error);
        assert_eq!(
            AppError::export_failed(ExportKind::Pdf, "disk full").to_string(),
            "Failed to export PDF Report: disk full"
        );
    }
}
