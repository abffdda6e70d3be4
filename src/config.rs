// Runtime configuration: which columns carry which meaning, how value
// columns are decorated, the initial control values and output locations.
//
// Everything has a built-in default matching the procurement workbook
// layout; a JSON file passed with `--config` may override any part of it.
use crate::display::{ColumnPolicy, DisplayPolicy, ValueStyle};
use crate::error::AppError;
use crate::types::{ChartType, TopN, ViewSelection};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

static BUILTIN: Lazy<AppConfig> = Lazy::new(AppConfig::builtin);

/// Designated column names in the uploaded sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub payment_method: String,
    pub code: String,
    pub grouping: String,
    pub amount: String,
    pub created_date: String,
    pub paid_date: String,
    pub purpose: String,
    pub requester: String,
    pub paid_by: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        BUILTIN.columns.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig { width: 1200, height: 700 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub columns: ColumnConfig,
    pub display: DisplayPolicy,
    pub defaults: ViewSelection,
    pub chart: ChartConfig,
    pub output_dir: PathBuf,
    pub fonts_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl AppConfig {
    fn builtin() -> AppConfig {
        AppConfig {
            columns: ColumnConfig {
                payment_method: "Paid Method".into(),
                code: "PV Code".into(),
                grouping: "Supply Name".into(),
                amount: "Total".into(),
                created_date: "Created Date".into(),
                paid_date: "Paid Date".into(),
                purpose: "Purpose".into(),
                requester: "Requester".into(),
                paid_by: "Paid By".into(),
            },
            display: DisplayPolicy::new(vec![
                ColumnPolicy {
                    column: "Total".into(),
                    display_name: "Total Paid".into(),
                    style: ValueStyle::Currency,
                    prefix: "$".into(),
                    suffix: String::new(),
                },
                ColumnPolicy {
                    column: "Processing Speed".into(),
                    display_name: "Processing Speed Days".into(),
                    style: ValueStyle::Duration,
                    prefix: String::new(),
                    suffix: " Days".into(),
                },
            ]),
            defaults: ViewSelection {
                top_n: TopN::limit(10),
                value_column: "Total".into(),
                label_column: "Supply Name".into(),
                chart_type: ChartType::Bar,
            },
            chart: ChartConfig::default(),
            output_dir: PathBuf::from("."),
            fonts_dir: PathBuf::from("./fonts"),
        }
    }

    /// Built-in defaults, or the given JSON file layered over them.
    pub fn load(path: Option<&Path>) -> Result<AppConfig, AppError> {
        let Some(path) = path else {
            return Ok(AppConfig::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text).map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(text: &str) -> Result<AppConfig, serde_json::Error> {
        serde_json::from_str(text)
    }
}
