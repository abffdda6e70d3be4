use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use tabled::Tabled;

/// One untyped spreadsheet cell, as handed over by the workbook parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    /// String form of the cell, the way a spreadsheet would print it.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.format("%m/%d/%Y").to_string(),
        }
    }

    /// True for empty cells and for text that trims to nothing.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(d: NaiveDateTime) -> Self {
        CellValue::Date(d)
    }
}

/// A parsed input row keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawRow {
    cells: HashMap<String, CellValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// Trimmed string form of a cell; empty when the column is absent.
    pub fn trimmed(&self, column: &str) -> String {
        self.get(column).map(|c| c.to_text().trim().to_string()).unwrap_or_default()
    }

    pub fn is_blank(&self, column: &str) -> bool {
        self.get(column).map_or(true, CellValue::is_blank)
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let cells = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        RawRow { cells }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Unpaid => write!(f, "Unpaid"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub row: RawRow,
    pub payment_status: PaymentStatus,
}

/// Whole-dataset figures shown in the stat cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub paid_code_count: usize,
    pub unique_label_count: usize,
    pub total_paid_amount: f64,
}

/// How many ranked items to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopN {
    Limit(NonZeroUsize),
    All,
}

impl TopN {
    pub fn limit(n: usize) -> Self {
        NonZeroUsize::new(n).map_or(TopN::All, TopN::Limit)
    }

    /// Lower-case form used inside sentences ("top 10", "all").
    pub fn scope(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for TopN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopN::Limit(n) => write!(f, "Top {}", n),
            TopN::All => write!(f, "All"),
        }
    }
}

impl FromStr for TopN {
    type Err = String;

    // "-1", "0" and "all" all mean unbounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s == "-1" {
            return Ok(TopN::All);
        }
        s.parse::<usize>()
            .map(TopN::limit)
            .map_err(|_| format!("expected a positive number or 'all', got '{}'", s))
    }
}

impl Serialize for TopN {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TopN::Limit(n) => serializer.serialize_u64(n.get() as u64),
            TopN::All => serializer.serialize_str("all"),
        }
    }
}

impl<'de> Deserialize<'de> for TopN {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Count(i64),
            Word(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Count(n) if n > 0 => Ok(TopN::limit(n as usize)),
            Repr::Count(_) => Ok(TopN::All),
            Repr::Word(w) => w.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Doughnut,
}

impl ChartType {
    /// Pie and doughnut charts show shares of a whole and get per-slice colours.
    pub fn is_proportional(&self) -> bool {
        matches!(self, ChartType::Pie | ChartType::Doughnut)
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartType::Bar => "Bar",
            ChartType::Line => "Line",
            ChartType::Pie => "Pie",
            ChartType::Doughnut => "Doughnut",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "pie" => Ok(ChartType::Pie),
            "doughnut" | "donut" => Ok(ChartType::Doughnut),
            other => Err(format!("unknown chart type '{}' (bar, line, pie, doughnut)", other)),
        }
    }
}

/// The four user controls, captured together at the moment of a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSelection {
    pub top_n: TopN,
    pub value_column: String,
    pub label_column: String,
    pub chart_type: ChartType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub record: NormalizedRecord,
    pub value: f64,
}

/// Records that survived numeric filtering, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedView {
    pub selection: ViewSelection,
    pub entries: Vec<RankedEntry>,
}

impl RankedView {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value).collect()
    }
}

/// One line of the ranked detail list.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct DetailItem {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Item")]
    #[tabled(rename = "Item")]
    pub label: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: PaymentStatus,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "CreateDate")]
    #[tabled(rename = "Create Date")]
    pub created_date: String,
    #[serde(rename = "PaidDate")]
    #[tabled(rename = "Paid Date")]
    pub paid_date: String,
    #[serde(rename = "Purpose")]
    #[tabled(rename = "Purpose")]
    pub purpose: String,
}

/// Stat-card rendering of a `DatasetSummary`.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SummaryCards {
    #[tabled(rename = "PV Codes")]
    pub paid_codes: String,
    #[tabled(rename = "Suppliers")]
    pub unique_labels: String,
    #[tabled(rename = "Total Paid")]
    pub total_paid: String,
}
