// Column display policy shared by the on-screen views and the exporters, so
// a value renders the same way in the list, the tooltip and the workbook.
use crate::util::format_decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueStyle {
    Plain,
    Currency,
    Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPolicy {
    pub column: String,
    pub display_name: String,
    pub style: ValueStyle,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayPolicy {
    policies: Vec<ColumnPolicy>,
}

impl DisplayPolicy {
    pub fn new(policies: Vec<ColumnPolicy>) -> Self {
        DisplayPolicy { policies }
    }

    pub fn lookup(&self, column: &str) -> Option<&ColumnPolicy> {
        self.policies.iter().find(|p| p.column == column)
    }

    /// Columns with a configured policy, in configuration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.policies.iter().map(|p| p.column.as_str())
    }

    /// Heading/axis name for a value column; falls back to the column name.
    pub fn display_name(&self, column: &str) -> String {
        self.lookup(column).map_or_else(|| column.to_string(), |p| p.display_name.clone())
    }

    pub fn style(&self, column: &str) -> ValueStyle {
        self.lookup(column).map_or(ValueStyle::Plain, |p| p.style)
    }

    /// `$1,234.5`, `12 Days`, or a plain grouped decimal.
    pub fn format_value(&self, column: &str, value: f64) -> String {
        let body = format_decimal(value, 2);
        match self.lookup(column) {
            Some(p) => format!("{}{}{}", p.prefix, body, p.suffix),
            None => body,
        }
    }

    /// Excel number format carrying the same decoration as `format_value`.
    pub fn number_format(&self, column: &str) -> String {
        match self.lookup(column) {
            Some(p) => format!("{}#,##0.00{}", quote_literal(&p.prefix), quote_literal(&p.suffix)),
            None => "#,##0.00".to_string(),
        }
    }
}

fn quote_literal(s: &str) -> String {
    if s.is_empty() {
        String::new()
    } else {
        format!("\"{}\"", s.replace('"', ""))
    }
}
