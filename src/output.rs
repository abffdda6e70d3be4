use crate::error::StatusKind;
use crate::session::StatusMessage;
use crate::types::{DetailItem, SummaryCards};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn status_line(message: &StatusMessage) -> String {
    let tag = match message.kind {
        StatusKind::Error => "Error",
        StatusKind::Info => "Info",
        StatusKind::Success => "Done",
    };
    format!("[{}] {}", tag, message.text)
}

pub fn print_status(message: &StatusMessage) {
    println!("{}\n", status_line(message));
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    match render_table(rows, max_rows) {
        Some(table_str) => println!("{}\n", table_str),
        None => println!("(no rows)\n"),
    }
}

/// Heading plus the ranked list, or the placeholder when there is nothing to list.
pub fn preview_details(heading: &str, rows: &[DetailItem], placeholder: Option<&str>) {
    println!("\n{}", heading);
    if rows.is_empty() {
        println!("({})\n", placeholder.unwrap_or("no rows"));
        return;
    }
    preview_table_rows(rows, rows.len());
}

pub fn preview_summary(cards: &SummaryCards) {
    preview_table_rows(std::slice::from_ref(cards), 1);
}
