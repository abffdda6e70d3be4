use crate::error::{AppError, MissingColumn};
use crate::types::{NormalizedRecord, RankedEntry, RankedView, TopN, ViewSelection};
use crate::util::parse_cell_finite;
use log::debug;
use std::cmp::Ordering;

/// Build the ranked view for one selection.
///
/// Column presence is checked against the first record only. Rows whose
/// value cell is missing or not a finite number are dropped, the rest are
/// sorted highest first (ties keep input order) and cut to `top_n`.
/// An empty result is not an error here; callers decide how to report it.
pub fn rank(data: &[NormalizedRecord], selection: &ViewSelection) -> Result<RankedView, AppError> {
    if let Some(first) = data.first() {
        let mut missing = Vec::new();
        if !first.row.has_column(&selection.label_column) {
            missing.push(MissingColumn::Label(selection.label_column.clone()));
        }
        if !first.row.has_column(&selection.value_column) {
            missing.push(MissingColumn::Value(selection.value_column.clone()));
        }
        if !missing.is_empty() {
            return Err(AppError::ColumnNotFound { missing });
        }
    }

    let mut entries: Vec<RankedEntry> = data
        .iter()
        .filter_map(|record| {
            let value = record.row.get(&selection.value_column).and_then(parse_cell_finite)?;
            Some(RankedEntry { record: record.clone(), value })
        })
        .collect();
    let valid = entries.len();

    // `sort_by` is stable, which is what keeps equal values in input order.
    entries.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    if let TopN::Limit(n) = selection.top_n {
        entries.truncate(n.get());
    }

    debug!(
        "ranked {} of {} rows by '{}' ({} numeric, keeping {})",
        entries.len(),
        data.len(),
        selection.value_column,
        valid,
        selection.top_n
    );
    Ok(RankedView { selection: selection.clone(), entries })
}
