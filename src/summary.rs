use crate::config::ColumnConfig;
use crate::types::{DatasetSummary, NormalizedRecord, PaymentStatus, SummaryCards};
use crate::util::{format_currency, format_int, parse_cell_number};
use std::collections::HashSet;

/// Stat-card figures over the full dataset. Missing columns simply count as
/// zero; unparsable amounts add nothing to the paid total.
pub fn summarize(data: &[NormalizedRecord], columns: &ColumnConfig) -> DatasetSummary {
    let paid_code_count = data.iter().filter(|r| !r.row.is_blank(&columns.code)).count();

    let labels: HashSet<String> = data
        .iter()
        .map(|r| r.row.trimmed(&columns.grouping))
        .filter(|s| !s.is_empty())
        .collect();

    let total_paid_amount: f64 = data
        .iter()
        .filter(|r| r.payment_status == PaymentStatus::Paid)
        .filter_map(|r| r.row.get(&columns.amount).and_then(parse_cell_number))
        .filter(|n| n.is_finite())
        .sum();

    DatasetSummary {
        paid_code_count,
        unique_label_count: labels.len(),
        total_paid_amount,
    }
}

pub fn summary_cards(summary: &DatasetSummary) -> SummaryCards {
    SummaryCards {
        paid_codes: format_int(summary.paid_code_count),
        unique_labels: format_int(summary.unique_label_count),
        total_paid: format_currency(summary.total_paid_amount),
    }
}
