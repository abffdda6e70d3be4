use crate::types::{NormalizedRecord, PaymentStatus, RawRow};

/// A row is paid when its payment-method cell holds anything but whitespace.
pub fn payment_status(row: &RawRow, payment_column: &str) -> PaymentStatus {
    if row.is_blank(payment_column) {
        PaymentStatus::Unpaid
    } else {
        PaymentStatus::Paid
    }
}

/// Attach a payment status to every row. Order and length are preserved.
pub fn normalize(rows: Vec<RawRow>, payment_column: &str) -> Vec<NormalizedRecord> {
    rows.into_iter()
        .map(|row| {
            let payment_status = payment_status(&row, payment_column);
            NormalizedRecord { row, payment_status }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const METHOD: &str = "Paid Method";

    fn row_with(value: Option<CellValue>) -> RawRow {
        let mut row: RawRow = [("Supply Name", "A")].into_iter().collect();
        if let Some(v) = value {
            row.insert(METHOD, v);
        }
        row
    }

    #[test]
    fn boundary_payment_methods() {
        let cases = [
            (None, PaymentStatus::Unpaid),
            (Some(CellValue::Empty), PaymentStatus::Unpaid),
            (Some(CellValue::Text(String::new())), PaymentStatus::Unpaid),
            (Some(CellValue::Text(" \t ".into())), PaymentStatus::Unpaid),
            (Some(CellValue::Text("0".into())), PaymentStatus::Paid),
            (Some(CellValue::Text("N".into())), PaymentStatus::Paid),
            (Some(CellValue::Number(0.0)), PaymentStatus::Paid),
            (Some(CellValue::Text(" EFT ".into())), PaymentStatus::Paid),
        ];
        for (value, expected) in cases {
            let label = format!("{:?}", value);
            assert_eq!(payment_status(&row_with(value), METHOD), expected, "{}", label);
        }
    }

    #[test]
    fn empty_input_is_fine() {
        assert!(normalize(Vec::new(), METHOD).is_empty());
    }

    proptest! {
        #[test]
        fn status_follows_trimmed_text(methods in proptest::collection::vec(proptest::option::of("[ a-zA-Z0-9\t]{0,6}"), 0..40)) {
            let rows: Vec<RawRow> = methods
                .iter()
                .map(|m| row_with(m.clone().map(CellValue::Text)))
                .collect();
            let records = normalize(rows.clone(), METHOD);
            prop_assert_eq!(records.len(), rows.len());
            for ((record, original), method) in records.iter().zip(&rows).zip(&methods) {
                prop_assert_eq!(&record.row, original);
                let paid = method.as_deref().map_or(false, |m| !m.trim().is_empty());
                prop_assert_eq!(record.payment_status == PaymentStatus::Paid, paid);
            }
        }
    }
}
