// Utility helpers for parsing and display formatting.
//
// This module centralizes the "dirty" cell/number/date handling so the
// pipeline stages can work with plain `f64` and `String` values.
use crate::types::CellValue;
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Read the leading number out of a string, the way browsers' `parseFloat`
/// does.
///
/// - Skips leading whitespace.
/// - Accepts an optional sign, digits, one decimal point and an exponent.
/// - Stops at the first character that cannot continue the number, so
///   `"100 USD"` reads as `100` and `"1,200"` reads as `1`.
/// - Returns `None` when no digits were found.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0usize;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let mut digits = 0usize;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }

    // Only take the exponent if it is complete.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Numeric reading of a cell. Dates and booleans never count as numbers.
pub fn parse_cell_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) if !n.is_nan() => Some(*n),
        CellValue::Text(s) => parse_float_prefix(s),
        _ => None,
    }
}

/// Like `parse_cell_number` but rejects infinities.
pub fn parse_cell_finite(cell: &CellValue) -> Option<f64> {
    parse_cell_number(cell).filter(|n| n.is_finite())
}

/// Parse ISO-8601 date strings that some workbooks store instead of serials.
pub fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)))
}

pub fn format_date_mdy(d: &NaiveDateTime) -> String {
    d.format("%m/%d/%Y").to_string()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = group_thousands(int_part);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// `1234567` → `1,234,567`, for digit strings of any length.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Grouped decimal with at most `max_decimals` fractional digits; trailing
/// zeros are dropped (`1234.50` → `1,234.5`, `100.00` → `100`).
pub fn format_decimal(n: f64, max_decimals: usize) -> String {
    let s = format_number(n, max_decimals);
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// US-dollar amount with exactly two decimals (`-$1,234.50`).
pub fn format_currency(n: f64) -> String {
    let body = format_number(n.abs(), 2);
    if n < 0.0 && body != "0.00" {
        format!("-${}", body)
    } else {
        format!("${}", body)
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages.
    n.to_formatted_string(&Locale::en)
}

/// Make a display string safe for file names: whitespace runs become `_`
/// and curly braces are removed.
pub fn sanitize_file_part(s: &str) -> String {
    let cleaned: String = s.chars().filter(|c| *c != '{' && *c != '}').collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}
