// src/number.rs

//! Locale-tolerant number parsing for OCR'd report cells.
//!
//! Reports in this family mix `1.234,56` and `1,234.56` freely, sometimes on
//! the same page, so the separator that appears last is taken as the decimal
//! point and the other one as grouping.

/// Digit runs at or above this value are barcodes or document numbers, never
/// quantities or prices.
pub const BARCODE_LIKE_MIN: f64 = 1_000_000_000.0;

/// Parse a numeric token such as `1.234,56`, `123,45`, `123.45` or `42`.
///
/// Returns `None` for anything that is not a number, so descriptive text
/// simply falls out of the numeric pipeline.
pub fn parse_number(text: &str) -> Option<f64> {
    let clean = strip_currency(text);
    if clean.is_empty() || !clean.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if !clean
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return None;
    }
    if clean.starts_with(['.', ',']) || clean.ends_with(['.', ',']) {
        return None;
    }

    let last_dot = clean.rfind('.');
    let last_comma = clean.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (None, None) => clean.to_string(),
        (Some(dot), Some(comma)) => {
            let (decimal, grouping) = if dot > comma { ('.', ',') } else { (',', '.') };
            // The decimal separator may only appear once.
            if clean.matches(decimal).count() > 1 {
                return None;
            }
            clean.replace(grouping, "").replace(decimal, ".")
        }
        (Some(_), None) => single_separator(clean, '.'),
        (None, Some(_)) => single_separator(clean, ','),
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a token that is a plain run of digits (no separators).
pub fn parse_integer(text: &str) -> Option<i64> {
    let t = text.trim();
    if t.is_empty() || !t.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    t.parse::<i64>().ok()
}

/// True for whole positive numbers below `limit`, the typical shape of a
/// quantity column.
pub fn is_small_positive_int(value: f64, limit: f64) -> bool {
    value > 0.0 && value < limit && value.fract() == 0.0
}

/// Round to cents, the precision every monetary value in a report carries.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn single_separator(clean: &str, sep: char) -> String {
    // `1.234.567` can only be grouping; a lone separator is the decimal point.
    if clean.matches(sep).count() > 1 {
        clean.replace(sep, "")
    } else {
        clean.replace(sep, ".")
    }
}

fn strip_currency(text: &str) -> &str {
    text.trim()
        .trim_end_matches("TL")
        .trim_end_matches('₺')
        .trim_start_matches('₺')
        .trim()
}
