//! Text formatting helpers for bot replies

use chrono::NaiveDate;

const DATE_PATTERNS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

/// Amount with unit; `precision` decimals with trailing zeros stripped
///
/// Whole amounts round half to even (`2.5 г` → `2 г`).
pub fn format_amount(value: f64, unit: &str, precision: usize) -> String {
    if precision == 0 {
        return format!("{} {}", value.round_ties_even() as i64, unit);
    }

    let text = format!("{:.*}", precision, value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, unit)
}

/// Parse `YYYY-MM-DD` or `DD.MM.YYYY`
pub fn parse_date_arg(argument: &str) -> Option<NaiveDate> {
    DATE_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(argument, pattern).ok())
}
