//! # Receipt Field Formatting Module
//!
//! Pure string-formatting helpers for the receipt renderer: currency with
//! Latin-American separators, phone-number grouping, Spanish timestamps and
//! time-derived reference codes.

use chrono::{DateTime, Datelike, Local, Timelike};
use thiserror::Error;

/// Spanish month names indexed by month number - 1.
const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Formatting failures surfaced to the renderer
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("unmapped month: {0}")]
    UnmappedMonth(u32),
}

/// Format a raw amount string with thousands separator "." and decimal
/// separator ",", two decimal digits, optionally prefixed with "$".
///
/// Fails with [`FormatError::InvalidAmount`] when the raw string is not a
/// finite number.
pub fn format_currency(raw: &str, include_symbol: bool) -> Result<String, FormatError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| FormatError::InvalidAmount(raw.to_string()))?;
    if !value.is_finite() {
        return Err(FormatError::InvalidAmount(raw.to_string()));
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, dec_part) = fixed
        .split_once('.')
        .unwrap_or((fixed.as_str(), "00"));

    // Group the integer part in threes from the right.
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let symbol = if include_symbol { "$" } else { "" };
    Ok(format!("{symbol}{sign}{grouped},{dec_part}"))
}

/// Split a phone number into groups of 3/3/remainder with single spaces.
///
/// No length validation is performed: input shorter than 6 characters
/// produces degenerate trailing groups. That mirrors the behavior users
/// already rely on and is deliberately left uncorrected.
pub fn format_phone(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let first: String = chars.iter().take(3).collect();
    let second: String = chars.iter().skip(3).take(3).collect();
    let rest: String = chars.iter().skip(6).collect();
    format!("{first} {second} {rest}")
}

/// Render a timestamp as "<day> de <month> de <year> a las <hh:mm am/pm>"
/// using the Spanish month table.
pub fn format_timestamp_es(now: &DateTime<Local>) -> Result<String, FormatError> {
    let month = now.month();
    let name = SPANISH_MONTHS
        .get(month.checked_sub(1).ok_or(FormatError::UnmappedMonth(month))? as usize)
        .ok_or(FormatError::UnmappedMonth(month))?;

    let (is_pm, hour12) = now.hour12();
    let meridiem = if is_pm { "pm" } else { "am" };
    Ok(format!(
        "{} de {} de {} a las {:02}:{:02} {}",
        now.day(),
        name,
        now.year(),
        hour12,
        now.minute(),
        meridiem
    ))
}

/// Generate a reference code: "M" followed by HHMMSS and the first two
/// digits of the microsecond field, 8 digits total.
///
/// Uniqueness is only sub-second: two renders in the same instant collide.
/// Known limitation, kept as-is.
pub fn generate_reference(now: &DateTime<Local>) -> String {
    // First two digits of the zero-padded six-digit microsecond field.
    let sub_second = (now.nanosecond() / 10_000_000).min(99);
    format!(
        "M{:02}{:02}{:02}{:02}",
        now.hour(),
        now.minute(),
        now.second(),
        sub_second
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local_time(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, h, m, s).unwrap()
    }

    #[test]
    fn test_format_currency_with_symbol() {
        assert_eq!(format_currency("107000", true).unwrap(), "$107.000,00");
        assert_eq!(format_currency("150.50", true).unwrap(), "$150,50");
        assert_eq!(format_currency("1234567.89", true).unwrap(), "$1.234.567,89");
    }

    #[test]
    fn test_format_currency_without_symbol() {
        assert_eq!(format_currency("107000", false).unwrap(), "107.000,00");
        assert_eq!(format_currency("0", false).unwrap(), "0,00");
    }

    #[test]
    fn test_format_currency_small_amounts() {
        assert_eq!(format_currency("0.5", true).unwrap(), "$0,50");
        assert_eq!(format_currency("999", true).unwrap(), "$999,00");
        assert_eq!(format_currency("1000", true).unwrap(), "$1.000,00");
    }

    #[test]
    fn test_format_currency_invalid() {
        assert!(matches!(
            format_currency("abc", true),
            Err(FormatError::InvalidAmount(_))
        ));
        assert!(matches!(
            format_currency("", true),
            Err(FormatError::InvalidAmount(_))
        ));
        assert!(matches!(
            format_currency("inf", true),
            Err(FormatError::InvalidAmount(_))
        ));
        assert!(matches!(
            format_currency("NaN", true),
            Err(FormatError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_format_currency_round_trips() {
        // Swapping the separators back must reproduce the original value.
        for raw in ["0", "12.34", "999.99", "1000", "107000", "1234567.89"] {
            let formatted = format_currency(raw, true).unwrap();
            let reverted = formatted
                .trim_start_matches('$')
                .replace('.', "")
                .replace(',', ".");
            let expected: f64 = raw.parse().unwrap();
            let actual: f64 = reverted.parse().unwrap();
            assert!((expected - actual).abs() < 0.005, "{raw} -> {formatted}");
        }
    }

    #[test]
    fn test_format_phone_ten_digits() {
        let formatted = format_phone("3120004444");
        assert_eq!(formatted, "312 000 4444");

        // Exactly two spaces, all digits preserved in order.
        assert_eq!(formatted.matches(' ').count(), 2);
        let digits: String = formatted.chars().filter(|c| c.is_ascii_digit()).collect();
        assert_eq!(digits, "3120004444");
    }

    #[test]
    fn test_format_phone_short_input_is_degenerate() {
        // Documented behavior: no length validation, trailing groups may
        // be empty.
        assert_eq!(format_phone("12345"), "123 45 ");
        assert_eq!(format_phone(""), "  ");
    }

    #[test]
    fn test_format_timestamp_es_january() {
        let now = local_time(9, 5, 0);
        assert_eq!(
            format_timestamp_es(&now).unwrap(),
            "15 de enero de 2024 a las 09:05 am"
        );
    }

    #[test]
    fn test_format_timestamp_es_noon_is_pm() {
        let now = local_time(12, 0, 0);
        let formatted = format_timestamp_es(&now).unwrap();
        assert!(formatted.ends_with("12:00 pm"), "{formatted}");
    }

    #[test]
    fn test_format_timestamp_es_midnight_is_am() {
        let now = local_time(0, 0, 0);
        let formatted = format_timestamp_es(&now).unwrap();
        assert!(formatted.ends_with("12:00 am"), "{formatted}");
    }

    #[test]
    fn test_format_timestamp_es_december() {
        let now = Local.with_ymd_and_hms(2023, 12, 24, 18, 30, 0).unwrap();
        assert_eq!(
            format_timestamp_es(&now).unwrap(),
            "24 de diciembre de 2023 a las 06:30 pm"
        );
    }

    #[test]
    fn test_generate_reference_shape() {
        let reference = generate_reference(&local_time(14, 23, 7));
        assert!(reference.starts_with('M'));
        assert_eq!(reference.len(), 9);
        assert!(reference[1..].chars().all(|c| c.is_ascii_digit()));
        assert!(reference.starts_with("M142307"));
    }

    #[test]
    fn test_generate_reference_midnight() {
        let reference = generate_reference(&local_time(0, 0, 0));
        assert_eq!(&reference[..7], "M000000");
        assert_eq!(reference.len(), 9);
    }
}
