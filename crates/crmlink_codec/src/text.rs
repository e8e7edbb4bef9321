//! Text forms of values.
//!
//! Three renderings exist: the table text used by the structured-text and
//! markup file formats, the query text used inside query markup, and the
//! inverse parse used when reading markup tables back.

use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Date format written into JSON and XML tables.
pub const TABLE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Date format written into query markup.
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a date the way tables store it, e.g. `2016-03-01T10:20:30.000Z`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(TABLE_DATE_FORMAT).to_string()
}

/// Formats a date the way query markup expects it, e.g. `2016-03-01 10:20:30`.
pub fn format_query_date(date: &DateTime<Utc>) -> String {
    date.format(QUERY_DATE_FORMAT).to_string()
}

/// Parses a UTC timestamp in either table or query form.
///
/// Accepted shapes are `YYYY-MM-DDTHH:MM:SS[.fff]Z` and
/// `YYYY-MM-DD HH:MM:SS`. Anything else, including timestamps carrying
/// an explicit offset, yields `None`.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let bytes = text.as_bytes();
    if bytes.len() < 19 || !has_date_prefix(bytes) {
        return None;
    }

    let naive = match bytes[10] {
        b'T' => {
            let body = text.strip_suffix('Z')?;
            let (whole, fraction) = match body.split_once('.') {
                Some((whole, fraction)) => (whole, Some(fraction)),
                None => (body, None),
            };
            let mut parsed = NaiveDateTime::parse_from_str(whole, "%Y-%m-%dT%H:%M:%S").ok()?;
            if let Some(fraction) = fraction {
                parsed += parse_fraction(fraction)?;
            }
            parsed
        }
        b' ' if bytes.len() == 19 => NaiveDateTime::parse_from_str(text, QUERY_DATE_FORMAT).ok()?,
        _ => return None,
    };
    Some(naive.and_utc())
}

fn has_date_prefix(bytes: &[u8]) -> bool {
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    digits(0..4)
        && bytes[4] == b'-'
        && digits(5..7)
        && bytes[7] == b'-'
        && digits(8..10)
        && digits(11..13)
        && bytes[13] == b':'
        && digits(14..16)
        && bytes[16] == b':'
        && digits(17..19)
}

fn parse_fraction(fraction: &str) -> Option<chrono::Duration> {
    if fraction.is_empty() {
        return Some(chrono::Duration::zero());
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Nanosecond precision; extra digits are dropped.
    let mut nanos: i64 = 0;
    for (i, digit) in fraction.bytes().take(9).enumerate() {
        nanos += i64::from(digit - b'0') * 10_i64.pow(8 - i as u32);
    }
    Some(chrono::Duration::nanoseconds(nanos))
}

/// Parses a calendar date (`YYYY-MM-DD`) as midnight UTC.
pub fn parse_calendar_date(text: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

/// Parses a number the way markup tables store it.
///
/// Integer text becomes [`Value::Integer`]; decimal or exponent text
/// becomes [`Value::Double`]. Only digits, signs, `.` and exponent markers
/// are accepted, so words such as `inf` stay text.
pub fn parse_number(text: &str) -> Option<Value> {
    if text.is_empty()
        || !text.bytes().any(|b| b.is_ascii_digit())
        || !text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::Integer(n));
    }
    text.parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .map(Value::Double)
}

/// Infers a typed value from markup text.
///
/// Tries boolean, then number, then date; falls back to text.
pub fn parse_text_value(text: &str) -> Value {
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Some(number) = parse_number(text) {
        return number;
    }
    if let Some(date) = parse_date(text) {
        return Value::DateTime(date);
    }
    Value::Text(text.to_string())
}

/// Renders a double so that [`parse_number`] reads it back as a double.
pub fn format_double(d: f64) -> String {
    if d.is_finite() && d.fract() == 0.0 {
        format!("{d:.1}")
    } else {
        d.to_string()
    }
}

/// Renders a scalar as table text.
///
/// Returns `None` for null; arrays and maps are rendered as compact JSON.
pub fn format_table_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Integer(n) => Some(n.to_string()),
        Value::Double(d) => Some(format_double(*d)),
        Value::Text(s) => Some(s.clone()),
        Value::DateTime(d) => Some(format_date(d)),
        Value::Array(_) | Value::Map(_) => crate::encoder::to_json_string(value).ok(),
    }
}

/// Renders a value as query-markup text.
pub fn format_query_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Text(s) => s.clone(),
        Value::DateTime(d) => format_query_date(d),
        Value::Array(_) | Value::Map(_) => {
            crate::encoder::to_json_string(value).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 3, 1, 10, 20, 30).unwrap()
    }

    #[test]
    fn date_formats() {
        assert_eq!(format_date(&sample()), "2016-03-01T10:20:30.000Z");
        assert_eq!(format_query_date(&sample()), "2016-03-01 10:20:30");
    }

    #[test]
    fn parse_both_date_forms() {
        assert_eq!(parse_date("2016-03-01T10:20:30.000Z"), Some(sample()));
        assert_eq!(parse_date("2016-03-01T10:20:30Z"), Some(sample()));
        assert_eq!(parse_date("2016-03-01 10:20:30"), Some(sample()));
    }

    #[test]
    fn parse_fractional_seconds() {
        let parsed = parse_date("2016-03-01T10:20:30.5Z").unwrap();
        assert_eq!(parsed.nanosecond(), 500_000_000);
        let parsed = parse_date("2016-03-01T10:20:30.123Z").unwrap();
        assert_eq!(parsed.nanosecond(), 123_000_000);
    }

    #[test]
    fn rejects_non_dates() {
        assert_eq!(parse_date("2016-03-01"), None);
        assert_eq!(parse_date("2016-03-01T10:20:30+01:00"), None);
        assert_eq!(parse_date("2016-13-01T10:20:30Z"), None);
        assert_eq!(parse_date("hello world, not a date"), None);
        assert_eq!(parse_date("2016-03-01 10:20:30 extra"), None);
    }

    #[test]
    fn calendar_dates() {
        let parsed = parse_calendar_date("2016-03-01").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2016, 3, 1, 0, 0, 0).unwrap());
        assert!(parse_calendar_date("03/01/2016").is_none());
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number("42"), Some(Value::Integer(42)));
        assert_eq!(parse_number("-7"), Some(Value::Integer(-7)));
        assert_eq!(parse_number("1.5"), Some(Value::Double(1.5)));
        assert_eq!(parse_number("3.0"), Some(Value::Double(3.0)));
        assert_eq!(parse_number("1e3"), Some(Value::Double(1000.0)));
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn text_value_inference_order() {
        assert_eq!(parse_text_value("TRUE"), Value::Bool(true));
        assert_eq!(parse_text_value("false"), Value::Bool(false));
        assert_eq!(parse_text_value("10"), Value::Integer(10));
        assert_eq!(
            parse_text_value("2016-03-01T10:20:30.000Z"),
            Value::DateTime(sample())
        );
        assert_eq!(parse_text_value("plain"), Value::from("plain"));
        assert_eq!(parse_text_value(" 10"), Value::from(" 10"));
    }

    #[test]
    fn whole_doubles_keep_their_type() {
        let text = format_table_text(&Value::Double(3.0)).unwrap();
        assert_eq!(text, "3.0");
        assert_eq!(parse_text_value(&text), Value::Double(3.0));
        assert_eq!(format_table_text(&Value::Double(0.25)).unwrap(), "0.25");
    }

    #[test]
    fn query_text() {
        assert_eq!(format_query_text(&Value::Double(3.0)), "3");
        assert_eq!(format_query_text(&Value::Bool(true)), "true");
        assert_eq!(
            format_query_text(&Value::DateTime(sample())),
            "2016-03-01 10:20:30"
        );
        assert_eq!(format_query_text(&Value::Null), "");
    }
}
