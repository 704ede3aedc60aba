//! Filter value normalization
//!
//! These transforms run on already-validated values, right before predicate
//! construction, so the store only ever sees escaped strings, real numbers and
//! canonical UTC timestamps.

use super::validators::{as_integer, as_number, parse_date};
use crate::core::field::FieldType;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

/// Normalize a filter value for the given effective type
pub fn normalize(value: &Value, field_type: FieldType) -> Value {
    match field_type {
        FieldType::String => map_elements(value, escape_value),
        FieldType::Number | FieldType::Integer | FieldType::Decimal => {
            map_elements(value, to_number)
        }
        FieldType::Date | FieldType::DateTime => map_elements(value, to_timestamp),
        FieldType::DateRange | FieldType::NowDateRange => value.clone(),
    }
}

fn map_elements(value: &Value, f: impl Fn(&Value) -> Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(f).collect()),
        other => f(other),
    }
}

/// Escape the store's pattern characters so input always matches literally
pub fn escape_wildcards(input: &str) -> String {
    input.replace('_', "\\_").replace('%', "\\%")
}

/// Inverse of [`escape_wildcards`], for stores that compare literally
pub fn unescape_wildcards(input: &str) -> String {
    input.replace("\\_", "_").replace("\\%", "%")
}

fn escape_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_wildcards(s)),
        other => other.clone(),
    }
}

fn to_number(value: &Value) -> Value {
    if let Some(n) = as_integer(value) {
        return Value::Number(n.into());
    }
    as_number(value)
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| value.clone())
}

/// Purely numeric values stay numeric: they are relative day counts
fn to_timestamp(value: &Value) -> Value {
    if as_integer(value).is_some() {
        return to_number(value);
    }
    value
        .as_str()
        .and_then(parse_date)
        .map(|dt| Value::String(canonical_timestamp(&dt)))
        .unwrap_or_else(|| value.clone())
}

/// `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn canonical_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === escaping ===

    #[test]
    fn test_escape_wildcards() {
        assert_eq!(escape_wildcards("50%_off"), "50\\%\\_off");
        assert_eq!(escape_wildcards("plain"), "plain");
        assert_eq!(escape_wildcards(""), "");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        for input in ["50%_off", "__init__", "100%", "none"] {
            assert_eq!(unescape_wildcards(&escape_wildcards(input)), input);
        }
    }

    #[test]
    fn test_normalize_string_escapes_every_element() {
        let out = normalize(&json!(["a_b", "c%"]), FieldType::String);
        assert_eq!(out, json!(["a\\_b", "c\\%"]));
    }

    #[test]
    fn test_normalize_string_leaves_non_strings() {
        assert_eq!(normalize(&json!(null), FieldType::String), json!(null));
    }

    // === numbers ===

    #[test]
    fn test_normalize_numbers() {
        assert_eq!(normalize(&json!("42"), FieldType::Number), json!(42));
        assert_eq!(normalize(&json!(["1", 2]), FieldType::Integer), json!([1, 2]));
        assert_eq!(normalize(&json!("2.5"), FieldType::Decimal), json!(2.5));
        assert_eq!(normalize(&json!(3.0), FieldType::Decimal), json!(3));
    }

    // === dates ===

    #[test]
    fn test_normalize_date_to_canonical_utc() {
        assert_eq!(
            normalize(&json!("2024-01-15"), FieldType::Date),
            json!("2024-01-15T00:00:00.000Z")
        );
        assert_eq!(
            normalize(&json!("2024-01-15T12:30:00+01:00"), FieldType::DateTime),
            json!("2024-01-15T11:30:00.000Z")
        );
    }

    #[test]
    fn test_normalize_numeric_date_stays_numeric() {
        assert_eq!(normalize(&json!("7"), FieldType::DateTime), json!(7));
    }

    #[test]
    fn test_date_range_passes_through() {
        let range = json!(["2024-01-01", "2024-02-01"]);
        assert_eq!(normalize(&range, FieldType::DateRange), range);
    }
}
