//! Filter value validators
//!
//! Pure checks over untrusted JSON values: effective type resolution and
//! type-specific well-formedness. Nothing here knows about entities.

use crate::core::field::FieldType;
use crate::core::operator::Operator;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Exclusive upper bound of a relative day count
pub const NOW_DATE_RANGE_LIMIT: i64 = 1000;

/// Date-only format accepted by DATE filters
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Resolve the type a filter is validated and built against
///
/// A `Date`/`DateTime` field filtered by a whole number becomes a relative
/// range (`createdAt` by `7` means "the last 7 days"); a `[from, to]` pair of
/// dates becomes a date range whatever the declared type, so a `String` field
/// filtered by two dates only accepts `BETWEEN`. Anything else keeps its
/// declared type.
pub fn effective_type(declared: FieldType, value: &Value) -> FieldType {
    if declared.is_date() && as_integer(value).is_some() {
        return FieldType::NowDateRange;
    }
    if is_date_range(value) {
        return FieldType::DateRange;
    }
    declared
}

/// Check a value against the rules of its effective type
pub fn validate(value: &Value, field_type: FieldType, operator: Operator) -> bool {
    match field_type {
        FieldType::String => {
            operator.is_blank_check() || each_element(value, operator, |v| v.is_string())
        }
        FieldType::Number | FieldType::Integer => {
            each_element(value, operator, |v| as_integer(v).is_some())
        }
        FieldType::Decimal => each_element(value, operator, |v| as_number(v).is_some()),
        FieldType::Date | FieldType::DateTime => value.as_str().is_some_and(is_date),
        FieldType::DateRange => is_date_range_pair(value),
        FieldType::NowDateRange => {
            as_integer(value).is_some_and(|n| n > 0 && n < NOW_DATE_RANGE_LIMIT)
        }
    }
}

/// Scalar rule for plain operators, element-wise rule for list operators
fn each_element(value: &Value, operator: Operator, rule: impl Fn(&Value) -> bool) -> bool {
    match (operator, value) {
        (Operator::Between, Value::Array(items)) => items.len() == 2 && items.iter().all(rule),
        (Operator::Between, _) => false,
        (Operator::In | Operator::NotIn, Value::Array(items)) => {
            !items.is_empty() && items.iter().all(rule)
        }
        (_, Value::Array(_)) => false,
        _ => rule(value),
    }
}

fn is_date_range(value: &Value) -> bool {
    match value {
        Value::Array(items) if items.len() >= 2 => items[..2]
            .iter()
            .all(|item| item.as_str().is_some_and(is_date)),
        _ => false,
    }
}

fn is_date_range_pair(value: &Value) -> bool {
    match value {
        Value::Array(items) if items.len() == 2 => items.iter().all(|item| {
            item.as_str()
                .is_some_and(|s| !s.trim().is_empty() && is_date(s))
        }),
        _ => false,
    }
}

/// Whether a string parses under the date or one of the date-time formats
pub fn is_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// Parse a filter date into a UTC instant
///
/// Date-only values resolve to midnight UTC; naive date-times are read as UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|dt| dt.and_utc())
}

/// Read a value as a whole number, accepting numeric strings
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
        Value::String(s) => {
            let s = s.trim();
            if integer_regex().is_match(s) {
                s.parse().ok()
            } else {
                s.parse::<f64>().ok().and_then(whole)
            }
        }
        _ => None,
    }
}

/// Out-of-range floats are rejected, never clamped to the `i64` bounds
fn whole(f: f64) -> Option<i64> {
    // 2^63 is exact as f64, i64::MAX is not
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    (f.is_finite() && f.fract() == 0.0 && f >= -UPPER && f < UPPER).then(|| f as i64)
}

/// Read a value as a number, accepting numeric strings
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn integer_regex() -> &'static Regex {
    static INTEGER_REGEX: OnceLock<Regex> = OnceLock::new();
    INTEGER_REGEX.get_or_init(|| Regex::new(r"^[+-]?\d+$").expect("static regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::operator::operators_for;
    use serde_json::json;

    // === effective_type() ===

    #[test]
    fn test_date_with_integer_becomes_now_date_range() {
        assert_eq!(
            effective_type(FieldType::DateTime, &json!("7")),
            FieldType::NowDateRange
        );
        assert_eq!(
            effective_type(FieldType::Date, &json!(30)),
            FieldType::NowDateRange
        );
        assert_eq!(
            effective_type(FieldType::Date, &json!(-3)),
            FieldType::NowDateRange
        );
    }

    #[test]
    fn test_date_pair_becomes_date_range() {
        assert_eq!(
            effective_type(FieldType::Date, &json!(["2024-01-01", "2024-02-01"])),
            FieldType::DateRange
        );
        assert_eq!(
            effective_type(FieldType::DateTime, &json!(["2024-01-01T10:00:00Z", "2024-01-02 08:30:00"])),
            FieldType::DateRange
        );
    }

    #[test]
    fn test_other_values_keep_declared_type() {
        assert_eq!(
            effective_type(FieldType::Date, &json!("2024-01-01")),
            FieldType::Date
        );
        assert_eq!(
            effective_type(FieldType::Date, &json!("")),
            FieldType::Date
        );
        assert_eq!(
            effective_type(FieldType::Number, &json!(7)),
            FieldType::Number
        );
        assert_eq!(
            effective_type(FieldType::Number, &json!([10, 20])),
            FieldType::Number
        );
        assert_eq!(
            effective_type(FieldType::Date, &json!(["2024-01-01"])),
            FieldType::Date
        );
    }

    // === validate() ===

    #[test]
    fn test_string_rules() {
        assert!(validate(&json!("Dune"), FieldType::String, Operator::Contains));
        assert!(!validate(&json!(42), FieldType::String, Operator::Equal));
        assert!(validate(&json!(null), FieldType::String, Operator::IsBlank));
        assert!(validate(&json!(42), FieldType::String, Operator::NotBlank));
        assert!(validate(&json!(["a", "b"]), FieldType::String, Operator::In));
        assert!(!validate(&json!(["a", 1]), FieldType::String, Operator::In));
        assert!(!validate(&json!(["a", "b"]), FieldType::String, Operator::Equal));
    }

    #[test]
    fn test_integer_rules() {
        assert!(validate(&json!(3), FieldType::Number, Operator::Equal));
        assert!(validate(&json!("3"), FieldType::Integer, Operator::Equal));
        assert!(!validate(&json!(3.5), FieldType::Number, Operator::Equal));
        assert!(!validate(&json!("three"), FieldType::Integer, Operator::Gt));
        assert!(!validate(&json!(true), FieldType::Number, Operator::Equal));
    }

    #[test]
    fn test_decimal_accepts_fractions() {
        assert!(validate(&json!(3.5), FieldType::Decimal, Operator::Lte));
        assert!(validate(&json!("2.25"), FieldType::Decimal, Operator::Lte));
        assert!(validate(&json!(4), FieldType::Decimal, Operator::Lte));
        assert!(!validate(&json!("NaN"), FieldType::Decimal, Operator::Lte));
    }

    #[test]
    fn test_between_needs_exactly_two_elements() {
        assert!(validate(&json!([10, 20]), FieldType::Number, Operator::Between));
        assert!(!validate(&json!([10]), FieldType::Number, Operator::Between));
        assert!(!validate(&json!([10, 20, 30]), FieldType::Number, Operator::Between));
        assert!(!validate(&json!(10), FieldType::Number, Operator::Between));
    }

    #[test]
    fn test_in_accepts_scalar_or_non_empty_list() {
        assert!(validate(&json!(1), FieldType::Number, Operator::In));
        assert!(validate(&json!([1, 2]), FieldType::Number, Operator::NotIn));
        assert!(!validate(&json!([]), FieldType::Number, Operator::In));
    }

    #[test]
    fn test_date_rules() {
        assert!(validate(&json!("2024-01-15"), FieldType::Date, Operator::Equal));
        assert!(validate(&json!("2024-01-15T10:30:00Z"), FieldType::DateTime, Operator::After));
        assert!(validate(&json!("2024-01-15 10:30:00"), FieldType::DateTime, Operator::After));
        assert!(!validate(&json!("15/01/2024"), FieldType::Date, Operator::Equal));
        assert!(!validate(&json!("2024-02-30"), FieldType::Date, Operator::Equal));
        assert!(!validate(&json!(20240115), FieldType::Date, Operator::Equal));
    }

    #[test]
    fn test_date_range_rules() {
        assert!(validate(&json!(["2024-01-01", "2024-02-01"]), FieldType::DateRange, Operator::Between));
        assert!(!validate(&json!(["2024-01-01", ""]), FieldType::DateRange, Operator::Between));
        assert!(!validate(&json!(["2024-01-01"]), FieldType::DateRange, Operator::Between));
        assert!(!validate(
            &json!(["2024-01-01", "2024-02-01", "2024-03-01"]),
            FieldType::DateRange,
            Operator::Between
        ));
    }

    #[test]
    fn test_now_date_range_bounds() {
        assert!(validate(&json!("7"), FieldType::NowDateRange, Operator::IsLess));
        assert!(validate(&json!(999), FieldType::NowDateRange, Operator::IsMore));
        assert!(!validate(&json!(1000), FieldType::NowDateRange, Operator::IsMore));
        assert!(!validate(&json!("1500"), FieldType::NowDateRange, Operator::IsLess));
        assert!(!validate(&json!(0), FieldType::NowDateRange, Operator::IsLess));
        assert!(!validate(&json!(-5), FieldType::NowDateRange, Operator::IsLess));
    }

    // === helpers ===

    #[test]
    fn test_parse_date_normalizes_to_utc() {
        let parsed = parse_date("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T10:00:00+00:00");

        let midnight = parse_date("2024-03-01").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_as_integer() {
        assert_eq!(as_integer(&json!(7)), Some(7));
        assert_eq!(as_integer(&json!(7.0)), Some(7));
        assert_eq!(as_integer(&json!(" 12 ")), Some(12));
        assert_eq!(as_integer(&json!("7.0")), Some(7));
        assert_eq!(as_integer(&json!("7.5")), None);
        assert_eq!(as_integer(&json!("")), None);
        assert_eq!(as_integer(&json!([7])), None);
    }

    #[test]
    fn test_as_integer_rejects_out_of_range() {
        assert_eq!(as_integer(&json!(18446744073709551615u64)), None);
        assert_eq!(as_integer(&json!("1e20")), None);
        assert_eq!(as_integer(&json!("99999999999999999999")), None);
        assert_eq!(as_integer(&json!(-1e19)), None);
        assert_eq!(as_integer(&json!(i64::MAX)), Some(i64::MAX));
        assert_eq!(as_integer(&json!("1e3")), Some(1000));
        assert!(!validate(&json!("1e20"), FieldType::Number, Operator::Equal));
    }

    #[test]
    fn test_string_field_with_date_pair_is_a_date_range() {
        let pair = json!(["2024-01-01", "2024-02-01"]);
        assert_eq!(effective_type(FieldType::String, &pair), FieldType::DateRange);
        assert!(!operators_for(FieldType::DateRange).contains(&Operator::In));
    }
}
