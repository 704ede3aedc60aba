//! Comparison operators and the per-type operator catalog

use crate::core::field::FieldType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A comparison a filter can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equal,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsBlank,
    NotBlank,
    In,
    NotIn,
    Between,
    Lte,
    Gte,
    Lt,
    Gt,
    Before,
    After,
    IsLess,
    IsMore,
    IsAfterNext,
    IsBeforeLast,
}

const STRING_OPERATORS: &[Operator] = &[
    Operator::Equal,
    Operator::NotEquals,
    Operator::Contains,
    Operator::NotContains,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::IsBlank,
    Operator::NotBlank,
    Operator::In,
    Operator::NotIn,
    Operator::Between,
];

const NUMBER_OPERATORS: &[Operator] = &[
    Operator::Equal,
    Operator::NotEquals,
    Operator::Lte,
    Operator::Gte,
    Operator::Lt,
    Operator::Gt,
    Operator::In,
    Operator::NotIn,
    Operator::Between,
];

const DATE_OPERATORS: &[Operator] = &[
    Operator::Equal,
    Operator::NotEquals,
    Operator::Before,
    Operator::After,
    Operator::Lte,
    Operator::Gte,
];

const DATE_RANGE_OPERATORS: &[Operator] = &[Operator::Between];

const NOW_DATE_RANGE_OPERATORS: &[Operator] = &[
    Operator::IsLess,
    Operator::IsMore,
    Operator::IsAfterNext,
    Operator::IsBeforeLast,
];

/// Operators legal for a field of the given (effective) type
pub fn operators_for(field_type: FieldType) -> &'static [Operator] {
    match field_type {
        FieldType::String => STRING_OPERATORS,
        FieldType::Number | FieldType::Integer | FieldType::Decimal => NUMBER_OPERATORS,
        FieldType::Date | FieldType::DateTime => DATE_OPERATORS,
        FieldType::DateRange => DATE_RANGE_OPERATORS,
        FieldType::NowDateRange => NOW_DATE_RANGE_OPERATORS,
    }
}

impl Operator {
    pub const ALL: [Operator; 21] = [
        Operator::Equal,
        Operator::NotEquals,
        Operator::Contains,
        Operator::NotContains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::IsBlank,
        Operator::NotBlank,
        Operator::In,
        Operator::NotIn,
        Operator::Between,
        Operator::Lte,
        Operator::Gte,
        Operator::Lt,
        Operator::Gt,
        Operator::Before,
        Operator::After,
        Operator::IsLess,
        Operator::IsMore,
        Operator::IsAfterNext,
        Operator::IsBeforeLast,
    ];

    /// Wire name, as used in requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "EQUAL",
            Operator::NotEquals => "NOT_EQUALS",
            Operator::Contains => "CONTAINS",
            Operator::NotContains => "NOT_CONTAINS",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::IsBlank => "IS_BLANK",
            Operator::NotBlank => "NOT_BLANK",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::Between => "BETWEEN",
            Operator::Lte => "LTE",
            Operator::Gte => "GTE",
            Operator::Lt => "LT",
            Operator::Gt => "GT",
            Operator::Before => "BEFORE",
            Operator::After => "AFTER",
            Operator::IsLess => "IS_LESS",
            Operator::IsMore => "IS_MORE",
            Operator::IsAfterNext => "IS_AFTER_NEXT",
            Operator::IsBeforeLast => "IS_BEFORE_LAST",
        }
    }

    /// Operators whose value is (or is coerced to) a list
    pub fn is_array_operator(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn | Operator::Between)
    }

    /// Operators that ignore the supplied value
    pub fn is_blank_check(&self) -> bool {
        matches!(self, Operator::IsBlank | Operator::NotBlank)
    }

    pub fn is_legal_for(&self, field_type: FieldType) -> bool {
        operators_for(field_type).contains(self)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a request names an operator that does not exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}
