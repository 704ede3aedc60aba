//! Store-native predicates
//!
//! A [`Predicate`] is a typed tree that renders to the nested filter document
//! the store understands (`{ "title": { "contains": "Dune" } }`). Keys come
//! from registered descriptors only; request input never becomes a key.

use crate::core::error::QueryError;
use crate::core::field::{FieldDescriptor, FieldPath, FieldType};
use crate::core::operator::Operator;
use crate::core::validation::validators::as_integer;
use crate::core::validation::{canonical_timestamp, normalize};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

/// How a condition on a to-many relation is satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// At least one related record matches
    Some,
    /// Every related record matches
    Every,
}

impl Quantifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quantifier::Some => "some",
            Quantifier::Every => "every",
        }
    }
}

/// A comparison against one column
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Value),
    NotEquals(Value),
    Contains(Value),
    NotContains(Value),
    StartsWith(Value),
    EndsWith(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    /// `gte <= f < lt`
    Between { gte: Value, lt: Value },
    /// `gte <= f <= lte`
    Within { gte: Value, lte: Value },
}

impl Condition {
    pub fn to_json(&self) -> Value {
        match self {
            Condition::Equals(v) => json!({ "equals": v }),
            Condition::NotEquals(v) => json!({ "not": v }),
            Condition::Contains(v) => json!({ "contains": v }),
            Condition::NotContains(v) => json!({ "not": { "contains": v } }),
            Condition::StartsWith(v) => json!({ "startsWith": v }),
            Condition::EndsWith(v) => json!({ "endsWith": v }),
            Condition::In(vs) => json!({ "in": vs }),
            Condition::NotIn(vs) => json!({ "notIn": vs }),
            Condition::Lt(v) => json!({ "lt": v }),
            Condition::Lte(v) => json!({ "lte": v }),
            Condition::Gt(v) => json!({ "gt": v }),
            Condition::Gte(v) => json!({ "gte": v }),
            Condition::Between { gte, lt } => json!({ "gte": gte, "lt": lt }),
            Condition::Within { gte, lte } => json!({ "gte": gte, "lte": lte }),
        }
    }
}

/// A boolean condition the store evaluates per record
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Condition on a column of the record itself
    Field { path: FieldPath, condition: Condition },
    /// Condition on the records of a to-many collection
    Relation {
        collection: String,
        quantifier: Quantifier,
        inner: Box<Predicate>,
    },
    /// Condition on a nested single record
    Record { name: String, inner: Box<Predicate> },
    Or(Vec<Predicate>),
    And(Vec<Predicate>),
}

impl Predicate {
    /// Render as the store's nested filter document
    pub fn to_json(&self) -> Value {
        match self {
            Predicate::Field { path, condition } => single(path.as_str(), condition.to_json()),
            Predicate::Relation {
                collection,
                quantifier,
                inner,
            } => single(collection, single(quantifier.as_str(), inner.to_json())),
            Predicate::Record { name, inner } => single(name, inner.to_json()),
            Predicate::Or(items) => single("OR", items.iter().map(Predicate::to_json).collect()),
            Predicate::And(items) => single("AND", items.iter().map(Predicate::to_json).collect()),
        }
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Build the predicate for one validated filter
///
/// `field_type` is the effective type of the filter; `now` anchors the
/// relative-date operators.
pub fn build(
    descriptor: &FieldDescriptor,
    operator: Operator,
    value: &Value,
    field_type: FieldType,
    now: DateTime<Utc>,
) -> Result<Predicate, QueryError> {
    let invalid = || QueryError::InvalidValue {
        field: descriptor.field.clone(),
        operator: operator.to_string(),
        value: value.clone(),
    };

    let path = descriptor.path();
    let field = |condition| Predicate::Field {
        path: path.clone(),
        condition,
    };
    let value = normalize(value, field_type);

    let fragment = match operator {
        Operator::Equal => field(Condition::Equals(value)),
        Operator::NotEquals => field(Condition::NotEquals(value)),
        Operator::Contains => field(Condition::Contains(value)),
        Operator::NotContains => field(Condition::NotContains(value)),
        Operator::StartsWith => field(Condition::StartsWith(value)),
        Operator::EndsWith => field(Condition::EndsWith(value)),
        Operator::Lte | Operator::Before => field(Condition::Lte(value)),
        Operator::Lt => field(Condition::Lt(value)),
        Operator::Gte | Operator::After => field(Condition::Gte(value)),
        Operator::Gt => field(Condition::Gt(value)),
        Operator::In => field(Condition::In(into_list(value))),
        Operator::NotIn => field(Condition::NotIn(into_list(value))),
        Operator::Between => match value {
            Value::Array(items) if items.len() == 2 => {
                let mut items = items.into_iter();
                match (items.next(), items.next()) {
                    (Some(gte), Some(lt)) => field(Condition::Between { gte, lt }),
                    _ => return Err(invalid()),
                }
            }
            _ => return Err(invalid()),
        },
        Operator::IsBlank => Predicate::Or(vec![
            field(Condition::Equals(Value::String(String::new()))),
            field(Condition::Equals(Value::Null)),
        ]),
        Operator::NotBlank => Predicate::And(vec![
            field(Condition::NotEquals(Value::String(String::new()))),
            field(Condition::NotEquals(Value::Null)),
        ]),
        Operator::IsLess | Operator::IsMore | Operator::IsAfterNext | Operator::IsBeforeLast => {
            let days = as_integer(&value).ok_or_else(invalid)?;
            field(relative_condition(operator, days, now).ok_or_else(invalid)?)
        }
    };

    Ok(wrap_relation(descriptor, operator, fragment))
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Day-window conditions for relative-date operators
fn relative_condition(operator: Operator, days: i64, now: DateTime<Utc>) -> Option<Condition> {
    let offset = Duration::try_days(days)?;
    let stamp = |instant: DateTime<Utc>| Value::String(canonical_timestamp(&instant));

    let condition = match operator {
        Operator::IsLess => Condition::Within {
            gte: stamp(now.checked_sub_signed(offset)?),
            lte: stamp(now),
        },
        Operator::IsMore => Condition::Lt(stamp(now.checked_sub_signed(offset)?)),
        Operator::IsAfterNext => Condition::Gt(stamp(now.checked_add_signed(offset)?)),
        Operator::IsBeforeLast => {
            let start_of_day = now.date_naive().and_time(NaiveTime::MIN).and_utc();
            Condition::Lt(stamp(start_of_day.checked_sub_signed(offset)?))
        }
        _ => return None,
    };
    Some(condition)
}

/// Lift a fragment into its relation, if the descriptor is a relation proxy
///
/// Exclusion has to hold across the whole relation, so NOT_IN quantifies
/// over every related record; every other operator needs just one match.
fn wrap_relation(descriptor: &FieldDescriptor, operator: Operator, fragment: Predicate) -> Predicate {
    let Some(collection) = &descriptor.relation_collection_name else {
        return fragment;
    };

    let inner = match &descriptor.relation_record_name {
        Some(name) => Predicate::Record {
            name: name.clone(),
            inner: Box::new(fragment),
        },
        None => fragment,
    };

    let quantifier = if operator == Operator::NotIn {
        Quantifier::Every
    } else {
        Quantifier::Some
    };

    Predicate::Relation {
        collection: collection.clone(),
        quantifier,
        inner: Box::new(inner),
    }
}
