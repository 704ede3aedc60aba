//! In-memory repository for testing and development
//!
//! Records are plain JSON objects grouped by entity name. Predicates are
//! evaluated directly against them: strings are matched literally (the
//! wildcard escaping added for SQL-like stores is undone first), date strings
//! compare chronologically and numbers numerically.

use crate::core::predicate::{Condition, Predicate, Quantifier};
use crate::core::query::{QueryDescriptor, SortDirection, SortSpec};
use crate::core::store::Repository;
use crate::core::validation::{parse_date, unescape_wildcards};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

static NULL: Value = Value::Null;

/// In-memory repository implementation
///
/// Cloning shares the underlying storage. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record to an entity
    pub fn insert(&self, entity: &str, record: Value) -> Result<()> {
        self.insert_many(entity, vec![record])
    }

    /// Append records to an entity, keeping their order
    pub fn insert_many(&self, entity: &str, records: Vec<Value>) -> Result<()> {
        if let Some(bad) = records.iter().find(|r| !r.is_object()) {
            return Err(anyhow!("Records must be JSON objects, got: {}", bad));
        }

        let mut store = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        store.entry(entity.to_string()).or_default().extend(records);
        Ok(())
    }

    fn read<T>(&self, entity: &str, f: impl FnOnce(&[Value]) -> T) -> Result<T> {
        let store = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(f(store.get(entity).map(Vec::as_slice).unwrap_or_default()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn count(&self, entity: &str) -> Result<u64> {
        self.read(entity, |records| records.len() as u64)
    }

    async fn count_with_predicates(&self, entity: &str, predicates: &[Predicate]) -> Result<u64> {
        self.read(entity, |records| {
            records
                .iter()
                .filter(|record| matches_all(record, predicates))
                .count() as u64
        })
    }

    async fn fetch(&self, entity: &str, query: &QueryDescriptor) -> Result<Vec<Value>> {
        self.read(entity, |records| {
            let mut matching: Vec<&Value> = records
                .iter()
                .filter(|record| matches_all(record, query.predicates()))
                .collect();

            sort_records(&mut matching, query.sort());

            matching
                .into_iter()
                .skip(query.skip() as usize)
                .take(query.take() as usize)
                .cloned()
                .collect()
        })
    }
}

fn matches_all(record: &Value, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|predicate| matches(record, predicate))
}

fn lookup<'a>(record: &'a Value, key: &str) -> &'a Value {
    record.get(key).unwrap_or(&NULL)
}

/// Related records: an array, a single embedded object, or nothing
fn related<'a>(record: &'a Value, collection: &str) -> Vec<&'a Value> {
    match lookup(record, collection) {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        single => vec![single],
    }
}

fn matches(record: &Value, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Field { path, condition } => satisfies(lookup(record, path.as_str()), condition),
        Predicate::Relation {
            collection,
            quantifier,
            inner,
        } => {
            let mut items = related(record, collection).into_iter();
            match quantifier {
                Quantifier::Some => items.any(|item| matches(item, inner)),
                Quantifier::Every => items.all(|item| matches(item, inner)),
            }
        }
        Predicate::Record { name, inner } => matches(lookup(record, name), inner),
        Predicate::Or(items) => items.iter().any(|p| matches(record, p)),
        Predicate::And(items) => items.iter().all(|p| matches(record, p)),
    }
}

fn satisfies(actual: &Value, condition: &Condition) -> bool {
    let is = |expected: &Value, wanted: &[Ordering]| {
        compare(actual, expected).is_some_and(|ord| wanted.contains(&ord))
    };

    match condition {
        Condition::Equals(expected) => equals(actual, expected),
        Condition::NotEquals(expected) => !equals(actual, expected),
        Condition::Contains(needle) => text_match(actual, needle, |a, n| a.contains(n)),
        Condition::NotContains(needle) => !text_match(actual, needle, |a, n| a.contains(n)),
        Condition::StartsWith(prefix) => text_match(actual, prefix, |a, p| a.starts_with(p)),
        Condition::EndsWith(suffix) => text_match(actual, suffix, |a, s| a.ends_with(s)),
        Condition::In(options) => options.iter().any(|option| equals(actual, option)),
        Condition::NotIn(options) => !options.iter().any(|option| equals(actual, option)),
        Condition::Lt(bound) => is(bound, &[Ordering::Less]),
        Condition::Lte(bound) => is(bound, &[Ordering::Less, Ordering::Equal]),
        Condition::Gt(bound) => is(bound, &[Ordering::Greater]),
        Condition::Gte(bound) => is(bound, &[Ordering::Greater, Ordering::Equal]),
        Condition::Between { gte, lt } => {
            is(gte, &[Ordering::Greater, Ordering::Equal]) && is(lt, &[Ordering::Less])
        }
        Condition::Within { gte, lte } => {
            is(gte, &[Ordering::Greater, Ordering::Equal])
                && is(lte, &[Ordering::Less, Ordering::Equal])
        }
    }
}

fn text_match(actual: &Value, pattern: &Value, f: impl Fn(&str, &str) -> bool) -> bool {
    match (actual.as_str(), pattern.as_str()) {
        (Some(actual), Some(pattern)) => f(actual, &unescape_wildcards(pattern)),
        _ => false,
    }
}

fn equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        _ => compare(actual, expected) == Some(Ordering::Equal),
    }
}

/// Order two values of compatible kinds; `None` when they cannot be compared
fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => {
            let b = unescape_wildcards(b);
            match (parse_date(a), parse_date(&b)) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => Some(a.as_str().cmp(b.as_str())),
            }
        }
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn sort_key<'a>(record: &'a Value, spec: &SortSpec) -> &'a Value {
    match spec.collection() {
        Some(collection) => related(record, collection)
            .first()
            .map(|first| lookup(first, spec.path().as_str()))
            .unwrap_or(&NULL),
        None => lookup(record, spec.path().as_str()),
    }
}

/// Stable sort, nulls last in either direction
fn sort_records(records: &mut [&Value], spec: &SortSpec) {
    records.sort_by(|a, b| {
        let (a, b) = (sort_key(a, spec), sort_key(b, spec));
        match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = compare(a, b).unwrap_or(Ordering::Equal);
                match spec.direction() {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            }
        }
    });
}
