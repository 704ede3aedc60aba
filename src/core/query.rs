//! Query requests, descriptors and pagination metadata

use crate::core::field::{FieldDescriptor, FieldPath};
use crate::core::predicate::Predicate;
use crate::core::validation::validators::as_integer;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};
use std::fmt;

/// One requested filter, exactly as the client sent it
///
/// # Example
/// ```text
/// filter=[{"field": "title", "operator": "CONTAINS", "value": "Dune"}]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

impl FilterRequest {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested ordering
///
/// The direction is also read from `value`, so `{"field": "title", "value": "asc"}`
/// and `{"field": "title", "direction": "asc"}` are equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRequest {
    pub field: String,
    #[serde(default, alias = "value")]
    pub direction: SortDirection,
}

impl SortRequest {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Resolved ordering, keyed by a registered column
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    path: FieldPath,
    collection: Option<String>,
    direction: SortDirection,
}

impl SortSpec {
    pub(crate) fn from_descriptor(descriptor: &FieldDescriptor, direction: SortDirection) -> Self {
        Self {
            path: descriptor.path(),
            collection: descriptor.relation_collection_name.clone(),
            direction,
        }
    }

    pub(crate) fn configured(field: &str, direction: SortDirection) -> Self {
        Self {
            path: FieldPath::configured(field),
            collection: None,
            direction,
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Relation collection the sort is nested under, if any
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// `{field: dir}`, or `{collection: {field: dir}}` for relation sorts
    pub fn to_json(&self) -> Value {
        let mut inner = Map::new();
        inner.insert(
            self.path.as_str().to_string(),
            Value::String(self.direction.as_str().to_string()),
        );
        match &self.collection {
            Some(collection) => {
                let mut outer = Map::new();
                outer.insert(collection.clone(), Value::Object(inner));
                Value::Object(outer)
            }
            None => Value::Object(inner),
        }
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Requested page, as loosely typed as it arrives
///
/// Anything that is not a positive whole number (`0`, `-5`, `"abc"`) falls
/// back to the configured default rather than failing the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginationRequest {
    #[serde(default)]
    pub count: Option<Value>,
    #[serde(default)]
    pub page: Option<Value>,
}

impl PaginationRequest {
    pub fn new(count: u64, page: u64) -> Self {
        Self {
            count: Some(json!(count)),
            page: Some(json!(page)),
        }
    }

    /// Resolve against the defaults
    pub fn resolve(&self, defaults: &QueryDefaults) -> Pagination {
        let take = positive(self.count.as_ref())
            .filter(|count| *count <= defaults.max_count)
            .unwrap_or(defaults.default_count);
        let page = positive(self.page.as_ref()).unwrap_or(defaults.default_page);

        Pagination {
            take,
            skip: (page - 1).saturating_mul(take),
            page,
        }
    }
}

fn positive(value: Option<&Value>) -> Option<u64> {
    value
        .and_then(as_integer)
        .filter(|n| *n > 0)
        .map(|n| n as u64)
}

/// Resolved window of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub take: u64,
    pub skip: u64,
    pub page: u64,
}

/// Fallbacks applied when a request leaves pagination or ordering out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefaults {
    pub default_count: u64,
    pub default_page: u64,
    pub max_count: u64,
    pub sort_field: String,
    pub sort_direction: SortDirection,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            default_count: 25,
            default_page: 1,
            max_count: 100,
            sort_field: "createdAt".to_string(),
            sort_direction: SortDirection::Desc,
        }
    }
}

/// A fully validated, store-ready query
///
/// Only the engine builds these; every predicate and the sort key come from
/// registered descriptors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    take: u64,
    skip: u64,
    page: u64,
    sort: SortSpec,
    predicates: Vec<Predicate>,
}

impl QueryDescriptor {
    pub(crate) fn new(pagination: Pagination, sort: SortSpec, predicates: Vec<Predicate>) -> Self {
        Self {
            take: pagination.take,
            skip: pagination.skip,
            page: pagination.page,
            sort,
            predicates,
        }
    }

    pub fn take(&self) -> u64 {
        self.take
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    /// Fragments combined under a single AND
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// The combined filter document, `{"AND": [...]}`
    pub fn where_clause(&self) -> Value {
        Predicate::And(self.predicates.clone()).to_json()
    }

    /// Render as a store call: `{take, skip, orderBy, where}`
    pub fn to_store_query(&self) -> Value {
        json!({
            "take": self.take,
            "skip": self.skip,
            "orderBy": self.sort.to_json(),
            "where": self.where_clause(),
        })
    }
}

/// Pagination metadata returned alongside a page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub count_per_page: u64,
    pub page: u64,
    pub total_records: u64,
    pub total_records_with_filter: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
    pub filters: Vec<FilterRequest>,
    pub order_by: Value,
}

impl PaginationMeta {
    pub fn new(
        query: &QueryDescriptor,
        total_records: u64,
        total_records_with_filter: u64,
        filters: &[FilterRequest],
    ) -> Self {
        let take = query.take.max(1);
        Self {
            count_per_page: query.take,
            page: query.page,
            total_records,
            total_records_with_filter,
            total_pages: total_records_with_filter.div_ceil(take),
            has_next: query
                .skip
                .checked_add(take)
                .is_some_and(|end| end < total_records_with_filter),
            has_prev: query.page > 1,
            filters: filters.to_vec(),
            order_by: query.sort.to_json(),
        }
    }
}

/// One page of records
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    #[serde(rename = "metaData")]
    pub meta: PaginationMeta,
    pub data: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldType;

    fn defaults() -> QueryDefaults {
        QueryDefaults::default()
    }

    #[test]
    fn test_pagination_defaults() {
        let resolved = PaginationRequest::default().resolve(&defaults());
        assert_eq!(
            resolved,
            Pagination {
                take: 25,
                skip: 0,
                page: 1
            }
        );
    }

    #[test]
    fn test_pagination_skip_is_exact() {
        let resolved = PaginationRequest::new(5, 3).resolve(&defaults());
        assert_eq!(resolved.take, 5);
        assert_eq!(resolved.skip, 10);
        assert_eq!(resolved.page, 3);
    }

    #[test]
    fn test_pagination_falls_back_on_bad_input() {
        for count in [json!(0), json!(-5), json!("abc"), json!(2.5), json!(null)] {
            let request = PaginationRequest {
                count: Some(count.clone()),
                page: Some(json!(0)),
            };
            let resolved = request.resolve(&defaults());
            assert_eq!(resolved.take, 25, "count {count}");
            assert_eq!(resolved.page, 1);
            assert_eq!(resolved.skip, 0);
        }
    }

    #[test]
    fn test_pagination_accepts_numeric_strings() {
        let request = PaginationRequest {
            count: Some(json!("10")),
            page: Some(json!("2")),
        };
        let resolved = request.resolve(&defaults());
        assert_eq!((resolved.take, resolved.skip, resolved.page), (10, 10, 2));
    }

    #[test]
    fn test_pagination_count_above_max_falls_back() {
        let resolved = PaginationRequest::new(500, 1).resolve(&defaults());
        assert_eq!(resolved.take, 25);
    }

    #[test]
    fn test_sort_request_accepts_value_alias() {
        let sort: SortRequest = serde_json::from_value(json!({"field": "published", "value": "asc"})).unwrap();
        assert_eq!(sort, SortRequest::new("published", SortDirection::Asc));

        let sort: SortRequest = serde_json::from_value(json!({"field": "id", "direction": "DESC"})).unwrap();
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_spec_nests_relation() {
        let authors = FieldDescriptor::new("authors", FieldType::String).relation("authors", "name");
        let spec = SortSpec::from_descriptor(&authors, SortDirection::Asc);
        assert_eq!(spec.to_json(), json!({ "authors": { "name": "asc" } }));

        let plain = SortSpec::configured("createdAt", SortDirection::Desc);
        assert_eq!(plain.to_json(), json!({ "createdAt": "desc" }));
    }

    #[test]
    fn test_pagination_meta() {
        let query = QueryDescriptor::new(
            PaginationRequest::new(20, 1).resolve(&defaults()),
            SortSpec::configured("createdAt", SortDirection::Desc),
            vec![],
        );
        let meta = PaginationMeta::new(&query, 200, 145, &[]);
        assert_eq!(meta.total_pages, 8);
        assert!(meta.has_next);
        assert!(!meta.has_prev);

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["countPerPage"], 20);
        assert_eq!(json["totalRecordsWithFilter"], 145);
        assert_eq!(json["orderBy"], json!({ "createdAt": "desc" }));
    }

    #[test]
    fn test_pagination_meta_last_page() {
        let query = QueryDescriptor::new(
            PaginationRequest::new(10, 3).resolve(&defaults()),
            SortSpec::configured("id", SortDirection::Asc),
            vec![],
        );
        let meta = PaginationMeta::new(&query, 30, 30, &[]);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_pagination_meta_far_past_the_end() {
        let request = PaginationRequest {
            count: Some(json!("10")),
            page: Some(json!(i64::MAX.to_string())),
        };
        let query = QueryDescriptor::new(
            request.resolve(&defaults()),
            SortSpec::configured("id", SortDirection::Asc),
            vec![],
        );
        assert_eq!(query.skip(), u64::MAX);

        let meta = PaginationMeta::new(&query, 30, 30, &[]);
        assert_eq!(meta.page, i64::MAX as u64);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_store_query_shape() {
        let query = QueryDescriptor::new(
            PaginationRequest::new(5, 2).resolve(&defaults()),
            SortSpec::configured("published", SortDirection::Asc),
            vec![],
        );
        assert_eq!(
            query.to_store_query(),
            json!({
                "take": 5,
                "skip": 5,
                "orderBy": { "published": "asc" },
                "where": { "AND": [] }
            })
        );
    }
}
