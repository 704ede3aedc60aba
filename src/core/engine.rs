//! Query orchestration
//!
//! A request runs through fixed stages: resolve the registry, validate every
//! filter's field, then every operator, then every value, and only then build
//! pagination, predicates and the sort. A failing stage rejects the whole
//! request; nothing is partially applied.

use crate::core::error::{LibraryResult, QueryError};
use crate::core::field::{FieldDescriptor, FieldType};
use crate::core::operator::Operator;
use crate::core::predicate;
use crate::core::query::{
    FilterRequest, Page, PaginationMeta, PaginationRequest, QueryDefaults, QueryDescriptor,
    SortRequest, SortSpec,
};
use crate::core::registry::{EntityFields, FieldRegistry};
use crate::core::store::Repository;
use crate::core::validation::{effective_type, validate};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// A filter that passed every validation stage
struct CheckedFilter<'a> {
    descriptor: &'a FieldDescriptor,
    operator: Operator,
    field_type: FieldType,
    value: &'a Value,
}

/// Turns filter/sort/pagination requests into store-ready queries
///
/// Holds nothing but the read-only registry and defaults, so one engine is
/// shared across all requests.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use libris::core::engine::QueryEngine;
/// use libris::core::query::{FilterRequest, PaginationRequest};
/// use libris::entities::library_registry;
/// use serde_json::json;
///
/// let engine = QueryEngine::new(Arc::new(library_registry().unwrap()));
/// let filters = vec![FilterRequest::new("title", "CONTAINS", json!("Dune"))];
/// let query = engine
///     .build_query("books", &filters, None, &PaginationRequest::new(10, 1))
///     .unwrap();
/// assert_eq!(query.take(), 10);
/// ```
#[derive(Debug, Clone)]
pub struct QueryEngine {
    registry: Arc<FieldRegistry>,
    defaults: QueryDefaults,
}

impl QueryEngine {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self::with_defaults(registry, QueryDefaults::default())
    }

    pub fn with_defaults(registry: Arc<FieldRegistry>, defaults: QueryDefaults) -> Self {
        Self { registry, defaults }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    /// Filterable field names of an entity, in declaration order
    pub fn resolve_filterable_fields(&self, entity: &str) -> Result<Vec<String>, QueryError> {
        Ok(self.registry.get_registry(entity)?.names())
    }

    /// Whether `operator` is legal for `field` given the supplied value
    ///
    /// The value matters: it decides the field's effective type.
    pub fn is_operator_valid(&self, entity: &str, field: &str, operator: &str, value: &Value) -> bool {
        self.lookup(entity, field)
            .and_then(|descriptor| {
                let field_type = effective_type(descriptor.field_type, value);
                parse_legal(operator, field_type)
            })
            .is_some()
    }

    /// Whether `value` is well-formed for `field` under `operator`
    pub fn is_value_valid(&self, entity: &str, field: &str, value: &Value, operator: &str) -> bool {
        self.lookup(entity, field).is_some_and(|descriptor| {
            let field_type = effective_type(descriptor.field_type, value);
            parse_legal(operator, field_type).is_some_and(|op| validate(value, field_type, op))
        })
    }

    fn lookup(&self, entity: &str, field: &str) -> Option<&FieldDescriptor> {
        self.registry.get_registry(entity).ok()?.get(field)
    }

    /// Validate and build a query, with relative dates anchored at the current time
    ///
    /// Relative-date filters (`IS_LESS 7`) resolve against `Utc::now()`, so
    /// repeated calls yield different descriptors; use [`Self::build_query_at`]
    /// with a fixed `now` for reproducible output.
    pub fn build_query(
        &self,
        entity: &str,
        filters: &[FilterRequest],
        sort: Option<&SortRequest>,
        pagination: &PaginationRequest,
    ) -> Result<QueryDescriptor, QueryError> {
        self.build_query_at(entity, filters, sort, pagination, Utc::now())
    }

    /// Validate and build a query against an explicit clock
    pub fn build_query_at(
        &self,
        entity: &str,
        filters: &[FilterRequest],
        sort: Option<&SortRequest>,
        pagination: &PaginationRequest,
        now: DateTime<Utc>,
    ) -> Result<QueryDescriptor, QueryError> {
        self.assemble(entity, filters, sort, pagination, now)
            .inspect_err(|err| {
                tracing::warn!(
                    entity = %entity,
                    code = err.error_code(),
                    error = %err,
                    "query rejected"
                );
            })
    }

    fn assemble(
        &self,
        entity: &str,
        filters: &[FilterRequest],
        sort: Option<&SortRequest>,
        pagination: &PaginationRequest,
        now: DateTime<Utc>,
    ) -> Result<QueryDescriptor, QueryError> {
        let fields = self.registry.get_registry(entity)?;
        tracing::debug!(entity = %entity, filters = filters.len(), "resolved registry");

        let descriptors = validate_fields(fields, filters)?;
        let typed = validate_operators(filters, descriptors)?;
        let checked = validate_values(typed)?;
        tracing::debug!(entity = %entity, "filters validated");

        let pagination = pagination.resolve(&self.defaults);

        let predicates = checked
            .iter()
            .map(|f| predicate::build(f.descriptor, f.operator, f.value, f.field_type, now))
            .collect::<Result<Vec<_>, _>>()?;

        let sort = self.resolve_sort(fields, sort)?;

        tracing::debug!(
            entity = %entity,
            take = pagination.take,
            skip = pagination.skip,
            predicates = predicates.len(),
            "query built"
        );
        Ok(QueryDescriptor::new(pagination, sort, predicates))
    }

    fn resolve_sort(
        &self,
        fields: &EntityFields,
        sort: Option<&SortRequest>,
    ) -> Result<SortSpec, QueryError> {
        let Some(sort) = sort else {
            let default = &self.defaults.sort_field;
            return Ok(match fields.get(default) {
                Some(descriptor) => SortSpec::from_descriptor(descriptor, self.defaults.sort_direction),
                None => SortSpec::configured(default, self.defaults.sort_direction),
            });
        };

        match fields.get(&sort.field) {
            Some(descriptor) if descriptor.sortable || sort.field == self.defaults.sort_field => {
                Ok(SortSpec::from_descriptor(descriptor, sort.direction))
            }
            None if sort.field == self.defaults.sort_field => {
                Ok(SortSpec::configured(&sort.field, sort.direction))
            }
            _ => Err(QueryError::InvalidField {
                entity: fields.entity().to_string(),
                field: sort.field.clone(),
                reason: "field is not sortable".to_string(),
            }),
        }
    }

    /// Build a query and its pagination metadata
    ///
    /// The filtered count is only requested when there is something to filter.
    pub async fn build_query_with_meta<R>(
        &self,
        repository: &R,
        entity: &str,
        filters: &[FilterRequest],
        sort: Option<&SortRequest>,
        pagination: &PaginationRequest,
    ) -> LibraryResult<(QueryDescriptor, PaginationMeta)>
    where
        R: Repository + ?Sized,
    {
        let query = self.build_query(entity, filters, sort, pagination)?;

        let total = repository.count(entity).await?;
        let filtered = if query.predicates().is_empty() {
            total
        } else {
            repository
                .count_with_predicates(entity, query.predicates())
                .await?
        };

        let meta = PaginationMeta::new(&query, total, filtered, filters);
        Ok((query, meta))
    }

    /// Build a query and fetch the page it describes
    pub async fn find_page<R>(
        &self,
        repository: &R,
        entity: &str,
        filters: &[FilterRequest],
        sort: Option<&SortRequest>,
        pagination: &PaginationRequest,
    ) -> LibraryResult<Page>
    where
        R: Repository + ?Sized,
    {
        let (query, meta) = self
            .build_query_with_meta(repository, entity, filters, sort, pagination)
            .await?;
        let data = repository.fetch(entity, &query).await?;
        tracing::debug!(entity = %entity, returned = data.len(), "page fetched");
        Ok(Page { meta, data })
    }
}

fn parse_legal(operator: &str, field_type: FieldType) -> Option<Operator> {
    operator
        .parse::<Operator>()
        .ok()
        .filter(|op| op.is_legal_for(field_type))
}

fn validate_fields<'a>(
    fields: &'a EntityFields,
    filters: &[FilterRequest],
) -> Result<Vec<&'a FieldDescriptor>, QueryError> {
    filters
        .iter()
        .map(|filter| {
            fields.get(&filter.field).ok_or_else(|| QueryError::InvalidField {
                entity: fields.entity().to_string(),
                field: filter.field.clone(),
                reason: "field is not filterable".to_string(),
            })
        })
        .collect()
}

fn validate_operators<'a>(
    filters: &'a [FilterRequest],
    descriptors: Vec<&'a FieldDescriptor>,
) -> Result<Vec<CheckedFilter<'a>>, QueryError> {
    filters
        .iter()
        .zip(descriptors)
        .map(|(filter, descriptor)| {
            let field_type = effective_type(descriptor.field_type, &filter.value);
            let operator = parse_legal(&filter.operator, field_type).ok_or_else(|| {
                QueryError::InvalidOperator {
                    field: filter.field.clone(),
                    operator: filter.operator.clone(),
                    field_type: field_type.to_string(),
                }
            })?;
            Ok(CheckedFilter {
                descriptor,
                operator,
                field_type,
                value: &filter.value,
            })
        })
        .collect()
}

fn validate_values(filters: Vec<CheckedFilter<'_>>) -> Result<Vec<CheckedFilter<'_>>, QueryError> {
    for filter in &filters {
        if !validate(filter.value, filter.field_type, filter.operator) {
            return Err(QueryError::InvalidValue {
                field: filter.descriptor.field.clone(),
                operator: filter.operator.to_string(),
                value: filter.value.clone(),
            });
        }
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::SortDirection;
    use crate::entities::library_registry;
    use chrono::TimeZone;
    use serde_json::json;

    fn engine() -> QueryEngine {
        QueryEngine::new(Arc::new(library_registry().unwrap()))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn build(entity: &str, filters: &[FilterRequest]) -> Result<QueryDescriptor, QueryError> {
        engine().build_query_at(entity, filters, None, &PaginationRequest::default(), now())
    }

    #[test]
    fn test_resolve_filterable_fields() {
        let fields = engine().resolve_filterable_fields("authors").unwrap();
        assert_eq!(fields, vec!["id", "name", "createdAt", "updatedAt", "books"]);
        assert!(matches!(
            engine().resolve_filterable_fields("shelves"),
            Err(QueryError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_is_operator_valid_uses_effective_type() {
        let engine = engine();
        assert!(engine.is_operator_valid("books", "published", "AFTER", &json!("2024-01-01")));
        assert!(!engine.is_operator_valid("books", "published", "IS_LESS", &json!("2024-01-01")));
        assert!(engine.is_operator_valid("books", "published", "IS_LESS", &json!("7")));
        assert!(!engine.is_operator_valid("books", "title", "GT", &json!("x")));
        assert!(!engine.is_operator_valid("books", "colour", "EQUAL", &json!("x")));
        assert!(!engine.is_operator_valid("books", "title", "LIKE", &json!("x")));
    }

    #[test]
    fn test_is_value_valid() {
        let engine = engine();
        assert!(engine.is_value_valid("books", "id", &json!("12"), "EQUAL"));
        assert!(!engine.is_value_valid("books", "id", &json!("twelve"), "EQUAL"));
        assert!(!engine.is_value_valid("books", "published", &json!("1500"), "IS_LESS"));
        assert!(!engine.is_value_valid("shelves", "id", &json!(1), "EQUAL"));
    }

    #[test]
    fn test_field_errors_win_over_operator_errors() {
        let filters = vec![
            FilterRequest::new("title", "GT", json!(1)),
            FilterRequest::new("colour", "EQUAL", json!("red")),
        ];
        assert!(matches!(build("books", &filters), Err(QueryError::InvalidField { field, .. }) if field == "colour"));
    }

    #[test]
    fn test_operator_errors_win_over_value_errors() {
        let filters = vec![
            FilterRequest::new("id", "EQUAL", json!("not a number")),
            FilterRequest::new("title", "GT", json!("x")),
        ];
        assert!(matches!(build("books", &filters), Err(QueryError::InvalidOperator { operator, .. }) if operator == "GT"));
    }

    #[test]
    fn test_invalid_operator_reports_effective_type() {
        let filters = vec![FilterRequest::new("published", "EQUAL", json!(7))];
        let err = build("books", &filters).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidOperator {
                field: "published".to_string(),
                operator: "EQUAL".to_string(),
                field_type: "NOW_DATE_RANGE".to_string(),
            }
        );
    }

    #[test]
    fn test_no_filters_builds_unfiltered_query() {
        let query = build("books", &[]).unwrap();
        assert!(query.predicates().is_empty());
        assert_eq!(query.sort().to_json(), json!({ "createdAt": "desc" }));
    }

    #[test]
    fn test_sort_on_unsortable_field_is_rejected() {
        let sort = SortRequest::new("isbn", SortDirection::Asc);
        let err = engine()
            .build_query_at("books", &[], Some(&sort), &PaginationRequest::default(), now())
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidField { field, .. } if field == "isbn"));
    }

    #[test]
    fn test_sort_on_default_field_is_always_allowed() {
        let sort = SortRequest::new("createdAt", SortDirection::Asc);
        let query = engine()
            .build_query_at("books", &[], Some(&sort), &PaginationRequest::default(), now())
            .unwrap();
        assert_eq!(query.sort().to_json(), json!({ "createdAt": "asc" }));
    }

    #[test]
    fn test_relation_sort_is_nested() {
        let mut registry = FieldRegistry::new();
        registry
            .register(
                "books",
                vec![
                    FieldDescriptor::new("title", FieldType::String).sortable(),
                    FieldDescriptor::new("authors", FieldType::String)
                        .sortable()
                        .relation("authors", "name"),
                ],
            )
            .unwrap();
        let engine = QueryEngine::new(Arc::new(registry));

        let sort = SortRequest::new("authors", SortDirection::Desc);
        let query = engine
            .build_query_at("books", &[], Some(&sort), &PaginationRequest::default(), now())
            .unwrap();
        assert_eq!(query.sort().to_json(), json!({ "authors": { "name": "desc" } }));
    }

    #[test]
    fn test_custom_defaults() {
        let defaults = QueryDefaults {
            default_count: 10,
            sort_field: "id".to_string(),
            sort_direction: SortDirection::Asc,
            ..QueryDefaults::default()
        };
        let engine = QueryEngine::with_defaults(Arc::new(library_registry().unwrap()), defaults);
        let query = engine
            .build_query_at("books", &[], None, &PaginationRequest::default(), now())
            .unwrap();
        assert_eq!(query.take(), 10);
        assert_eq!(query.sort().to_json(), json!({ "id": "asc" }));
    }
}
