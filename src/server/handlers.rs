//! HTTP handlers for listing entities
//!
//! Handlers are entity-agnostic: the entity comes from the path and is
//! resolved against the field registry by the engine.

use crate::core::error::{LibraryError, LibraryResult};
use crate::core::field::FieldType;
use crate::core::operator::{Operator, operators_for};
use crate::core::query::{FilterRequest, Page, PaginationRequest, SortRequest};
use crate::core::{QueryEngine, Repository};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
    pub repository: Arc<dyn Repository>,
}

/// Query string of a list request
///
/// `filter` is a JSON array of `{field, operator, value}` and `order` a JSON
/// object `{field, direction}`; `count` and `page` are forwarded untyped so
/// bad values fall back to defaults instead of failing extraction.
///
/// ```text
/// GET /books?filter=[{"field":"title","operator":"CONTAINS","value":"Dune"}]&order={"field":"published","value":"asc"}&count=5&page=2
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub filter: Option<String>,
    pub order: Option<String>,
    pub count: Option<String>,
    pub page: Option<String>,
}

impl ListParams {
    pub fn filters(&self) -> LibraryResult<Vec<FilterRequest>> {
        match self.filter.as_deref().map(str::trim) {
            None | Some("") => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(raw).map_err(|e| bad_request("filter", e)),
        }
    }

    pub fn sort(&self) -> LibraryResult<Option<SortRequest>> {
        match self.order.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| bad_request("order", e)),
        }
    }

    pub fn pagination(&self) -> PaginationRequest {
        PaginationRequest {
            count: self.count.clone().map(Value::String),
            page: self.page.clone().map(Value::String),
        }
    }
}

fn bad_request(parameter: &str, err: serde_json::Error) -> LibraryError {
    LibraryError::BadRequest {
        parameter: parameter.to_string(),
        message: err.to_string(),
    }
}

/// List one page of an entity
///
/// GET /{entity}
pub async fn list_records(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<ListParams>,
) -> LibraryResult<Json<Page>> {
    let filters = params.filters()?;
    let sort = params.sort()?;

    let page = state
        .engine
        .find_page(
            state.repository.as_ref(),
            &entity,
            &filters,
            sort.as_ref(),
            &params.pagination(),
        )
        .await?;

    Ok(Json(page))
}

/// A filterable field as advertised to clients
#[derive(Debug, Serialize)]
pub struct FilterableField {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub sortable: bool,
    pub operators: Vec<Operator>,
}

/// Describe the filterable fields of an entity
///
/// GET /{entity}/filters
pub async fn list_filters(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> LibraryResult<Json<Value>> {
    let fields = state.engine.registry().get_registry(&entity)?;

    let fields: Vec<FilterableField> = fields
        .iter()
        .map(|descriptor| FilterableField {
            field: descriptor.field.clone(),
            field_type: descriptor.field_type,
            sortable: descriptor.sortable,
            operators: available_operators(descriptor.field_type),
        })
        .collect();

    Ok(Json(json!({
        "entity": entity,
        "fields": fields,
    })))
}

/// Operators a declared type can end up accepting
///
/// Date fields also reach the range catalogs, depending on the value sent.
fn available_operators(field_type: FieldType) -> Vec<Operator> {
    let mut operators = operators_for(field_type).to_vec();
    if field_type.is_date() {
        operators.extend_from_slice(operators_for(FieldType::DateRange));
        operators.extend_from_slice(operators_for(FieldType::NowDateRange));
    }
    operators
}

/// Health check endpoint handler
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "libris"
    }))
}
