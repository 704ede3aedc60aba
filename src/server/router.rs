//! Route table

use super::handlers::{AppState, health_check, list_filters, list_records};
use axum::{Router, routing::get};

/// Build the list routes
///
/// - GET /health, /healthz - Health check
/// - GET /{entity} - One filtered, sorted page of records
/// - GET /{entity}/filters - Filterable fields and their operators
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/{entity}", get(list_records))
        .route("/{entity}/filters", get(list_filters))
        .with_state(state)
}
