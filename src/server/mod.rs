//! HTTP exposure of the query engine
//!
//! A thin read-only surface: every entity in the field registry gets a list
//! route and a route describing its filters.

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::{AppState, ListParams};
