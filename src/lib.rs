//! # libris
//!
//! A library management API built around a metadata-driven query engine.
//!
//! Each entity declares its filterable fields once, as data. Requests then
//! name fields, operators and values as loose JSON; the engine checks every
//! filter against the declared field types and turns the whole request into a
//! store-ready query (predicates, ordering, page window) or rejects it.
//!
//! ## Features
//!
//! - **Field registries**: per-entity filterable/sortable fields, including
//!   proxies for fields of related collections
//! - **Typed operators**: a fixed operator catalog per field type
//! - **Effective types**: a date field filtered by `7` means "last 7 days",
//!   by `[from, to]` a date range
//! - **All-or-nothing validation**: one bad filter rejects the request
//! - **Pagination metadata**: totals, page counts, next/previous flags
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use libris::prelude::*;
//!
//! let repository = InMemoryRepository::new();
//! repository.insert("books", json!({"id": 1, "title": "Dune"}))?;
//!
//! ServerBuilder::new()
//!     .with_repository(repository)
//!     .serve("127.0.0.1:3000")
//!     .await?;
//!
//! // GET /books?filter=[{"field":"title","operator":"CONTAINS","value":"Dune"}]&count=10
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod logging;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        ConfigError, FieldDescriptor, FieldRegistry, FieldType, FilterRequest, LibraryError,
        LibraryResult, Operator, Page, PaginationMeta, PaginationRequest, Predicate, QueryDefaults,
        QueryDescriptor, QueryEngine, QueryError, Repository, SortDirection, SortRequest,
    };

    // === Entities ===
    pub use crate::entities::library_registry;

    // === Storage ===
    pub use crate::storage::InMemoryRepository;

    // === Config ===
    pub use crate::config::{LibrisConfig, LogFormat, LoggingConfig};
    pub use crate::logging::init_logging;

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
}
