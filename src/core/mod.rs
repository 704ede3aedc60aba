//! Core module: field registries, validation and query building

pub mod engine;
pub mod error;
pub mod field;
pub mod operator;
pub mod predicate;
pub mod query;
pub mod registry;
pub mod store;
pub mod validation;

pub use engine::QueryEngine;
pub use error::{ConfigError, LibraryError, LibraryResult, QueryError};
pub use field::{FieldDescriptor, FieldPath, FieldType};
pub use operator::{Operator, operators_for};
pub use predicate::{Condition, Predicate, Quantifier};
pub use query::{
    FilterRequest, Page, Pagination, PaginationMeta, PaginationRequest, QueryDefaults,
    QueryDescriptor, SortDirection, SortRequest, SortSpec,
};
pub use registry::{EntityFields, FieldRegistry};
pub use store::Repository;
