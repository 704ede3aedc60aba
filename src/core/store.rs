//! Repository collaborator consumed by the query engine

use crate::core::predicate::Predicate;
use crate::core::query::QueryDescriptor;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Data access the engine delegates to
///
/// Implementations translate predicates and descriptors into their own store
/// calls. Errors are returned as-is; the engine never retries or rewrites them.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Total number of records of an entity
    async fn count(&self, entity: &str) -> Result<u64>;

    /// Number of records matching every predicate
    async fn count_with_predicates(&self, entity: &str, predicates: &[Predicate]) -> Result<u64>;

    /// One ordered page of matching records
    async fn fetch(&self, entity: &str, query: &QueryDescriptor) -> Result<Vec<Value>>;
}
