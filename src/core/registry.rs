//! Per-entity field registries
//!
//! A registry is static data: built once at startup, then shared read-only
//! across requests behind an `Arc`. Every definition defect (duplicate names,
//! broken relation descriptors) is reported here, before any request is served.

use crate::core::error::{ConfigError, QueryError};
use crate::core::field::FieldDescriptor;
use indexmap::IndexMap;

/// The filterable fields of one entity, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct EntityFields {
    entity: String,
    fields: IndexMap<String, FieldDescriptor>,
}

impl EntityFields {
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, field: &str) -> Option<&FieldDescriptor> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Field names in declaration order
    pub fn names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Registry of filterable entities
///
/// # Example
/// ```rust
/// use libris::core::field::{FieldDescriptor, FieldType};
/// use libris::core::registry::FieldRegistry;
///
/// let mut registry = FieldRegistry::new();
/// registry
///     .register("shelves", vec![FieldDescriptor::new("label", FieldType::String)])
///     .unwrap();
/// assert_eq!(registry.get_registry("shelves").unwrap().names(), vec!["label"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    entities: IndexMap<String, EntityFields>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self {
            entities: IndexMap::new(),
        }
    }

    /// Register the fields of an entity
    pub fn register(
        &mut self,
        entity: impl Into<String>,
        descriptors: Vec<FieldDescriptor>,
    ) -> Result<(), ConfigError> {
        let entity = entity.into();
        if self.entities.contains_key(&entity) {
            return Err(ConfigError::DuplicateEntity { entity });
        }
        if descriptors.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("entities.{entity}"),
                value: "[]".to_string(),
                message: "an entity needs at least one filterable field".to_string(),
            });
        }

        let mut fields = IndexMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            check_descriptor(&entity, &descriptor)?;
            if fields.contains_key(&descriptor.field) {
                return Err(ConfigError::DuplicateField {
                    entity,
                    field: descriptor.field,
                });
            }
            fields.insert(descriptor.field.clone(), descriptor);
        }

        tracing::debug!(entity = %entity, fields = fields.len(), "registered filterable entity");
        self.entities
            .insert(entity.clone(), EntityFields { entity, fields });
        Ok(())
    }

    /// Resolve the registry of an entity
    pub fn get_registry(&self, entity: &str) -> Result<&EntityFields, QueryError> {
        self.entities
            .get(entity)
            .ok_or_else(|| QueryError::UnknownEntity {
                entity: entity.to_string(),
            })
    }

    /// Registered entity names, in registration order
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(|s| s.as_str()).collect()
    }
}

fn check_descriptor(entity: &str, descriptor: &FieldDescriptor) -> Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidDescriptor {
        entity: entity.to_string(),
        field: descriptor.field.clone(),
        message: message.to_string(),
    };

    if descriptor.field.trim().is_empty() {
        return Err(invalid("field name must not be empty"));
    }
    if descriptor.relation_collection_name.is_none() {
        if descriptor.relation_field.is_some() {
            return Err(invalid("relationField requires relationCollectionName"));
        }
        if descriptor.relation_record_name.is_some() {
            return Err(invalid("relationRecordName requires relationCollectionName"));
        }
    }
    Ok(())
}
