//! Built-in library entities
//!
//! Each entity module declares its filterable fields as plain data; adding
//! an entity means adding a module and one line to [`library_registry`].

pub mod authors;
pub mod books;
pub mod categories;
pub mod users;

use crate::core::error::ConfigError;
use crate::core::registry::FieldRegistry;

/// Registry holding every built-in library entity
pub fn library_registry() -> Result<FieldRegistry, ConfigError> {
    let mut registry = FieldRegistry::new();
    register_library(&mut registry)?;
    Ok(registry)
}

/// Register the built-in entities into an existing registry
pub fn register_library(registry: &mut FieldRegistry) -> Result<(), ConfigError> {
    registry.register(users::ENTITY, users::fields())?;
    registry.register(books::ENTITY, books::fields())?;
    registry.register(authors::ENTITY, authors::fields())?;
    registry.register(categories::ENTITY, categories::fields())?;
    Ok(())
}
