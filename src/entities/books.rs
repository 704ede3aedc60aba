//! Filterable fields of the book catalog

use crate::core::field::{FieldDescriptor, FieldType};

pub const ENTITY: &str = "books";

pub fn fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("id", FieldType::Number).sortable(),
        FieldDescriptor::new("title", FieldType::String).sortable(),
        FieldDescriptor::new("isbn", FieldType::String),
        FieldDescriptor::new("published", FieldType::DateTime).sortable(),
        FieldDescriptor::new("createdAt", FieldType::DateTime).sortable(),
        FieldDescriptor::new("authors", FieldType::String).relation("authors", "name"),
        FieldDescriptor::new("categories", FieldType::String).relation("categories", "name"),
    ]
}
