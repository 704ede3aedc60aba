use crate::core::field::{FieldDescriptor, FieldType};

pub const ENTITY: &str = "authors";

pub fn fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("id", FieldType::Number).sortable(),
        FieldDescriptor::new("name", FieldType::String).sortable(),
        FieldDescriptor::new("createdAt", FieldType::Date).sortable(),
        FieldDescriptor::new("updatedAt", FieldType::Date).sortable(),
        FieldDescriptor::new("books", FieldType::String).relation("books", "title"),
    ]
}
