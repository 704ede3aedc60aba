//! Filterable fields of library members

use crate::core::field::{FieldDescriptor, FieldType};

pub const ENTITY: &str = "users";

/// `loans` filters on the title of the book behind each loan
pub fn fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("id", FieldType::Number).sortable(),
        FieldDescriptor::new("name", FieldType::String).sortable(),
        FieldDescriptor::new("email", FieldType::String).sortable(),
        FieldDescriptor::new("createdAt", FieldType::Date).sortable(),
        FieldDescriptor::new("loans", FieldType::String)
            .relation("loans", "title")
            .through("Book"),
    ]
}
