//! Field types and filterable field descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of types a filterable field can declare
///
/// `DateRange` and `NowDateRange` are rarely declared directly: they are the
/// effective types a `Date`/`DateTime` field takes on when the supplied value
/// is a `[from, to]` pair or a relative day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Number,
    Integer,
    Decimal,
    String,
    Date,
    DateTime,
    DateRange,
    NowDateRange,
}

impl FieldType {
    /// Whether values of this type are numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Number | FieldType::Integer | FieldType::Decimal
        )
    }

    /// Whether values of this type are calendar dates or timestamps
    pub fn is_date(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::DateTime)
    }

    /// Wire name, as used in requests and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Number => "NUMBER",
            FieldType::Integer => "INTEGER",
            FieldType::Decimal => "DECIMAL",
            FieldType::String => "STRING",
            FieldType::Date => "DATE",
            FieldType::DateTime => "DATETIME",
            FieldType::DateRange => "DATE_RANGE",
            FieldType::NowDateRange => "NOW_DATE_RANGE",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filterable (and possibly sortable) field of an entity
///
/// A descriptor carrying `relation_collection_name` is a proxy: filtering on it
/// compares `relation_field` on the records of that collection, optionally
/// through a nested single record (`relation_record_name`).
///
/// # Example
/// ```rust
/// use libris::core::field::{FieldDescriptor, FieldType};
///
/// let loans = FieldDescriptor::new("loans", FieldType::String)
///     .relation("loans", "title")
///     .through("Book");
/// assert!(loans.is_relation());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub field: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub sortable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_collection_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_record_name: Option<String>,
}

impl FieldDescriptor {
    pub fn new(field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            field_type,
            sortable: false,
            relation_field: None,
            relation_collection_name: None,
            relation_record_name: None,
        }
    }

    /// Allow sorting on this field
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Make this descriptor a proxy for `relation_field` on the records of `collection`
    pub fn relation(mut self, collection: impl Into<String>, relation_field: impl Into<String>) -> Self {
        self.relation_collection_name = Some(collection.into());
        self.relation_field = Some(relation_field.into());
        self
    }

    /// Reach the compared field through a nested single record of the collection
    pub fn through(mut self, record_name: impl Into<String>) -> Self {
        self.relation_record_name = Some(record_name.into());
        self
    }

    pub fn is_relation(&self) -> bool {
        self.relation_collection_name.is_some()
    }

    /// Name of the column actually compared in the store
    pub fn compared_field(&self) -> &str {
        self.relation_field.as_deref().unwrap_or(&self.field)
    }

    /// Key path of the compared column, only obtainable from a registered descriptor
    pub fn path(&self) -> FieldPath {
        FieldPath(self.compared_field().to_string())
    }
}

/// A store column name that came out of a field registry
///
/// There is no public constructor: predicates and sort specs can only be keyed
/// by names the registry declared, never by raw request input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// A column named by trusted configuration rather than a descriptor
    pub(crate) fn configured(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
