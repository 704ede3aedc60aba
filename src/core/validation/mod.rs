//! Filter value validation and normalization
//!
//! Validation decides whether a raw value is acceptable for a field's
//! effective type; normalization turns an accepted value into what the store
//! compares against. Both are pure functions over `serde_json::Value`.

pub mod filters;
pub mod validators;

pub use filters::{canonical_timestamp, escape_wildcards, normalize, unescape_wildcards};
pub use validators::{effective_type, parse_date, validate};
