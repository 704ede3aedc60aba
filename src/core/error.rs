//! Typed error handling for libris
//!
//! Request validation failures are terminal client errors; nothing here is
//! retried. Store failures travel through untouched and are reported as a
//! generic server error.
//!
//! # Error Categories
//!
//! - [`QueryError`]: a filter, sort or entity name the engine refused
//! - [`ConfigError`]: a defective registry or configuration file, fatal at startup
//! - [`LibraryError`]: the top-level type handlers return
//!
//! # Example
//!
//! ```rust,ignore
//! match engine.build_query("books", &filters, None, &pagination) {
//!     Ok(query) => repository.fetch("books", &query).await?,
//!     Err(QueryError::InvalidOperator { field, operator, .. }) => {
//!         println!("{operator} cannot be used on {field}");
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// The main error type for libris
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The engine rejected the request
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Malformed request parameters, before the engine saw them
    #[error("Invalid request parameter '{parameter}': {message}")]
    BadRequest { parameter: String, message: String },

    /// Registry or configuration defect
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failure reported by the repository collaborator
    #[error("Storage failure: {0}")]
    Storage(#[source] anyhow::Error),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl LibraryError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            LibraryError::Query(e) => e.status_code(),
            LibraryError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            LibraryError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LibraryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LibraryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            LibraryError::Query(e) => e.error_code(),
            LibraryError::BadRequest { .. } => "BAD_REQUEST",
            LibraryError::Config(_) => "CONFIG_ERROR",
            LibraryError::Storage(_) => "STORAGE_ERROR",
            LibraryError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    ///
    /// Server-side failures carry a generic message; their cause is logged
    /// instead of echoed to the client.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            LibraryError::Storage(_) | LibraryError::Config(_) | LibraryError::Internal(_) => {
                "The request could not be completed".to_string()
            }
            _ => self.to_string(),
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details: self.details(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            LibraryError::Query(e) => Some(e.details()),
            LibraryError::BadRequest { parameter, .. } => {
                Some(serde_json::json!({ "parameter": parameter }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for LibraryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = ?self, "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Query Errors
// =============================================================================

/// Reasons the engine refuses a filter/sort/pagination request
///
/// Validation is all-or-nothing: the first failing stage aborts the request
/// and no partial query is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The entity has no field registry
    #[error("Unknown entity: {entity}")]
    UnknownEntity { entity: String },

    /// A filter or sort names a field the registry does not expose
    #[error("Invalid field '{field}' for {entity}: {reason}")]
    InvalidField {
        entity: String,
        field: String,
        reason: String,
    },

    /// The operator is not legal for the field's effective type
    #[error("Invalid operator '{operator}' for field '{field}' of type {field_type}")]
    InvalidOperator {
        field: String,
        operator: String,
        field_type: String,
    },

    /// The value is malformed for the field's effective type
    #[error("Invalid value {value} for field '{field}' with operator '{operator}'")]
    InvalidValue {
        field: String,
        operator: String,
        value: Value,
    },
}

impl QueryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            QueryError::UnknownEntity { .. } => StatusCode::NOT_FOUND,
            QueryError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            QueryError::InvalidOperator { .. } => StatusCode::BAD_REQUEST,
            QueryError::InvalidValue { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::UnknownEntity { .. } => "UNKNOWN_ENTITY",
            QueryError::InvalidField { .. } => "INVALID_FIELD",
            QueryError::InvalidOperator { .. } => "INVALID_OPERATOR",
            QueryError::InvalidValue { .. } => "INVALID_VALUE",
        }
    }

    fn details(&self) -> Value {
        match self {
            QueryError::UnknownEntity { entity } => serde_json::json!({ "entity": entity }),
            QueryError::InvalidField { entity, field, .. } => {
                serde_json::json!({ "entity": entity, "field": field })
            }
            QueryError::InvalidOperator {
                field,
                operator,
                field_type,
            } => serde_json::json!({
                "field": field,
                "operator": operator,
                "type": field_type
            }),
            QueryError::InvalidValue {
                field,
                operator,
                value,
            } => serde_json::json!({
                "field": field,
                "operator": operator,
                "value": value
            }),
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration and registry definitions
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("Invalid value '{value}' for '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// An entity was registered twice
    #[error("Entity '{entity}' is already registered")]
    DuplicateEntity { entity: String },

    /// Two descriptors of one entity share a field name
    #[error("Field '{field}' is declared more than once for entity '{entity}'")]
    DuplicateField { entity: String, field: String },

    /// A descriptor breaks the relation invariants
    #[error("Field '{field}' of entity '{entity}': {message}")]
    InvalidDescriptor {
        entity: String,
        field: String,
        message: String,
    },

    /// IO error while reading configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" file '{f}'"))
        .unwrap_or_default()
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

/// Convert from anyhow::Error: anything reaching this point came from the store
impl From<anyhow::Error> for LibraryError {
    fn from(err: anyhow::Error) -> Self {
        LibraryError::Storage(err)
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for libris operations
pub type LibraryResult<T> = Result<T, LibraryError>;
