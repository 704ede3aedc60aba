//! Configuration loading and management
//!
//! Every section is optional in YAML; a missing section takes its defaults.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 3000
//! pagination:
//!   default_count: 25
//!   max_count: 100
//! sort:
//!   field: createdAt
//!   direction: desc
//! logging:
//!   filter: info,libris=debug
//!   format: json
//! entities:
//!   shelves:
//!     - field: label
//!       type: STRING
//!       sortable: true
//! ```

use crate::core::error::ConfigError;
use crate::core::field::FieldDescriptor;
use crate::core::query::{QueryDefaults, SortDirection};
use crate::core::registry::FieldRegistry;
use crate::entities;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Complete libris configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrisConfig {
    pub server: ServerConfig,
    pub pagination: PaginationConfig,
    pub sort: SortConfig,
    pub logging: LoggingConfig,

    /// Extra filterable entities, registered after the built-in ones
    pub entities: IndexMap<String, Vec<FieldDescriptor>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_count: u64,
    pub default_page: u64,
    /// Larger requested page sizes fall back to `default_count`
    pub max_count: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_count: 25,
            default_page: 1,
            max_count: 100,
        }
    }
}

/// Ordering applied when a request does not name one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    pub field: String,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            field: "createdAt".to_string(),
            direction: SortDirection::Desc,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, for development
    #[default]
    Pretty,
    Compact,
    /// One JSON object per line, for production
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,libris=debug".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LibrisConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content).map_err(|err| match err {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError {
                file: Some(path.display().to_string()),
                message,
            },
            other => other,
        })
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pagination = &self.pagination;
        if pagination.default_count == 0 {
            return Err(invalid("pagination.default_count", 0, "must be positive"));
        }
        if pagination.default_page == 0 {
            return Err(invalid("pagination.default_page", 0, "must be positive"));
        }
        if pagination.max_count < pagination.default_count {
            return Err(invalid(
                "pagination.max_count",
                pagination.max_count,
                "must not be smaller than pagination.default_count",
            ));
        }
        if self.sort.field.trim().is_empty() {
            return Err(invalid("sort.field", "", "must not be empty"));
        }
        Ok(())
    }

    /// Built-in library entities plus those declared in `entities`
    pub fn build_registry(&self) -> Result<FieldRegistry, ConfigError> {
        let mut registry = entities::library_registry()?;
        for (entity, fields) in &self.entities {
            registry.register(entity.clone(), fields.clone())?;
        }
        Ok(registry)
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults {
            default_count: self.pagination.default_count,
            default_page: self.pagination.default_page,
            max_count: self.pagination.max_count,
            sort_field: self.sort.field.clone(),
            sort_direction: self.sort.direction,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|_| invalid("server.host", &addr, "not a socket address"))
    }
}

fn invalid(field: &str, value: impl ToString, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}
