//! ServerBuilder for fluent API to build HTTP servers

use super::handlers::AppState;
use super::router::build_routes;
use crate::config::LibrisConfig;
use crate::core::query::QueryDefaults;
use crate::core::registry::FieldRegistry;
use crate::core::{QueryEngine, Repository};
use crate::entities::library_registry;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builder for the libris HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_repository(InMemoryRepository::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    registry: Option<FieldRegistry>,
    repository: Option<Arc<dyn Repository>>,
    defaults: QueryDefaults,
    custom_routes: Vec<Router>,
    cors: bool,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            repository: None,
            defaults: QueryDefaults::default(),
            custom_routes: Vec::new(),
            cors: false,
        }
    }

    /// Take the registry and query defaults from a loaded configuration
    pub fn with_config(mut self, config: &LibrisConfig) -> Result<Self> {
        self.registry = Some(config.build_registry()?);
        self.defaults = config.query_defaults();
        Ok(self)
    }

    /// Use a custom field registry instead of the built-in library one
    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the repository (required)
    pub fn with_repository(mut self, repository: impl Repository + 'static) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    pub fn with_defaults(mut self, defaults: QueryDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Add routes that live next to the list routes
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Allow cross-origin requests from any origin
    pub fn with_permissive_cors(mut self) -> Self {
        self.cors = true;
        self
    }

    /// Build the shared handler state
    pub fn build_state(&mut self) -> Result<AppState> {
        let repository = self
            .repository
            .take()
            .ok_or_else(|| anyhow::anyhow!("Repository is required. Call .with_repository()"))?;

        let registry = match self.registry.take() {
            Some(registry) => registry,
            None => library_registry()?,
        };

        tracing::debug!(entities = ?registry.entity_names(), "field registry ready");

        let engine = QueryEngine::with_defaults(Arc::new(registry), self.defaults.clone());
        Ok(AppState {
            engine: Arc::new(engine),
            repository,
        })
    }

    /// Build the final router
    pub fn build(mut self) -> Result<Router> {
        let state = self.build_state()?;

        let mut app = Router::new();
        for custom_router in std::mem::take(&mut self.custom_routes) {
            app = app.merge(custom_router);
        }
        app = app.merge(build_routes(state));

        if self.cors {
            app = app.layer(CorsLayer::permissive());
        }
        Ok(app.layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::{FieldDescriptor, FieldType};
    use crate::storage::InMemoryRepository;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ServerBuilder::new();
        assert!(builder.registry.is_none());
        assert!(builder.repository.is_none());
        assert!(builder.custom_routes.is_empty());
        assert!(!builder.cors);
    }

    #[test]
    fn test_build_without_repository_fails() {
        let err = ServerBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("Repository is required"));
    }

    #[test]
    fn test_build_state_defaults_to_library_registry() {
        let mut builder = ServerBuilder::new().with_repository(InMemoryRepository::new());
        let state = builder.build_state().unwrap();
        assert!(state.engine.registry().get_registry("books").is_ok());
    }

    #[test]
    fn test_custom_registry_replaces_library() {
        let mut registry = FieldRegistry::new();
        registry
            .register("shelves", vec![FieldDescriptor::new("label", FieldType::String)])
            .unwrap();

        let mut builder = ServerBuilder::new()
            .with_registry(registry)
            .with_repository(InMemoryRepository::new());
        let state = builder.build_state().unwrap();
        assert!(state.engine.registry().get_registry("books").is_err());
        assert!(state.engine.registry().get_registry("shelves").is_ok());
    }

    #[test]
    fn test_with_config_applies_defaults() {
        let config = LibrisConfig::from_yaml_str("pagination:\n  default_count: 7\n").unwrap();
        let mut builder = ServerBuilder::new()
            .with_config(&config)
            .unwrap()
            .with_repository(InMemoryRepository::new());
        let state = builder.build_state().unwrap();
        assert_eq!(state.engine.defaults().default_count, 7);
    }

    #[test]
    fn test_build_with_custom_routes() {
        use axum::routing::get;

        let custom = Router::new().route("/version", get(|| async { "1" }));
        let router = ServerBuilder::new()
            .with_repository(InMemoryRepository::new())
            .with_custom_routes(custom)
            .with_permissive_cors()
            .build();
        assert!(router.is_ok());
    }
}
