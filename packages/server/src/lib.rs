//! OrgChart HTTP server
//!
//! This crate exposes `HierarchyService` as a JSON REST API. It owns
//! everything the core deliberately leaves out: routing, input-shape
//! validation, configuration, and wiring a store to the service.
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (port 3001, default DB path)
//! cargo run --bin orgchart-server
//!
//! # Throwaway in-memory organization on another port
//! ORGCHART_STORE=memory ORGCHART_PORT=3002 cargo run --bin orgchart-server
//! ```

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use orgchart_core::db::{DatabaseService, InMemoryStore, NodeStore, TursoStore};
use orgchart_core::services::HierarchyService;

pub mod config;
mod http_error;
mod org_endpoints;

pub use config::{ConfigError, ServerConfig, StoreKind};
pub use http_error::HttpError;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub service: HierarchyService,
}

impl AppState {
    pub fn new(service: HierarchyService) -> Self {
        Self { service }
    }
}

/// Create the application router with request tracing
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(org_endpoints::routes(state))
        .layer(TraceLayer::new_for_http())
}

/// A configured node store, plus the database handle when it is file-backed
pub struct OpenedStore {
    pub store: Arc<dyn NodeStore>,
    pub db: Option<Arc<DatabaseService>>,
}

/// Open the store selected by `config`
pub async fn open_store(config: &ServerConfig) -> anyhow::Result<OpenedStore> {
    match config.store {
        StoreKind::Sqlite => {
            let db = Arc::new(DatabaseService::new(config.db_path.clone()).await?);
            tracing::info!("Database: {}", config.db_path.display());
            Ok(OpenedStore {
                store: Arc::new(TursoStore::new(db.clone())),
                db: Some(db),
            })
        }
        StoreKind::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            Ok(OpenedStore {
                store: Arc::new(InMemoryStore::new()),
                db: None,
            })
        }
    }
}

/// Start the HTTP server and run until Ctrl-C
///
/// # Errors
///
/// Returns error if the store cannot be opened or the server fails to bind.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let opened = open_store(&config).await?;
    let service = HierarchyService::with_policy(opened.store, config.policy.clone());
    let app = create_router(AppState::new(service));

    let addr = format!("127.0.0.1:{}", config.port);
    tracing::info!("HTTP server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = opened.db {
        db.db_close().await?;
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
