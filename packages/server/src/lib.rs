//! AlignViz HTTP server
//!
//! Serves the alignment hierarchy built by `alignviz-core` as JSON for the
//! force-directed frontend.
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/graph` - Full graph `{nodes, links}`
//! - `GET /api/details/:id` - Raw record for one node
//! - `GET /api/details/:id/html` - Rendered details panel
//! - `GET /api/hierarchy-path/:id` - Root-first `{path: [{id, name, type}]}`
//!
//! Data is re-read from the [`HierarchySource`] on every request, so edits to
//! the data directory are visible without a restart.

use alignviz_core::HierarchySource;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod config;
mod graph_endpoints;
mod http_error;

pub use config::ServerConfig;
pub use http_error::HttpError;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn HierarchySource>,
}

impl AppState {
    pub fn new(source: impl HierarchySource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }
}

/// API routes with CORS and request tracing
pub fn create_router(state: AppState, cors_origin: Option<&str>) -> Router {
    Router::new()
        .merge(graph_endpoints::routes(state))
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
}

/// API routes plus static frontend assets when `config.static_dir` is set
pub fn create_app(state: AppState, config: &ServerConfig) -> Router {
    let router = create_router(state, config.cors_origin.as_deref());
    match &config.static_dir {
        Some(dir) => {
            tracing::info!("Serving static files from {}", dir.display());
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    }
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    match origin.map(str::parse::<HeaderValue>) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(e)) => {
            tracing::warn!("Invalid CORS_ALLOW_ORIGIN ({}), allowing any origin", e);
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

/// Bind and serve until the process is stopped
pub async fn start_server(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let app = create_app(state, config);
    let addr = config.bind_addr();

    tracing::info!("AlignViz server starting on http://{}", addr);
    tracing::info!("Data directory: {}", config.data_dir.display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
