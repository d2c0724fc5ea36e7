//! Graph, details and hierarchy path endpoints

use alignviz_core::render::render_node_details;
use alignviz_core::{build_graph, HierarchySnapshot, PathEntry};
use axum::{
    extract::{Path, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::{AppState, HttpError};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct HierarchyPath {
    pub path: Vec<PathEntry>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/graph", get(get_graph))
        .route("/api/details/:id", get(get_details))
        .route("/api/details/:id/html", get(get_details_html))
        .route("/api/hierarchy-path/:id", get(get_hierarchy_path))
        .with_state(state)
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn load_snapshot(state: &AppState) -> Result<HierarchySnapshot, HttpError> {
    Ok(state.source.snapshot().await?)
}

async fn get_graph(State(state): State<AppState>) -> Result<Json<Value>, HttpError> {
    let snapshot = load_snapshot(&state).await?;
    let graph = build_graph(&snapshot);
    tracing::info!(
        "Returning graph with {} nodes and {} links",
        graph.nodes.len(),
        graph.links.len()
    );
    Ok(Json(graph.to_value()))
}

async fn find_details(state: &AppState, node_id: &str) -> Result<Value, HttpError> {
    tracing::info!("Getting details for node: {}", node_id);
    let snapshot = load_snapshot(state).await?;
    snapshot.find_details(node_id).ok_or_else(|| {
        tracing::warn!("Node not found: {}", node_id);
        HttpError::node_not_found(node_id)
    })
}

async fn get_details(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    find_details(&state, &node_id).await.map(Json)
}

async fn get_details_html(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Html<String>, HttpError> {
    let details = find_details(&state, &node_id).await?;
    Ok(Html(render_node_details(&details)))
}

async fn get_hierarchy_path(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<HierarchyPath>, HttpError> {
    let snapshot = load_snapshot(&state).await?;
    build_graph(&snapshot)
        .hierarchy_path(&node_id)
        .map(|path| Json(HierarchyPath { path }))
        .ok_or_else(|| HttpError::node_not_found(&node_id))
}
