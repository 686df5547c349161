mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SyncConfig;
use crate::coordinator::Coordinator;
use crate::db::Database;

/// Shared state for the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub coordinator: Arc<Coordinator>,
    pub config: SyncConfig,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/manifest",
            post(handlers::post_manifest).get(handlers::get_manifest),
        )
        .route(
            "/ingest",
            post(handlers::post_ingest).get(handlers::get_ingest),
        )
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
