use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use super::AppState;
use crate::coordinator::SaveOutcome;
use crate::manifest::Manifest;
use crate::sync;

/// Header carrying the caller-supplied fingerprint of the manifest body.
const CONTENT_HASH_HEADER: &str = "content-hash";

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Manifest
// ============================================================

/// Accept a manifest upload.
///
/// The body is fully parsed before anything is written — a partial manifest
/// is never persisted. Re-uploading the currently stored hash is a no-op
/// reported as success.
pub async fn post_manifest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, String)> {
    tracing::info!("POST /manifest");

    let content_hash = headers
        .get(CONTENT_HASH_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or((
            StatusCode::BAD_REQUEST,
            "Content-Hash header is required".to_string(),
        ))?;

    let manifest = Manifest::from_json(&body).map_err(|e| {
        tracing::warn!("Rejected manifest upload: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    match state.coordinator.save_manifest(&manifest, content_hash) {
        Ok(SaveOutcome::AlreadyCurrent) => Ok((
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "manifest already saved",
                "hash": content_hash,
            })),
        )),
        Ok(SaveOutcome::Saved) => {
            tracing::info!("Manifest saved with hash {}", content_hash);
            Ok((
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "status": "manifest saved",
                    "hash": content_hash,
                })),
            ))
        }
        Err(e) => {
            tracing::error!("Error saving manifest: {:#}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error saving manifest".to_string(),
            ))
        }
    }
}

/// Return the currently persisted manifest.
pub async fn get_manifest(
    State(state): State<AppState>,
) -> Result<Json<Manifest>, (StatusCode, String)> {
    tracing::info!("GET /manifest");

    state.coordinator.load_manifest().map(Json).map_err(|e| {
        tracing::error!("Error loading manifest: {:#}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error loading manifest".to_string(),
        )
    })
}

// ============================================================
// Ingest
// ============================================================

/// Trigger a reconciliation run.
///
/// Rejected with 425 while another run holds the lock; the lock guard is
/// released on every exit path below, including failures.
pub async fn post_ingest(
    State(state): State<AppState>,
) -> Result<Json<sync::SyncReport>, (StatusCode, Json<serde_json::Value>)> {
    tracing::info!("POST /ingest");

    let guard = state.coordinator.try_lock().map_err(|e| {
        tracing::error!("Error acquiring ingest lock: {:#}", e);
        internal_status("Error acquiring ingest lock")
    })?;
    let Some(_guard) = guard else {
        return Err((
            StatusCode::TOO_EARLY,
            Json(serde_json::json!({ "status": "ingest is locked" })),
        ));
    };

    let manifest = state.coordinator.load_manifest().map_err(|e| {
        tracing::error!("Error loading manifest: {:#}", e);
        internal_status("Error loading manifest")
    })?;

    match sync::run_ingest(&state.db, &state.config, &manifest) {
        Ok(report) => {
            tracing::info!("Ingest completed successfully");
            Ok(Json(report))
        }
        Err(e) => {
            tracing::error!("Ingest failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "ingest failed",
                    "pass": e.pass,
                    "entity": e.entity,
                    "error": e.source.to_string(),
                })),
            ))
        }
    }
}

/// Report lock status without side effects.
pub async fn get_ingest(State(state): State<AppState>) -> impl IntoResponse {
    if state.coordinator.is_locked() {
        (
            StatusCode::TOO_EARLY,
            Json(serde_json::json!({ "status": "ingest is locked" })),
        )
    } else {
        (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ingest is not locked" })),
        )
    }
}

fn internal_status(msg: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "status": msg })),
    )
}
