//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::types::{BatchRequest, BatchResponse, ExplainRequest, ItemOutcome};

/// POST /askGemini: explain a single value.
pub async fn ask_gemini(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ItemOutcome>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let outcome = state.relay.explain(request).await?;
    Ok(Json(outcome))
}

/// POST /generateAll: explain a batch sequentially with model rotation.
pub async fn generate_all(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let all_responses = state.relay.explain_batch(request).await?;
    Ok(Json(BatchResponse { all_responses }))
}

/// GET /health: liveness plus cache counters.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let cache = state.relay.cache();
    let stats = cache.stats();
    // Entry count is best effort; the relay is still alive if the listing fails.
    let entries = cache.len().await.ok();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "cache": {
            "backend": cache.backend_name(),
            "entries": entries,
            "hits": stats.hits,
            "misses": stats.misses,
            "writes": stats.writes,
            "errors": stats.errors,
            "hitRatio": stats.hit_ratio(),
        },
    }))
}
