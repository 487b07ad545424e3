//! Error log handlers
//!
//! The log is exposed read-only plus a retry trigger and an explicit clear;
//! entries are ordered most-recent-last.

use crate::error::ApiResult;
use crate::models::ErrorEntry;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// GET /errors response
#[derive(Debug, Serialize)]
pub struct ErrorLogResponse {
    pub entries: Vec<ErrorEntry>,
    /// Badge count for the UI
    pub count: usize,
}

/// POST /errors/retry request
#[derive(Debug, Default, Deserialize)]
pub struct RetryRequest {
    /// Entries to retry; absent means all entries
    pub entry_ids: Option<Vec<Uuid>>,
}

/// POST /errors/retry response
#[derive(Debug, Serialize)]
pub struct RetryResponse {
    pub session_id: Uuid,
}

/// POST /errors/clear response
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
}

/// GET /errors
pub async fn get_errors(State(state): State<AppState>) -> Json<ErrorLogResponse> {
    let log = state.error_log.read().await;
    Json(ErrorLogResponse {
        entries: log.entries().to_vec(),
        count: log.len(),
    })
}

/// POST /errors/retry
///
/// Returns the targeted entries' items to pending and resubmits them.
pub async fn retry(
    State(state): State<AppState>,
    Json(request): Json<RetryRequest>,
) -> ApiResult<Json<RetryResponse>> {
    let session_id = state.controller.retry(request.entry_ids).await?;
    Ok(Json(RetryResponse { session_id }))
}

/// POST /errors/clear — empties the log without touching item statuses
pub async fn clear(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared = state.error_log.write().await.clear();
    Json(ClearResponse { cleared })
}

/// Build error log routes
pub fn error_routes() -> Router<AppState> {
    Router::new()
        .route("/errors", get(get_errors))
        .route("/errors/retry", post(retry))
        .route("/errors/clear", post(clear))
}
