//! Batch run command handlers
//!
//! Submission materializes items from the current selection and hands them
//! to the controller; the remaining commands delegate to the controller's
//! state machine. Invalid commands come back as 409 Conflict.

use crate::error::{ApiError, ApiResult};
use crate::models::{MusicItem, ProcessingSnapshot};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

/// POST /batch/submit response
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub session_id: Uuid,
    pub submitted: usize,
    pub snapshot: ProcessingSnapshot,
}

/// POST /batch/submit
///
/// Builds a fresh item collection from the current selection (a new
/// submission starts a new review cycle) and starts the run.
pub async fn submit(State(state): State<AppState>) -> ApiResult<Json<SubmitResponse>> {
    // Reject early so an active run keeps its item collection
    let snapshot = state.controller.snapshot().await;
    if !snapshot.status.accepts_submission() {
        return Err(ApiError::Conflict(format!(
            "cannot submit while {:?}",
            snapshot.status
        )));
    }

    let items: Vec<MusicItem> = {
        let catalog = state.catalog.read().await;
        let selection = state.selection.read().await;
        selection
            .selected_keys()
            .iter()
            .filter_map(|key| catalog.title_by_key(key))
            .map(MusicItem::from_extracted)
            .collect()
    };

    let item_ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
    state.items.write().await.replace_all(items);

    let session_id = state.controller.submit(item_ids.clone()).await?;

    Ok(Json(SubmitResponse {
        session_id,
        submitted: item_ids.len(),
        snapshot: state.controller.snapshot().await,
    }))
}

/// GET /batch/status
pub async fn status(State(state): State<AppState>) -> Json<ProcessingSnapshot> {
    Json(state.controller.snapshot().await)
}

/// POST /batch/pause
pub async fn pause(State(state): State<AppState>) -> ApiResult<Json<ProcessingSnapshot>> {
    Ok(Json(state.controller.pause().await?))
}

/// POST /batch/resume
pub async fn resume(State(state): State<AppState>) -> ApiResult<Json<ProcessingSnapshot>> {
    Ok(Json(state.controller.resume().await?))
}

/// POST /batch/cancel
pub async fn cancel(State(state): State<AppState>) -> ApiResult<Json<ProcessingSnapshot>> {
    Ok(Json(state.controller.cancel().await?))
}

/// POST /batch/reset
pub async fn reset(State(state): State<AppState>) -> ApiResult<Json<ProcessingSnapshot>> {
    Ok(Json(state.controller.reset().await?))
}

/// Build batch routes
pub fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/batch/submit", post(submit))
        .route("/batch/status", get(status))
        .route("/batch/pause", post(pause))
        .route("/batch/resume", post(resume))
        .route("/batch/cancel", post(cancel))
        .route("/batch/reset", post(reset))
}
