//! Selection command handlers
//!
//! Every mutation answers with — and broadcasts — the new full selection as
//! an ordered list, so the UI can mirror state without a second read.

use crate::error::ApiResult;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use songdex_common::events::CatalogEvent;

/// Bulk operation scope
#[derive(Debug, Default, Deserialize)]
pub struct BulkSelectionRequest {
    /// Free-text filter over title and artist; absent means all titles
    pub filter: Option<String>,
}

/// POST /selection/toggle request
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    /// Normalized title key
    pub key: String,
}

/// Selection read model
#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    /// Selected keys in extraction order
    pub selected: Vec<String>,
    pub selected_count: usize,
    pub total: usize,
}

async fn selection_response(state: &AppState) -> SelectionResponse {
    let selection = state.selection.read().await;
    SelectionResponse {
        selected: selection.selected_keys(),
        selected_count: selection.selected_count(),
        total: selection.len(),
    }
}

fn emit_changed(state: &AppState, response: &SelectionResponse) {
    state
        .event_bus
        .emit(CatalogEvent::SelectionChanged {
            selected: response.selected.clone(),
            timestamp: Utc::now(),
        })
        .ok();
}

/// GET /selection
pub async fn get_selection(State(state): State<AppState>) -> Json<SelectionResponse> {
    Json(selection_response(&state).await)
}

/// POST /selection/select-all
pub async fn select_all(
    State(state): State<AppState>,
    Json(request): Json<BulkSelectionRequest>,
) -> Json<SelectionResponse> {
    state
        .selection
        .write()
        .await
        .select_all(request.filter.as_deref());

    let response = selection_response(&state).await;
    emit_changed(&state, &response);
    Json(response)
}

/// POST /selection/clear
pub async fn clear_all(
    State(state): State<AppState>,
    Json(request): Json<BulkSelectionRequest>,
) -> Json<SelectionResponse> {
    state
        .selection
        .write()
        .await
        .clear_all(request.filter.as_deref());

    let response = selection_response(&state).await;
    emit_changed(&state, &response);
    Json(response)
}

/// POST /selection/toggle
pub async fn toggle(
    State(state): State<AppState>,
    Json(request): Json<ToggleRequest>,
) -> ApiResult<Json<SelectionResponse>> {
    state.selection.write().await.toggle(&request.key)?;

    let response = selection_response(&state).await;
    emit_changed(&state, &response);
    Ok(Json(response))
}

/// Build selection routes
pub fn selection_routes() -> Router<AppState> {
    Router::new()
        .route("/selection", get(get_selection))
        .route("/selection/select-all", post(select_all))
        .route("/selection/clear", post(clear_all))
        .route("/selection/toggle", post(toggle))
}
