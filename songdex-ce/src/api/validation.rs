//! Validation workflow handlers

use crate::error::ApiResult;
use crate::models::{EnrichedFields, MusicItem};
use crate::validation::StatusFilter;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// GET /items query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: StatusFilter,
}

/// GET /items?filter=all|pending|validated|rejected
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<MusicItem>> {
    Json(state.validation.list(query.filter).await)
}

/// POST /items/{id}/review — move an enriched item under review
pub async fn start_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MusicItem>> {
    Ok(Json(state.validation.start_review(id).await?))
}

/// POST /items/{id}/validate — accept (terminal)
pub async fn validate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MusicItem>> {
    Ok(Json(state.validation.validate(id).await?))
}

/// POST /items/{id}/reject — reject (terminal)
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MusicItem>> {
    Ok(Json(state.validation.reject(id).await?))
}

/// PATCH /items/{id} — merge fields into the item's enriched fields
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(fields): Json<EnrichedFields>,
) -> ApiResult<Json<MusicItem>> {
    Ok(Json(state.validation.edit(id, fields).await?))
}

/// Build validation routes
pub fn validation_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items))
        .route("/items/:id", patch(edit))
        .route("/items/:id/review", post(start_review))
        .route("/items/:id/validate", post(validate))
        .route("/items/:id/reject", post(reject))
}
