//! Catalog ingestion and read-model handlers

use crate::error::{ApiError, ApiResult};
use crate::ingest::{self, RawFile};
use crate::models::{CatalogStats, ExtractedTitle, SourceFile};
use crate::selection::SelectionSet;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use songdex_common::events::CatalogEvent;

/// POST /catalog/ingest request
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub files: Vec<RawFile>,
}

/// POST /catalog/ingest response
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub files: Vec<SourceFile>,
    pub stats: CatalogStats,
}

/// POST /catalog/ingest
///
/// Runs column detection and title extraction over pre-parsed rows,
/// replaces the session catalog, and re-initializes the selection to all
/// extracted titles.
pub async fn ingest_catalog(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> ApiResult<Json<IngestResponse>> {
    if request.files.is_empty() {
        return Err(ApiError::BadRequest("no files supplied".to_string()));
    }

    let outcome = ingest::ingest(&request.files);
    let response = IngestResponse {
        files: outcome.files.clone(),
        stats: outcome.stats,
    };

    {
        let mut selection = state.selection.write().await;
        *selection = SelectionSet::from_titles(&outcome.titles);
    }
    {
        let mut catalog = state.catalog.write().await;
        catalog.replace(outcome);
    }

    state
        .event_bus
        .emit(CatalogEvent::CatalogIngested {
            total_files: response.stats.total_files,
            total_sheets: response.stats.total_sheets,
            total_titles: response.stats.total_titles,
            unique_titles: response.stats.unique_titles,
            timestamp: Utc::now(),
        })
        .ok();

    let selected = state.selection.read().await.selected_keys();
    state
        .event_bus
        .emit(CatalogEvent::SelectionChanged {
            selected,
            timestamp: Utc::now(),
        })
        .ok();

    Ok(Json(response))
}

/// GET /catalog/titles — deduplicated titles in first-seen order
pub async fn get_titles(State(state): State<AppState>) -> Json<Vec<ExtractedTitle>> {
    Json(state.catalog.read().await.titles.clone())
}

/// GET /catalog/stats — derived aggregates over the current input
pub async fn get_stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(state.catalog.read().await.stats)
}

/// GET /catalog/files — per-file/sheet detection detail
pub async fn get_files(State(state): State<AppState>) -> Json<Vec<SourceFile>> {
    Json(state.catalog.read().await.files.clone())
}

/// Build catalog routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/ingest", post(ingest_catalog))
        .route("/catalog/titles", get(get_titles))
        .route("/catalog/stats", get(get_stats))
        .route("/catalog/files", get(get_files))
}
