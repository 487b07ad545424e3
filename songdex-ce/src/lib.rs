//! songdex-ce library interface
//!
//! Exposes the ingestion stage, the batch controller, the validation
//! workflow, and the HTTP API for integration testing.

pub mod api;
pub mod batch;
pub mod enrichment;
pub mod error;
pub mod ingest;
pub mod models;
pub mod selection;
pub mod validation;

pub use crate::error::{ApiError, ApiResult};

use crate::batch::BatchController;
use crate::enrichment::Enricher;
use crate::ingest::CatalogStore;
use crate::models::{ErrorLog, ItemStore};
use crate::selection::SelectionSet;
use crate::validation::ValidationWorkflow;
use axum::Router;
use chrono::{DateTime, Utc};
use songdex_common::events::EventBus;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Ingested catalog: files, extracted titles, stats
    pub catalog: Arc<RwLock<CatalogStore>>,
    /// Titles currently included for processing
    pub selection: Arc<RwLock<SelectionSet>>,
    /// Items of the current submission cycle
    pub items: Arc<RwLock<ItemStore>>,
    /// Session-scoped failure ledger
    pub error_log: Arc<RwLock<ErrorLog>>,
    /// The enrichment pipeline controller
    pub controller: Arc<BatchController>,
    /// Post-enrichment review workflow
    pub validation: Arc<ValidationWorkflow>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(enricher: Arc<dyn Enricher>, event_bus: EventBus) -> Self {
        let items = Arc::new(RwLock::new(ItemStore::new()));
        let error_log = Arc::new(RwLock::new(ErrorLog::new()));

        let controller = Arc::new(BatchController::new(
            Arc::clone(&items),
            Arc::clone(&error_log),
            enricher,
            event_bus.clone(),
        ));
        let validation = Arc::new(ValidationWorkflow::new(
            Arc::clone(&items),
            event_bus.clone(),
        ));

        Self {
            catalog: Arc::new(RwLock::new(CatalogStore::new())),
            selection: Arc::new(RwLock::new(SelectionSet::new())),
            items,
            error_log,
            controller,
            validation,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::catalog_routes())
        .merge(api::selection_routes())
        .merge(api::batch_routes())
        .merge(api::error_routes())
        .merge(api::validation_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .with_state(state)
}
