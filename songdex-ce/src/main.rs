//! songdex-ce - Catalog Enrichment service
//!
//! Ingests spreadsheet-derived music catalog rows, extracts and deduplicates
//! candidate song titles, and drives them through the enrichment pipeline
//! with pause/resume/cancel control and a human validation workflow.
//!
//! Integrates with the Songdex UI via HTTP REST + SSE.

use anyhow::Result;
use songdex_ce::enrichment::MusicBrainzEnricher;
use songdex_ce::AppState;
use songdex_common::config;
use songdex_common::events::EventBus;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load config before tracing so the filter setting applies
    let toml_config = config::load_config(None)?;

    let filter = EnvFilter::try_new(config::resolve_log_filter(&toml_config))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting songdex-ce (Catalog Enrichment) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let port = config::resolve_port(&toml_config);

    // Enrichment provider; tests inject mocks through AppState instead
    let enricher = Arc::new(
        MusicBrainzEnricher::new(&toml_config.enrichment)
            .map_err(|e| anyhow::anyhow!("Failed to build enrichment client: {}", e))?,
    );
    info!(
        base_url = %toml_config.enrichment.base_url,
        "Enrichment provider initialized"
    );

    // Event bus for SSE broadcasting
    let event_bus = EventBus::new(100);
    let state = AppState::new(enricher, event_bus);

    let app = songdex_ce::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{port}");
    info!("Health check: http://127.0.0.1:{port}/health");

    axum::serve(listener, app).await?;

    Ok(())
}
