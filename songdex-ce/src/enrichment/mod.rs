//! Enrichment capability seam
//!
//! The batch controller drives items through an injected lookup capability:
//! given an item, asynchronously produce enriched fields or fail. The
//! capability is object-safe so the binary wires in the MusicBrainz provider
//! while tests substitute scripted mocks.

pub mod musicbrainz;

pub use musicbrainz::MusicBrainzEnricher;

use crate::models::{EnrichedFields, MusicItem};
use async_trait::async_trait;
use thiserror::Error;

/// Successful lookup result
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub fields: EnrichedFields,
    /// Match confidence reported by the source (0-100)
    pub confidence_score: u8,
    /// Tag of the lookup strategy that produced the data
    pub source: String,
}

/// Lookup failure reasons
///
/// All variants are non-fatal to a batch run; the controller records them
/// and continues with the next item.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("network error: {0}")]
    Network(String),

    #[error("no match found for \"{0}\"")]
    NoMatch(String),

    #[error("provider error {0}")]
    Provider(u16, String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl EnrichmentError {
    /// Raw failure text beyond the summary, when the provider supplied one
    pub fn details(&self) -> Option<String> {
        match self {
            EnrichmentError::Provider(_, body) => Some(body.clone()),
            EnrichmentError::Malformed(raw) => Some(raw.clone()),
            _ => None,
        }
    }
}

/// Asynchronous per-item metadata lookup
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, item: &MusicItem) -> Result<Enrichment, EnrichmentError>;
}
