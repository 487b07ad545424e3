//! MusicBrainz recording search client
//!
//! Queries the MusicBrainz search API for the best-scoring recording match
//! and maps it into enriched fields. Requests are rate limited (MusicBrainz
//! allows 1 request/second for anonymous clients) and carry the configured
//! User-Agent.

use super::{Enricher, Enrichment, EnrichmentError};
use crate::models::{EnrichedFields, MusicItem};
use async_trait::async_trait;
use serde::Deserialize;
use songdex_common::config::EnrichmentConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Source tag recorded on items enriched by this client
pub const SOURCE_TAG: &str = "musicbrainz";

/// Recordings requested per search
const SEARCH_LIMIT: u32 = 5;

/// MusicBrainz recording search response
#[derive(Debug, Clone, Deserialize)]
struct MBSearchResponse {
    #[serde(default)]
    recordings: Vec<MBRecording>,
}

/// One recording in a search response
#[derive(Debug, Clone, Deserialize)]
struct MBRecording {
    /// Search match score (0-100)
    score: Option<u8>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<MBArtistCredit>,
    #[serde(default)]
    releases: Vec<MBRelease>,
    #[serde(default)]
    tags: Vec<MBTag>,
}

#[derive(Debug, Clone, Deserialize)]
struct MBArtistCredit {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct MBRelease {
    title: String,
    /// Release date in YYYY, YYYY-MM or YYYY-MM-DD form
    date: Option<String>,
    country: Option<String>,
    #[serde(rename = "label-info", default)]
    label_info: Vec<MBLabelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct MBLabelInfo {
    label: Option<MBLabel>,
}

#[derive(Debug, Clone, Deserialize)]
struct MBLabel {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct MBTag {
    name: String,
}

/// Rate limiter enforcing a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// MusicBrainz-backed enrichment provider
pub struct MusicBrainzEnricher {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    base_url: String,
}

impl MusicBrainzEnricher {
    pub fn new(config: &EnrichmentConfig) -> Result<Self, EnrichmentError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit_ms)),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn search_recordings(
        &self,
        query: &str,
    ) -> Result<MBSearchResponse, EnrichmentError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/recording", self.base_url);
        tracing::debug!(query = %query, "Querying MusicBrainz recording search");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query),
                ("fmt", "json"),
                ("limit", &SEARCH_LIMIT.to_string()),
            ])
            .send()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Provider(status.as_u16(), body));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|_| EnrichmentError::Malformed(raw))
    }
}

#[async_trait]
impl Enricher for MusicBrainzEnricher {
    async fn enrich(&self, item: &MusicItem) -> Result<Enrichment, EnrichmentError> {
        let query = build_query(&item.title, item.artist.as_deref());
        let response = self.search_recordings(&query).await?;

        let best = response
            .recordings
            .into_iter()
            .max_by_key(|r| r.score.unwrap_or(0))
            .ok_or_else(|| EnrichmentError::NoMatch(item.title.clone()))?;

        Ok(map_recording(best))
    }
}

/// Lucene query over the recording and artist fields
fn build_query(title: &str, artist: Option<&str>) -> String {
    let title = escape_query_value(title);
    match artist {
        Some(artist) if !artist.trim().is_empty() => {
            format!(
                "recording:\"{}\" AND artist:\"{}\"",
                title,
                escape_query_value(artist)
            )
        }
        _ => format!("recording:\"{}\"", title),
    }
}

fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Map the best-scoring recording into an enrichment result
fn map_recording(recording: MBRecording) -> Enrichment {
    // Earliest release carries the original issue data
    let release = recording
        .releases
        .iter()
        .min_by_key(|r| parse_year(r.date.as_deref()).unwrap_or(i32::MAX));

    let fields = EnrichedFields {
        composer: recording.artist_credit.first().map(|c| c.name.clone()),
        release_year: release.and_then(|r| parse_year(r.date.as_deref())),
        album: release.map(|r| r.title.clone()),
        genre: recording.tags.first().map(|t| t.name.clone()),
        label: release.and_then(|r| {
            r.label_info
                .iter()
                .find_map(|info| info.label.as_ref().map(|l| l.name.clone()))
        }),
        country: release.and_then(|r| r.country.clone()),
    };

    Enrichment {
        fields,
        confidence_score: recording.score.unwrap_or(0).min(100),
        source: SOURCE_TAG.to_string(),
    }
}

/// Year component of a YYYY[-MM[-DD]] date
fn parse_year(date: Option<&str>) -> Option<i32> {
    let date = date?;
    let year = date.split('-').next()?;
    year.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_json(score: u8) -> MBRecording {
        serde_json::from_value(serde_json::json!({
            "score": score,
            "artist-credit": [{"name": "John Lennon"}],
            "releases": [
                {
                    "title": "Imagine (Remaster)",
                    "date": "2010-10-04",
                    "country": "US",
                    "label-info": []
                },
                {
                    "title": "Imagine",
                    "date": "1971-09-09",
                    "country": "GB",
                    "label-info": [{"label": {"name": "Apple"}}]
                }
            ],
            "tags": [{"name": "rock"}]
        }))
        .expect("valid recording json")
    }

    #[test]
    fn maps_earliest_release() {
        let enrichment = map_recording(recording_json(97));
        assert_eq!(enrichment.confidence_score, 97);
        assert_eq!(enrichment.source, SOURCE_TAG);
        assert_eq!(enrichment.fields.album.as_deref(), Some("Imagine"));
        assert_eq!(enrichment.fields.release_year, Some(1971));
        assert_eq!(enrichment.fields.country.as_deref(), Some("GB"));
        assert_eq!(enrichment.fields.label.as_deref(), Some("Apple"));
        assert_eq!(enrichment.fields.genre.as_deref(), Some("rock"));
        assert_eq!(enrichment.fields.composer.as_deref(), Some("John Lennon"));
    }

    #[test]
    fn empty_search_response_parses() {
        let response: MBSearchResponse = serde_json::from_str(r#"{"recordings": []}"#)
            .expect("empty response parses");
        assert!(response.recordings.is_empty());
    }

    #[test]
    fn query_includes_artist_when_present() {
        let q = build_query("Imagine", Some("John Lennon"));
        assert_eq!(q, "recording:\"Imagine\" AND artist:\"John Lennon\"");

        let q = build_query("Imagine", None);
        assert_eq!(q, "recording:\"Imagine\"");

        let q = build_query("Imagine", Some("  "));
        assert_eq!(q, "recording:\"Imagine\"");
    }

    #[test]
    fn quotes_are_escaped_in_queries() {
        let q = build_query("\"Heroes\"", None);
        assert_eq!(q, "recording:\"\\\"Heroes\\\"\"");
    }

    #[test]
    fn year_parses_from_partial_dates() {
        assert_eq!(parse_year(Some("1971-09-09")), Some(1971));
        assert_eq!(parse_year(Some("1971")), Some(1971));
        assert_eq!(parse_year(Some("not a date")), None);
        assert_eq!(parse_year(None), None);
    }
}
