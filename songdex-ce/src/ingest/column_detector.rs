//! Heuristic column role detection
//!
//! Matches header text against known synonym lists (Portuguese and English)
//! for the three semantic roles: title, artist, lyrics. Ambiguous or absent
//! matches yield `None` for that role rather than failing. Detection has no
//! side effects and is idempotent.

use super::title_extractor::TITLE_LABEL_PREFIXES;
use super::RawSheet;
use crate::models::catalog::PREVIEW_ROWS;
use crate::models::{ColumnMatch, DetectedColumns, Sheet};

/// Header fragments that mark a title column
const TITLE_SYNONYMS: &[&str] = &[
    "música", "musica", "nome", "título", "titulo", "canção", "cancao", "title", "song", "track",
];

/// Header fragments that mark an artist column
const ARTIST_SYNONYMS: &[&str] = &[
    "artista",
    "cantor",
    "cantora",
    "intérprete",
    "interprete",
    "banda",
    "artist",
    "singer",
    "performer",
];

/// Header fragments that mark a lyrics column
const LYRICS_SYNONYMS: &[&str] = &["letra", "letras", "lyrics", "lyric"];

/// Heuristic header-to-role matcher
#[derive(Debug, Default)]
pub struct ColumnDetector;

impl ColumnDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect column roles for one sheet and build its catalog record
    pub fn detect_sheet(&self, raw: &RawSheet) -> Sheet {
        let detected = self.detect(&raw.headers, &raw.rows);

        tracing::debug!(
            sheet = %raw.sheet_name,
            title = ?detected.title.as_ref().map(|m| m.index),
            artist = ?detected.artist.as_ref().map(|m| m.index),
            lyrics = ?detected.lyrics.as_ref().map(|m| m.index),
            "Column detection complete"
        );

        Sheet {
            sheet_name: raw.sheet_name.clone(),
            detected_columns: detected,
            row_count: raw.rows.len(),
            preview: raw.rows.iter().take(PREVIEW_ROWS).cloned().collect(),
        }
    }

    /// Match headers against the role synonym lists
    ///
    /// Roles are resolved in order title, artist, lyrics; a column claimed
    /// for one role is not reused for another. When no header matches the
    /// title role, a column whose sampled data cells carry the known title
    /// label prefix is accepted instead.
    pub fn detect(&self, headers: &[String], sample_rows: &[Vec<String>]) -> DetectedColumns {
        let mut claimed = vec![false; headers.len()];

        let title = find_role(headers, &mut claimed, TITLE_SYNONYMS)
            .or_else(|| title_from_sample(headers, &mut claimed, sample_rows));
        let artist = find_role(headers, &mut claimed, ARTIST_SYNONYMS);
        let lyrics = find_role(headers, &mut claimed, LYRICS_SYNONYMS);

        DetectedColumns {
            title,
            artist,
            lyrics,
        }
    }
}

/// First unclaimed header containing any synonym for the role
fn find_role(
    headers: &[String],
    claimed: &mut [bool],
    synonyms: &[&str],
) -> Option<ColumnMatch> {
    for (index, header) in headers.iter().enumerate() {
        if claimed[index] {
            continue;
        }
        let normalized = header.trim().to_lowercase();
        if normalized.is_empty() {
            continue;
        }
        if synonyms.iter().any(|syn| normalized.contains(syn)) {
            claimed[index] = true;
            return Some(ColumnMatch {
                name: header.clone(),
                index,
            });
        }
    }
    None
}

/// Fallback: a column whose sampled cells carry the title label prefix
fn title_from_sample(
    headers: &[String],
    claimed: &mut [bool],
    sample_rows: &[Vec<String>],
) -> Option<ColumnMatch> {
    let sample = sample_rows.iter().take(PREVIEW_ROWS);

    for (index, header) in headers.iter().enumerate() {
        if claimed[index] {
            continue;
        }
        let labelled = sample.clone().any(|row| {
            row.get(index)
                .map(|cell| {
                    let lowered = cell.trim().to_lowercase();
                    TITLE_LABEL_PREFIXES
                        .iter()
                        .any(|prefix| lowered.starts_with(prefix))
                })
                .unwrap_or(false)
        });
        if labelled {
            claimed[index] = true;
            return Some(ColumnMatch {
                name: header.clone(),
                index,
            });
        }
    }
    None
}
