//! Music items — the unit of enrichment work
//!
//! Items are created `pending` from selected extracted titles, walked through
//! the enrichment pipeline by the batch controller, and finished by the
//! validation workflow. The controller is the only writer of item status
//! during a run; the validation workflow owns the review transitions.

use crate::models::catalog::ExtractedTitle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Item lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Awaiting enrichment (initial state, and the state failures revert to)
    Pending,
    /// Enrichment call in flight
    Enriching,
    /// Enrichment succeeded; awaiting review
    Enriched,
    /// Under human review
    Validating,
    /// Accepted by reviewer (terminal)
    Validated,
    /// Rejected by reviewer (terminal)
    Rejected,
}

impl ItemStatus {
    /// Terminal states cannot transition further
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Validated | ItemStatus::Rejected)
    }

    /// States the validation workflow operates on
    pub fn is_reviewable(self) -> bool {
        matches!(self, ItemStatus::Enriched | ItemStatus::Validating)
    }
}

/// Metadata fields produced by enrichment; all optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichedFields {
    pub composer: Option<String>,
    pub release_year: Option<i32>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub label: Option<String>,
    pub country: Option<String>,
}

impl EnrichedFields {
    /// Merge `other` into self; only fields present in `other` are applied
    pub fn merge(&mut self, other: EnrichedFields) {
        if other.composer.is_some() {
            self.composer = other.composer;
        }
        if other.release_year.is_some() {
            self.release_year = other.release_year;
        }
        if other.album.is_some() {
            self.album = other.album;
        }
        if other.genre.is_some() {
            self.genre = other.genre;
        }
        if other.label.is_some() {
            self.label = other.label;
        }
        if other.country.is_some() {
            self.country = other.country;
        }
    }
}

/// A catalog entry being enriched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicItem {
    /// Stable identifier, unique across the batch
    pub id: Uuid,

    /// Song title (prefix-normalized at extraction time)
    pub title: String,

    /// Artist, when the source sheet carried one
    pub artist: Option<String>,

    /// Lyric text, when the source sheet carried a lyrics column
    pub lyrics: Option<String>,

    /// Lifecycle status
    pub status: ItemStatus,

    /// Present only once enriched
    pub enriched_fields: Option<EnrichedFields>,

    /// Match confidence reported by the enrichment source (0-100)
    pub confidence_score: Option<u8>,

    /// Tag of the lookup strategy that produced the data
    pub enrichment_source: Option<String>,

    /// Free-form reviewer notes
    pub notes: Option<String>,
}

impl MusicItem {
    /// Create a pending item from an extracted title
    pub fn from_extracted(title: &ExtractedTitle) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.title.clone(),
            artist: title.artist.clone(),
            lyrics: title.lyrics.clone(),
            status: ItemStatus::Pending,
            enriched_fields: None,
            confidence_score: None,
            enrichment_source: None,
            notes: None,
        }
    }
}

/// Ordered item collection with an id index
///
/// Canonical items live in insertion order; a side index maps ids to slots
/// for O(1) lookup. Items are replaced wholesale on each new submission.
#[derive(Debug, Default)]
pub struct ItemStore {
    items: Vec<MusicItem>,
    index: HashMap<Uuid, usize>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection (new submission cycle)
    pub fn replace_all(&mut self, items: Vec<MusicItem>) {
        self.index = items
            .iter()
            .enumerate()
            .map(|(slot, item)| (item.id, slot))
            .collect();
        self.items = items;
    }

    pub fn get(&self, id: Uuid) -> Option<&MusicItem> {
        self.index.get(&id).map(|&slot| &self.items[slot])
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut MusicItem> {
        let slot = *self.index.get(&id)?;
        Some(&mut self.items[slot])
    }

    /// Items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &MusicItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reset items stranded in `enriching` back to `pending`
    ///
    /// An abnormally torn-down run must never leave an item in `enriching`.
    pub fn reset_stranded(&mut self) -> usize {
        let mut reset = 0;
        for item in &mut self.items {
            if item.status == ItemStatus::Enriching {
                item.status = ItemStatus::Pending;
                reset += 1;
            }
        }
        reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::TitleSource;

    fn extracted(title: &str) -> ExtractedTitle {
        ExtractedTitle {
            title: title.to_string(),
            artist: Some("John Lennon".to_string()),
            lyrics: None,
            source: TitleSource {
                filename: "catalog.xlsx".to_string(),
                sheet_name: "Sheet1".to_string(),
            },
        }
    }

    #[test]
    fn from_extracted_starts_pending() {
        let item = MusicItem::from_extracted(&extracted("Imagine"));
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.title, "Imagine");
        assert_eq!(item.artist.as_deref(), Some("John Lennon"));
        assert!(item.enriched_fields.is_none());
        assert!(item.confidence_score.is_none());
    }

    #[test]
    fn store_lookup_by_id() {
        let mut store = ItemStore::new();
        let a = MusicItem::from_extracted(&extracted("Imagine"));
        let b = MusicItem::from_extracted(&extracted("Help"));
        let a_id = a.id;
        store.replace_all(vec![a, b]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(a_id).map(|i| i.title.as_str()), Some("Imagine"));
        assert!(store.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn replace_all_preserves_order() {
        let mut store = ItemStore::new();
        let titles = ["C", "A", "B"];
        store.replace_all(
            titles
                .iter()
                .map(|t| MusicItem::from_extracted(&extracted(t)))
                .collect(),
        );
        let seen: Vec<_> = store.iter().map(|i| i.title.clone()).collect();
        assert_eq!(seen, vec!["C", "A", "B"]);
    }

    #[test]
    fn reset_stranded_only_touches_enriching() {
        let mut store = ItemStore::new();
        let mut a = MusicItem::from_extracted(&extracted("Imagine"));
        a.status = ItemStatus::Enriching;
        let mut b = MusicItem::from_extracted(&extracted("Help"));
        b.status = ItemStatus::Enriched;
        store.replace_all(vec![a, b]);

        assert_eq!(store.reset_stranded(), 1);
        let statuses: Vec<_> = store.iter().map(|i| i.status).collect();
        assert_eq!(statuses, vec![ItemStatus::Pending, ItemStatus::Enriched]);
    }

    #[test]
    fn merge_applies_only_present_fields() {
        let mut fields = EnrichedFields {
            composer: Some("Lennon".to_string()),
            release_year: Some(1971),
            ..Default::default()
        };
        fields.merge(EnrichedFields {
            album: Some("Imagine".to_string()),
            release_year: Some(1972),
            ..Default::default()
        });

        assert_eq!(fields.composer.as_deref(), Some("Lennon"));
        assert_eq!(fields.release_year, Some(1972));
        assert_eq!(fields.album.as_deref(), Some("Imagine"));
        assert!(fields.genre.is_none());
    }
}
