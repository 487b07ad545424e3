//! Selection set over extracted titles
//!
//! Tracks which titles the user has included for processing, keyed by the
//! normalized title. Initialized to all-selected after each ingest. Bulk
//! operations are scoped by a free-text filter (case-insensitive substring
//! over title and artist). Mutations are synchronous; the caller emits the
//! selection-changed notification with the ordered selection.

use crate::ingest::normalize_key;
use crate::models::ExtractedTitle;
use songdex_common::{Error, Result};
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct SelectionEntry {
    key: String,
    title: String,
    artist: Option<String>,
}

/// Selected title keys, ordered by extraction order
#[derive(Debug, Default)]
pub struct SelectionSet {
    entries: Vec<SelectionEntry>,
    selected: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the deduplicated title list with everything selected
    pub fn from_titles(titles: &[ExtractedTitle]) -> Self {
        let entries: Vec<SelectionEntry> = titles
            .iter()
            .map(|t| SelectionEntry {
                key: normalize_key(&t.title),
                title: t.title.clone(),
                artist: t.artist.clone(),
            })
            .collect();
        let selected = entries.iter().map(|e| e.key.clone()).collect();
        Self { entries, selected }
    }

    /// Currently selected keys, in extraction order
    pub fn selected_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| self.selected.contains(&e.key))
            .map(|e| e.key.clone())
            .collect()
    }

    /// Number of known titles
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of selected titles
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Toggle one title; returns the new selected state
    pub fn toggle(&mut self, key: &str) -> Result<bool> {
        if !self.entries.iter().any(|e| e.key == key) {
            return Err(Error::NotFound(format!("unknown title key: {key}")));
        }
        if self.selected.remove(key) {
            Ok(false)
        } else {
            self.selected.insert(key.to_string());
            Ok(true)
        }
    }

    /// Select every title matching the filter (all titles when `None`)
    pub fn select_all(&mut self, filter: Option<&str>) {
        for entry in &self.entries {
            if matches_filter(entry, filter) {
                self.selected.insert(entry.key.clone());
            }
        }
    }

    /// Deselect every title matching the filter (all titles when `None`)
    pub fn clear_all(&mut self, filter: Option<&str>) {
        for entry in &self.entries {
            if matches_filter(entry, filter) {
                self.selected.remove(&entry.key);
            }
        }
    }
}

/// Case-insensitive substring match over title and artist
fn matches_filter(entry: &SelectionEntry, filter: Option<&str>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    if entry.title.to_lowercase().contains(&needle) {
        return true;
    }
    entry
        .artist
        .as_ref()
        .map(|artist| artist.to_lowercase().contains(&needle))
        .unwrap_or(false)
}
