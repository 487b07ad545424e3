//! Session-scoped error ledger with retry support
//!
//! Entries are ordered most-recent-last. The log is append-only for the
//! duration of a run; entries leave the log only through `clear` or by being
//! retried. Consecutive failures with the same message coalesce into one
//! entry so a shared fault (e.g. network outage) covers all its items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One failure record, possibly covering several items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Entry identifier, used to target retries
    pub id: Uuid,

    /// When the first failure covered by this entry occurred
    pub timestamp: DateTime<Utc>,

    /// Human-readable failure summary
    pub message: String,

    /// Raw failure text, when the provider supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Ids of the items implicated by this failure, in failure order
    pub failed_items: Vec<Uuid>,
}

/// Ordered failure ledger, most-recent-last
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Vec<ErrorEntry>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an item failure, extending the last entry when the message
    /// matches (shared fault), otherwise appending a new entry.
    pub fn record_failure(
        &mut self,
        message: String,
        details: Option<String>,
        item_id: Uuid,
    ) -> &ErrorEntry {
        let extend_last = self
            .entries
            .last()
            .map(|entry| entry.message == message)
            .unwrap_or(false);

        if extend_last {
            let last = self.entries.last_mut().expect("checked non-empty");
            if !last.failed_items.contains(&item_id) {
                last.failed_items.push(item_id);
            }
        } else {
            self.entries.push(ErrorEntry {
                id: Uuid::new_v4(),
                timestamp: Utc::now(),
                message,
                details,
                failed_items: vec![item_id],
            });
        }

        self.entries.last().expect("just written")
    }

    /// Entries in insertion order (most-recent-last)
    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the log without touching item statuses
    pub fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }

    /// Remove the targeted entries (all of them when `entry_ids` is `None`)
    /// and return the ordered union of their failed item ids.
    ///
    /// Order follows entry order, then per-entry failure order; duplicates
    /// across entries collapse to their first occurrence.
    pub fn take_for_retry(&mut self, entry_ids: Option<&[Uuid]>) -> Vec<Uuid> {
        let targeted: Vec<ErrorEntry> = match entry_ids {
            None => std::mem::take(&mut self.entries),
            Some(ids) => {
                let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
                    .into_iter()
                    .partition(|entry| ids.contains(&entry.id));
                self.entries = kept;
                taken
            }
        };

        let mut seen = std::collections::HashSet::new();
        let mut items = Vec::new();
        for entry in targeted {
            for item_id in entry.failed_items {
                if seen.insert(item_id) {
                    items.push(item_id);
                }
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_messages_append_entries() {
        let mut log = ErrorLog::new();
        log.record_failure("timeout".to_string(), None, Uuid::new_v4());
        log.record_failure("not found".to_string(), None, Uuid::new_v4());
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].message, "timeout");
        assert_eq!(log.entries()[1].message, "not found");
    }

    #[test]
    fn repeated_message_extends_last_entry() {
        let mut log = ErrorLog::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        log.record_failure("network error: connection refused".to_string(), None, a);
        log.record_failure("network error: connection refused".to_string(), None, b);

        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].failed_items, vec![a, b]);
    }

    #[test]
    fn retry_all_drains_log_in_order() {
        let mut log = ErrorLog::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        log.record_failure("timeout".to_string(), None, a);
        log.record_failure("timeout".to_string(), None, b);
        log.record_failure("bad response".to_string(), None, c);

        let items = log.take_for_retry(None);
        assert_eq!(items, vec![a, b, c]);
        assert!(log.is_empty());
    }

    #[test]
    fn retry_selected_keeps_other_entries() {
        let mut log = ErrorLog::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        log.record_failure("timeout".to_string(), None, a);
        log.record_failure("bad response".to_string(), None, b);
        let first_entry = log.entries()[0].id;

        let items = log.take_for_retry(Some(&[first_entry]));
        assert_eq!(items, vec![a]);
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].message, "bad response");
    }

    #[test]
    fn retry_deduplicates_across_entries() {
        let mut log = ErrorLog::new();
        let a = Uuid::new_v4();
        log.record_failure("timeout".to_string(), None, a);
        log.record_failure("bad response".to_string(), None, a);

        let items = log.take_for_retry(None);
        assert_eq!(items, vec![a]);
    }

    #[test]
    fn clear_reports_count() {
        let mut log = ErrorLog::new();
        log.record_failure("timeout".to_string(), None, Uuid::new_v4());
        assert_eq!(log.clear(), 1);
        assert!(log.is_empty());
    }
}
