//! Event types and EventBus for the Songdex event system
//!
//! Every state change in the enrichment pipeline is broadcast as a
//! [`CatalogEvent`]; the HTTP layer forwards them to connected UIs over SSE.

mod batch_types;

pub use batch_types::{BatchStatus, ProgressInfo};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Songdex event types
///
/// Events are broadcast via [`EventBus`] and serialized for SSE transmission.
/// All events use this central enum for type safety and exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    /// Catalog rows were ingested and titles extracted
    CatalogIngested {
        total_files: usize,
        total_sheets: usize,
        total_titles: usize,
        unique_titles: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Selection mutated; carries the new full selection in extraction order
    SelectionChanged {
        selected: Vec<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A batch run was submitted
    BatchStarted {
        session_id: Uuid,
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Batch run status changed (processing/paused/cancelled/completed/idle)
    BatchStateChanged {
        session_id: Uuid,
        old_status: BatchStatus,
        new_status: BatchStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An item was picked up for enrichment
    ItemStarted {
        session_id: Uuid,
        item_id: Uuid,
        index: usize,
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An item was enriched successfully
    ItemEnriched {
        session_id: Uuid,
        item_id: Uuid,
        confidence_score: u8,
        source: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Enrichment of an item failed; the item stays retryable
    ItemFailed {
        session_id: Uuid,
        item_id: Uuid,
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Progress counters updated after an item was attempted
    ProgressUpdate {
        session_id: Uuid,
        progress: ProgressInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// All items attempted
    BatchCompleted {
        session_id: Uuid,
        succeeded: usize,
        failed: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A failure entry was appended to the error log
    ErrorLogged {
        message: String,
        failed_items: Vec<Uuid>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An item passed human validation
    ItemValidated {
        item_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An item was rejected during human validation
    ItemRejected {
        item_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl CatalogEvent {
    /// Event type name used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::CatalogIngested { .. } => "catalog_ingested",
            CatalogEvent::SelectionChanged { .. } => "selection_changed",
            CatalogEvent::BatchStarted { .. } => "batch_started",
            CatalogEvent::BatchStateChanged { .. } => "batch_state_changed",
            CatalogEvent::ItemStarted { .. } => "item_started",
            CatalogEvent::ItemEnriched { .. } => "item_enriched",
            CatalogEvent::ItemFailed { .. } => "item_failed",
            CatalogEvent::ProgressUpdate { .. } => "progress_update",
            CatalogEvent::BatchCompleted { .. } => "batch_completed",
            CatalogEvent::ErrorLogged { .. } => "error_logged",
            CatalogEvent::ItemValidated { .. } => "item_validated",
            CatalogEvent::ItemRejected { .. } => "item_rejected",
        }
    }
}

/// Central event distribution bus
///
/// Wraps `tokio::sync::broadcast`, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CatalogEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    ///
    /// Capacity bounds how many events are buffered before slow subscribers
    /// start observing lag. 100 is plenty for a single-run pipeline; tests
    /// use smaller values.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns the subscriber count, or an error when nobody is listening.
    /// Emitting into an empty bus is not a fault; callers that don't care
    /// use `.ok()`.
    pub fn emit(
        &self,
        event: CatalogEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<CatalogEvent>> {
        self.tx.send(event)
    }

    /// Channel capacity this bus was created with
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
