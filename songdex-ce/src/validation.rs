//! Human validation workflow
//!
//! Post-enrichment review over the shared item collection. Only this
//! workflow writes the `validating`/`validated`/`rejected` transitions;
//! enrichment-phase statuses belong to the batch controller. Invalid
//! transitions are rejected explicitly and never corrupt state.

use crate::models::{EnrichedFields, ItemStatus, ItemStore, MusicItem};
use chrono::Utc;
use serde::Deserialize;
use songdex_common::events::{CatalogEvent, EventBus};
use songdex_common::{Error, Result};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Read-side status filter for the review list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    /// Awaiting review: enriched or validating
    Pending,
    Validated,
    Rejected,
}

impl StatusFilter {
    fn matches(self, status: ItemStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status.is_reviewable(),
            StatusFilter::Validated => status == ItemStatus::Validated,
            StatusFilter::Rejected => status == ItemStatus::Rejected,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "validated" => Ok(StatusFilter::Validated),
            "rejected" => Ok(StatusFilter::Rejected),
            other => Err(Error::InvalidInput(format!(
                "unknown status filter: {other}"
            ))),
        }
    }
}

/// Review state machine over enriched items
pub struct ValidationWorkflow {
    items: Arc<RwLock<ItemStore>>,
    events: EventBus,
}

impl ValidationWorkflow {
    pub fn new(items: Arc<RwLock<ItemStore>>, events: EventBus) -> Self {
        Self { items, events }
    }

    /// Move an enriched item under review (`enriched → validating`)
    pub async fn start_review(&self, id: Uuid) -> Result<MusicItem> {
        let mut items = self.items.write().await;
        let item = get_item_mut(&mut items, id)?;

        if item.status != ItemStatus::Enriched {
            return Err(Error::InvalidState(format!(
                "cannot start review while {:?}",
                item.status
            )));
        }

        item.status = ItemStatus::Validating;
        tracing::debug!(item_id = %id, "Item under review");
        Ok(item.clone())
    }

    /// Accept an item (`→ validated`, terminal)
    pub async fn validate(&self, id: Uuid) -> Result<MusicItem> {
        let item = self.finish_review(id, ItemStatus::Validated).await?;
        self.events
            .emit(CatalogEvent::ItemValidated {
                item_id: id,
                timestamp: Utc::now(),
            })
            .ok();
        Ok(item)
    }

    /// Reject an item (`→ rejected`, terminal)
    pub async fn reject(&self, id: Uuid) -> Result<MusicItem> {
        let item = self.finish_review(id, ItemStatus::Rejected).await?;
        self.events
            .emit(CatalogEvent::ItemRejected {
                item_id: id,
                timestamp: Utc::now(),
            })
            .ok();
        Ok(item)
    }

    /// Merge provided fields into the item's enriched fields; status is
    /// unchanged
    pub async fn edit(&self, id: Uuid, fields: EnrichedFields) -> Result<MusicItem> {
        let mut items = self.items.write().await;
        let item = get_item_mut(&mut items, id)?;

        if !item.status.is_reviewable() {
            return Err(Error::InvalidState(format!(
                "cannot edit fields while {:?}",
                item.status
            )));
        }

        item.enriched_fields
            .get_or_insert_with(EnrichedFields::default)
            .merge(fields);
        tracing::debug!(item_id = %id, "Enriched fields edited");
        Ok(item.clone())
    }

    /// Items matching the filter, in submission order (pure projection)
    pub async fn list(&self, filter: StatusFilter) -> Vec<MusicItem> {
        self.items
            .read()
            .await
            .iter()
            .filter(|item| filter.matches(item.status))
            .cloned()
            .collect()
    }

    async fn finish_review(&self, id: Uuid, terminal: ItemStatus) -> Result<MusicItem> {
        let mut items = self.items.write().await;
        let item = get_item_mut(&mut items, id)?;

        if !item.status.is_reviewable() {
            return Err(Error::InvalidState(format!(
                "cannot transition to {:?} while {:?}",
                terminal, item.status
            )));
        }

        item.status = terminal;
        tracing::info!(item_id = %id, status = ?terminal, "Review finished");
        Ok(item.clone())
    }
}

fn get_item_mut(items: &mut ItemStore, id: Uuid) -> Result<&mut MusicItem> {
    items
        .get_mut(id)
        .ok_or_else(|| Error::NotFound(format!("item not found: {id}")))
}
