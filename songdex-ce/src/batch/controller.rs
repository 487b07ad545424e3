//! Batch controller — the enrichment run state machine
//!
//! Walks the submitted item list through the enrichment capability in
//! submission order. All state mutations (item status, progress counters,
//! error-log appends) happen on the run task before and after the single
//! await point, so the enrichment call is the only concurrency boundary.
//! Pause and cancel are cooperative flags checked between items, never
//! mid-call; commands flip the session status synchronously and iteration
//! honors them at the next boundary.

use crate::batch::progress::{ProgressEstimator, DEFAULT_WINDOW};
use crate::enrichment::Enricher;
use crate::models::{BatchSession, ErrorLog, ItemStatus, ItemStore, ProcessingSnapshot};
use chrono::Utc;
use songdex_common::events::{BatchStatus, CatalogEvent, EventBus};
use songdex_common::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Per-run cooperative control flags
struct RunControl {
    cancel: CancellationToken,
    paused: Arc<AtomicBool>,
    resume: Arc<Notify>,
}

impl RunControl {
    fn fresh() -> Self {
        Self {
            cancel: CancellationToken::new(),
            paused: Arc::new(AtomicBool::new(false)),
            resume: Arc::new(Notify::new()),
        }
    }
}

/// Everything the run task needs, cloned out of the controller
struct RunContext {
    session: Arc<RwLock<BatchSession>>,
    items: Arc<RwLock<ItemStore>>,
    error_log: Arc<RwLock<ErrorLog>>,
    enricher: Arc<dyn Enricher>,
    events: EventBus,
    cancel: CancellationToken,
    paused: Arc<AtomicBool>,
    resume: Arc<Notify>,
}

/// The enrichment pipeline controller
///
/// Exclusive owner of the processing state; the only writer of item status
/// during a run. One instance serves the whole session; each submission
/// starts a fresh [`BatchSession`].
pub struct BatchController {
    session: Arc<RwLock<BatchSession>>,
    items: Arc<RwLock<ItemStore>>,
    error_log: Arc<RwLock<ErrorLog>>,
    enricher: Arc<dyn Enricher>,
    events: EventBus,
    control: Mutex<RunControl>,
}

impl BatchController {
    pub fn new(
        items: Arc<RwLock<ItemStore>>,
        error_log: Arc<RwLock<ErrorLog>>,
        enricher: Arc<dyn Enricher>,
        events: EventBus,
    ) -> Self {
        Self {
            session: Arc::new(RwLock::new(BatchSession::idle())),
            items,
            error_log,
            enricher,
            events,
            control: Mutex::new(RunControl::fresh()),
        }
    }

    /// Current state snapshot for the presentation layer
    pub async fn snapshot(&self) -> ProcessingSnapshot {
        self.session.read().await.snapshot()
    }

    /// Start a new run over `item_ids`
    ///
    /// Accepted from idle or a terminal state. An empty submission completes
    /// immediately with `total = 0` and no error.
    pub async fn submit(&self, item_ids: Vec<Uuid>) -> Result<Uuid> {
        let mut control = self.control.lock().await;
        let mut session = self.session.write().await;

        if !session.status.accepts_submission() {
            return Err(Error::InvalidState(format!(
                "cannot submit while {:?}",
                session.status
            )));
        }

        *control = RunControl::fresh();
        *session = BatchSession::new_run(item_ids.clone());
        let session_id = session.session_id;

        tracing::info!(
            session_id = %session_id,
            total = item_ids.len(),
            "Batch run submitted"
        );

        self.events
            .emit(CatalogEvent::BatchStarted {
                session_id,
                total: item_ids.len(),
                timestamp: Utc::now(),
            })
            .ok();

        if item_ids.is_empty() {
            session.transition_to(BatchStatus::Completed);
            self.events
                .emit(CatalogEvent::BatchCompleted {
                    session_id,
                    succeeded: 0,
                    failed: 0,
                    timestamp: Utc::now(),
                })
                .ok();
            return Ok(session_id);
        }

        let ctx = RunContext {
            session: Arc::clone(&self.session),
            items: Arc::clone(&self.items),
            error_log: Arc::clone(&self.error_log),
            enricher: Arc::clone(&self.enricher),
            events: self.events.clone(),
            cancel: control.cancel.clone(),
            paused: Arc::clone(&control.paused),
            resume: Arc::clone(&control.resume),
        };

        drop(session);
        drop(control);

        tokio::spawn(async move {
            run(ctx, session_id, item_ids).await;
        });

        Ok(session_id)
    }

    /// Halt iteration before the next item; the in-flight item completes
    pub async fn pause(&self) -> Result<ProcessingSnapshot> {
        let control = self.control.lock().await;
        let mut session = self.session.write().await;

        if !session.status.can_pause() {
            return Err(Error::InvalidState(format!(
                "cannot pause while {:?}",
                session.status
            )));
        }

        control.paused.store(true, Ordering::Release);
        let transition = session.transition_to(BatchStatus::Paused);
        tracing::info!(session_id = %session.session_id, "Batch run paused");

        self.emit_state_change(&transition);
        Ok(session.snapshot())
    }

    /// Continue a paused run from the next unprocessed item
    pub async fn resume(&self) -> Result<ProcessingSnapshot> {
        let control = self.control.lock().await;
        let mut session = self.session.write().await;

        if session.status != BatchStatus::Paused {
            return Err(Error::InvalidState(format!(
                "cannot resume while {:?}",
                session.status
            )));
        }

        control.paused.store(false, Ordering::Release);
        control.resume.notify_one();
        let transition = session.transition_to(BatchStatus::Processing);
        tracing::info!(session_id = %session.session_id, "Batch run resumed");

        self.emit_state_change(&transition);
        Ok(session.snapshot())
    }

    /// Stop the run; the in-flight item (if any) resolves first and
    /// unattempted items stay pending
    pub async fn cancel(&self) -> Result<ProcessingSnapshot> {
        let control = self.control.lock().await;
        let mut session = self.session.write().await;

        if !session.status.can_cancel() {
            return Err(Error::InvalidState(format!(
                "cannot cancel while {:?}",
                session.status
            )));
        }

        control.cancel.cancel();
        let transition = session.transition_to(BatchStatus::Cancelled);
        tracing::info!(session_id = %session.session_id, "Batch run cancelled");

        self.emit_state_change(&transition);
        Ok(session.snapshot())
    }

    /// Return to idle from a finished (or never-started) run
    ///
    /// Items stranded in `enriching` by an abnormal teardown are reset to
    /// `pending`.
    pub async fn reset(&self) -> Result<ProcessingSnapshot> {
        let mut session = self.session.write().await;

        if matches!(
            session.status,
            BatchStatus::Processing | BatchStatus::Paused
        ) {
            return Err(Error::InvalidState(format!(
                "cannot reset while {:?}",
                session.status
            )));
        }

        let stranded = self.items.write().await.reset_stranded();
        if stranded > 0 {
            tracing::warn!(stranded, "Reset items left in enriching state");
        }

        let old_status = session.status;
        *session = BatchSession::idle();
        tracing::info!("Processing state reset to idle");

        self.events
            .emit(CatalogEvent::BatchStateChanged {
                session_id: session.session_id,
                old_status,
                new_status: BatchStatus::Idle,
                timestamp: Utc::now(),
            })
            .ok();

        Ok(session.snapshot())
    }

    /// Retry failed items from the error log
    ///
    /// Collects the ordered union of failed item ids across the targeted
    /// entries (all entries when `entry_ids` is `None`), removes those
    /// entries, resets the items to pending, and resubmits them.
    pub async fn retry(&self, entry_ids: Option<Vec<Uuid>>) -> Result<Uuid> {
        {
            let session = self.session.read().await;
            if !session.status.accepts_submission() {
                return Err(Error::InvalidState(format!(
                    "cannot retry while {:?}",
                    session.status
                )));
            }
        }

        let item_ids = self
            .error_log
            .write()
            .await
            .take_for_retry(entry_ids.as_deref());

        if item_ids.is_empty() {
            return Err(Error::NotFound(
                "no failed items match the requested entries".to_string(),
            ));
        }

        {
            let mut items = self.items.write().await;
            for id in &item_ids {
                if let Some(item) = items.get_mut(*id) {
                    item.status = ItemStatus::Pending;
                }
            }
        }

        tracing::info!(items = item_ids.len(), "Retrying failed items");
        self.submit(item_ids).await
    }

    fn emit_state_change(&self, transition: &crate::models::StateTransition) {
        self.events
            .emit(CatalogEvent::BatchStateChanged {
                session_id: transition.session_id,
                old_status: transition.old_status,
                new_status: transition.new_status,
                timestamp: transition.transitioned_at,
            })
            .ok();
    }
}

/// The run task: walk items in submission order with boundary checks
async fn run(ctx: RunContext, session_id: Uuid, item_ids: Vec<Uuid>) {
    let total = item_ids.len();
    let mut estimator = ProgressEstimator::new(DEFAULT_WINDOW);
    let mut succeeded = 0;
    let mut failed = 0;

    for (index, item_id) in item_ids.iter().enumerate() {
        // Boundary check: cancellation wins over pause
        if ctx.cancel.is_cancelled() {
            tracing::info!(
                session_id = %session_id,
                attempted = index,
                "Run stopped at item boundary after cancellation"
            );
            return;
        }

        // Boundary check: wait out a pause, still honoring cancellation
        while ctx.paused.load(Ordering::Acquire) {
            tokio::select! {
                _ = ctx.resume.notified() => {}
                _ = ctx.cancel.cancelled() => {
                    tracing::info!(
                        session_id = %session_id,
                        attempted = index,
                        "Run cancelled while paused"
                    );
                    return;
                }
            }
        }

        // Mark in flight and snapshot the item for the lookup call
        let item_snapshot = {
            let mut items = ctx.items.write().await;
            items.get_mut(*item_id).map(|item| {
                item.status = ItemStatus::Enriching;
                item.clone()
            })
        };
        let Some(item_snapshot) = item_snapshot else {
            // Item was replaced since the ids were captured (stale retry);
            // count the attempt and move on.
            tracing::warn!(
                session_id = %session_id,
                item_id = %item_id,
                "Submitted item no longer exists, skipping"
            );
            update_progress(&ctx, session_id, &estimator, index + 1, total).await;
            continue;
        };

        ctx.events
            .emit(CatalogEvent::ItemStarted {
                session_id,
                item_id: *item_id,
                index,
                total,
                timestamp: Utc::now(),
            })
            .ok();

        tracing::debug!(
            session_id = %session_id,
            item_id = %item_id,
            title = %item_snapshot.title,
            progress = format!("{}/{}", index + 1, total),
            "Enriching item"
        );

        // The single await point; pause/cancel never interrupt it
        let result = ctx.enricher.enrich(&item_snapshot).await;

        match result {
            Ok(enrichment) => {
                {
                    let mut items = ctx.items.write().await;
                    if let Some(item) = items.get_mut(*item_id) {
                        item.enriched_fields = Some(enrichment.fields.clone());
                        item.confidence_score = Some(enrichment.confidence_score);
                        item.enrichment_source = Some(enrichment.source.clone());
                        item.status = ItemStatus::Enriched;
                    }
                }
                estimator.record_completion();
                succeeded += 1;

                ctx.events
                    .emit(CatalogEvent::ItemEnriched {
                        session_id,
                        item_id: *item_id,
                        confidence_score: enrichment.confidence_score,
                        source: enrichment.source,
                        timestamp: Utc::now(),
                    })
                    .ok();
            }
            Err(error) => {
                let message = error.to_string();
                let details = error.details();

                {
                    let mut items = ctx.items.write().await;
                    if let Some(item) = items.get_mut(*item_id) {
                        item.status = ItemStatus::Pending;
                    }
                }

                let failed_items = {
                    let mut log = ctx.error_log.write().await;
                    log.record_failure(message.clone(), details, *item_id)
                        .failed_items
                        .clone()
                };
                failed += 1;

                tracing::warn!(
                    session_id = %session_id,
                    item_id = %item_id,
                    error = %message,
                    "Item enrichment failed (non-fatal, continuing)"
                );

                ctx.events
                    .emit(CatalogEvent::ItemFailed {
                        session_id,
                        item_id: *item_id,
                        error: message.clone(),
                        timestamp: Utc::now(),
                    })
                    .ok();
                ctx.events
                    .emit(CatalogEvent::ErrorLogged {
                        message,
                        failed_items,
                        timestamp: Utc::now(),
                    })
                    .ok();
            }
        }

        update_progress(&ctx, session_id, &estimator, index + 1, total).await;
    }

    // Natural completion. A cancellation that landed after the last item
    // already owns the terminal state, and a superseding submission owns
    // the session outright.
    let mut session = ctx.session.write().await;
    if session.session_id != session_id || session.status.is_terminal() {
        return;
    }
    let transition = session.transition_to(BatchStatus::Completed);

    tracing::info!(
        session_id = %session_id,
        total,
        succeeded,
        failed,
        "Batch run completed"
    );

    ctx.events
        .emit(CatalogEvent::BatchStateChanged {
            session_id,
            old_status: transition.old_status,
            new_status: transition.new_status,
            timestamp: transition.transitioned_at,
        })
        .ok();
    ctx.events
        .emit(CatalogEvent::BatchCompleted {
            session_id,
            succeeded,
            failed,
            timestamp: Utc::now(),
        })
        .ok();
}

/// Write the attempted count into the session and broadcast it
async fn update_progress(
    ctx: &RunContext,
    session_id: Uuid,
    estimator: &ProgressEstimator,
    current: usize,
    total: usize,
) {
    let progress = estimator.snapshot(current, total);
    {
        // A new submission may have replaced the session while this run's
        // in-flight item resolved; never scribble on a successor.
        let mut session = ctx.session.write().await;
        if session.session_id != session_id {
            return;
        }
        session.progress = progress.clone();
    }
    ctx.events
        .emit(CatalogEvent::ProgressUpdate {
            session_id,
            progress,
            timestamp: Utc::now(),
        })
        .ok();
}
