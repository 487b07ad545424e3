//! Batch run state machine
//!
//! A session progresses `idle → processing → {paused, completed, cancelled}`;
//! `paused` resumes to `processing` or falls to `cancelled`. Completed and
//! cancelled are terminal for the run; a new submission starts a fresh
//! session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use songdex_common::events::{BatchStatus, ProgressInfo};
use uuid::Uuid;

/// State transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_status: BatchStatus,
    pub new_status: BatchStatus,
    pub transitioned_at: DateTime<Utc>,
}

/// One batch run over a submitted item list (in-memory state)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSession {
    /// Unique session identifier
    pub session_id: Uuid,

    /// Current run status
    pub status: BatchStatus,

    /// Submitted item ids, in submission order
    pub item_ids: Vec<Uuid>,

    /// Progress counters and throughput estimate
    pub progress: ProgressInfo,

    /// Session start time
    pub started_at: DateTime<Utc>,

    /// Session end time (once terminal)
    pub ended_at: Option<DateTime<Utc>>,
}

/// Read snapshot exposed to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSnapshot {
    pub session_id: Uuid,
    pub status: BatchStatus,
    pub can_pause: bool,
    pub can_cancel: bool,
    pub progress: ProgressInfo,
}

impl BatchSession {
    /// The resting state before any submission
    pub fn idle() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            status: BatchStatus::Idle,
            item_ids: Vec::new(),
            progress: ProgressInfo::default(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Start a new run over `item_ids`, already in `processing`
    pub fn new_run(item_ids: Vec<Uuid>) -> Self {
        let total = item_ids.len();
        Self {
            session_id: Uuid::new_v4(),
            status: BatchStatus::Processing,
            item_ids,
            progress: ProgressInfo {
                total,
                ..ProgressInfo::default()
            },
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to a new status, stamping `ended_at` on terminal states
    pub fn transition_to(&mut self, new_status: BatchStatus) -> StateTransition {
        let transition = StateTransition {
            session_id: self.session_id,
            old_status: self.status,
            new_status,
            transitioned_at: Utc::now(),
        };
        self.status = new_status;

        if new_status.is_terminal() {
            self.ended_at = Some(Utc::now());
        }

        transition
    }

    /// True once the run has finished
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Snapshot for the presentation layer
    pub fn snapshot(&self) -> ProcessingSnapshot {
        ProcessingSnapshot {
            session_id: self.session_id,
            status: self.status,
            can_pause: self.status.can_pause(),
            can_cancel: self.status.can_cancel(),
            progress: self.progress.clone(),
        }
    }
}
