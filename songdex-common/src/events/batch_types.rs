//! Batch run status and progress types shared across Songdex modules

use serde::{Deserialize, Serialize};

/// Batch run status
///
/// `Completed` and `Cancelled` are terminal for a run; a new submission
/// re-enters via `Idle → Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// No run active
    Idle,
    /// Items are being enriched
    Processing,
    /// Iteration halted between items; resumable
    Paused,
    /// Run stopped by user; unattempted items remain pending
    Cancelled,
    /// All items attempted
    Completed,
}

impl BatchStatus {
    /// True for states that end a run
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Cancelled)
    }

    /// Pausing is only meaningful while items are being processed
    pub fn can_pause(self) -> bool {
        matches!(self, BatchStatus::Processing)
    }

    /// Cancelling is allowed while processing or paused
    pub fn can_cancel(self) -> bool {
        matches!(self, BatchStatus::Processing | BatchStatus::Paused)
    }

    /// A new submission is accepted from idle or a terminal state
    pub fn accepts_submission(self) -> bool {
        matches!(self, BatchStatus::Idle) || self.is_terminal()
    }
}

/// Progress snapshot for the active (or last) batch run
///
/// `eta_seconds` is `None` until throughput is measurable; consumers render
/// the absent value as a placeholder, never as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Items attempted so far (monotonically non-decreasing within a run)
    pub current: usize,

    /// Items submitted to the run
    pub total: usize,

    /// Percentage complete (0.0 - 100.0, 0 when total is 0)
    pub percentage: f64,

    /// Completed items per second over the rolling window
    pub speed: f64,

    /// Estimated seconds remaining, None while speed is unknown
    pub eta_seconds: Option<f64>,
}

impl Default for ProgressInfo {
    fn default() -> Self {
        Self {
            current: 0,
            total: 0,
            percentage: 0.0,
            speed: 0.0,
            eta_seconds: None,
        }
    }
}
