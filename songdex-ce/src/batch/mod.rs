//! Batch processing — the enrichment pipeline controller
//!
//! One controller instance owns the processing state for the service. Runs
//! execute on a spawned task, one enrichment call outstanding at a time, with
//! pause/cancel evaluated only at item boundaries.

pub mod controller;
pub mod progress;

pub use controller::BatchController;
pub use progress::{ProgressEstimator, DEFAULT_WINDOW};
