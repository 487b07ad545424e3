//! Throughput and ETA estimation from a rolling completion window
//!
//! Keeps the most recent completion timestamps; speed is derived from the
//! spacing inside the window (anchored at run start while the window holds a
//! single sample). ETA is absent until speed is measurable — consumers
//! render the absent value as a placeholder, never as a number.

use songdex_common::events::ProgressInfo;
use std::collections::VecDeque;
use std::time::Instant;

/// Completions kept for the speed estimate
pub const DEFAULT_WINDOW: usize = 20;

#[derive(Debug)]
pub struct ProgressEstimator {
    started_at: Instant,
    window: VecDeque<Instant>,
    window_size: usize,
}

impl ProgressEstimator {
    /// Anchor a fresh estimator at run start
    pub fn new(window_size: usize) -> Self {
        Self::anchored_at(window_size, Instant::now())
    }

    /// Anchor at an explicit start time (deterministic tests)
    pub fn anchored_at(window_size: usize, started_at: Instant) -> Self {
        Self {
            started_at,
            window: VecDeque::with_capacity(window_size.max(1)),
            window_size: window_size.max(1),
        }
    }

    /// Record a completion now
    pub fn record_completion(&mut self) {
        self.record_at(Instant::now());
    }

    /// Record a completion at an explicit time (deterministic tests)
    pub fn record_at(&mut self, at: Instant) {
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(at);
    }

    /// Completed items per second over the rolling window; 0 until at least
    /// one completion has been recorded
    pub fn speed(&self) -> f64 {
        match self.window.len() {
            0 => 0.0,
            1 => {
                let span = self.window[0].duration_since(self.started_at).as_secs_f64();
                if span > 0.0 {
                    1.0 / span
                } else {
                    0.0
                }
            }
            n => {
                let first = self.window.front().expect("len >= 2");
                let last = self.window.back().expect("len >= 2");
                let span = last.duration_since(*first).as_secs_f64();
                if span > 0.0 {
                    (n - 1) as f64 / span
                } else {
                    0.0
                }
            }
        }
    }

    /// Full progress snapshot for `current` of `total` attempted items
    pub fn snapshot(&self, current: usize, total: usize) -> ProgressInfo {
        let percentage = if total == 0 {
            0.0
        } else {
            (current as f64 / total as f64) * 100.0
        };

        let speed = self.speed();
        let eta_seconds = if speed > 0.0 {
            Some(total.saturating_sub(current) as f64 / speed)
        } else {
            None
        };

        ProgressInfo {
            current,
            total,
            percentage,
            speed,
            eta_seconds,
        }
    }
}
