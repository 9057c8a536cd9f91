//! Completion accounting for the detail-fetch phase.

use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;
use owo_colors::OwoColorize;
use std::time::Instant;

/// Counts completed detail fetches and derives an items/second figure.
///
/// Shared between worker tasks; every field is updated atomically.
#[derive(Debug)]
pub struct Throughput {
    total: u64,
    completed: AtomicU64,
    kept: AtomicU64,
    started: Instant,
}

impl Throughput {
    /// Start the clock for a run over `total` ids.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            total,
            completed: AtomicU64::new(0),
            kept: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Record one finished task. `kept` is false when the task produced no record.
    ///
    /// Returns the number of completed tasks so far.
    pub fn record_completion(&self, kept: bool) -> u64 {
        if kept {
            let _ = self.kept.fetch_add(1, Ordering::Relaxed);
        }
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn kept(&self) -> u64 {
        self.kept.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.completed().saturating_sub(self.kept())
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Completed tasks per second of wall time since the run started.
    #[must_use]
    pub fn items_per_second(&self) -> f64 {
        rate(self.completed(), self.elapsed())
    }

    /// One-line status such as `12/40 services, 3.1 items/s`, green once every task is done.
    #[must_use]
    pub fn status_line(&self, use_colors: bool) -> String {
        let completed = self.completed();
        let text = format!("{completed}/{} services, {:.1} items/s", self.total, self.items_per_second());
        if !use_colors {
            return text;
        }

        if completed >= self.total {
            format!("{}", text.green())
        } else {
            format!("{}", text.cyan())
        }
    }
}

#[expect(clippy::cast_precision_loss, reason = "item counts stay far below 2^52")]
fn rate(completed: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { completed as f64 / secs } else { 0.0 }
}
