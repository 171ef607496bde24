//! Liveness bookkeeping for long-running resolution and archiving

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Elapsed-time and item counters. Only used to decide when a remote
/// session should be refreshed; nothing depends on it for correctness.
#[derive(Debug, Clone)]
pub struct Progress {
    interval_start: Instant,
    recorded: Duration,
    items_processed: usize,
    timers: BTreeMap<String, Duration>,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    pub fn new() -> Self {
        Self {
            interval_start: Instant::now(),
            recorded: Duration::ZERO,
            items_processed: 0,
            timers: BTreeMap::new(),
        }
    }

    /// Time in the current interval, including anything added with [`record`](Self::record)
    pub fn elapsed(&self) -> Duration {
        self.recorded + self.interval_start.elapsed()
    }

    /// Add externally measured time to the current interval
    pub fn record(&mut self, duration: Duration) {
        self.recorded += duration;
    }

    /// Current interval length. With `reset`, the interval is charged to the
    /// named timer and a new interval starts.
    pub fn lap(&mut self, name: &str, reset: bool) -> Duration {
        let elapsed = self.elapsed();
        if reset {
            *self.timers.entry(name.to_string()).or_default() += elapsed;
            self.reset_interval();
        }
        elapsed
    }

    pub fn reset_interval(&mut self) {
        self.interval_start = Instant::now();
        self.recorded = Duration::ZERO;
    }

    pub fn add_items(&mut self, count: usize) {
        self.items_processed += count;
    }

    pub fn items_processed(&self) -> usize {
        self.items_processed
    }

    /// Accumulated time charged to `name`
    pub fn timer(&self, name: &str) -> Duration {
        self.timers.get(name).copied().unwrap_or_default()
    }

    pub fn timers(&self) -> &BTreeMap<String, Duration> {
        &self.timers
    }
}
