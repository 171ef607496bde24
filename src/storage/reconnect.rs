//! Caller-driven session refresh
//!
//! Many FTP servers silently drop control connections that have been busy
//! for a while. Long sequences of work call [`Reconnector::checkpoint`]
//! between items and at section boundaries; once the current interval
//! reaches the threshold the backend is asked to reconnect.

use super::StorageBackend;
use crate::error::Result;
use crate::models::Progress;
use std::time::Duration;

pub const DEFAULT_RECONNECT_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Between sections; the interval always restarts here
    Boundary,
    /// Between items inside a section; the interval only restarts on reconnect
    Item,
}

#[derive(Debug, Clone, Copy)]
pub struct Reconnector {
    threshold: Duration,
}

impl Default for Reconnector {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_AFTER)
    }
}

impl Reconnector {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// True when the current interval has reached the threshold and the
    /// backend can do something about it
    pub fn is_due(&self, backend: &dyn StorageBackend, progress: &Progress) -> bool {
        progress.elapsed() >= self.threshold && backend.supports_reconnect()
    }

    /// Returns `true` when a reconnect was issued
    pub fn checkpoint(
        &self,
        backend: &dyn StorageBackend,
        progress: &mut Progress,
        name: &str,
        checkpoint: Checkpoint,
    ) -> Result<bool> {
        let due = self.is_due(backend, progress);
        if due {
            tracing::debug!(checkpoint = name, "interval threshold reached, reconnecting");
            backend.reconnect()?;
        }
        match checkpoint {
            Checkpoint::Boundary => {
                progress.lap(name, true);
            }
            Checkpoint::Item if due => progress.reset_interval(),
            Checkpoint::Item => {}
        }
        Ok(due)
    }
}
