//! Progress reporting hooks.
//!
//! The pipeline never prints. Callers inject a [`SyncObserver`]; the default
//! [`TracingObserver`] turns events into `tracing` records.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use termsync_client::ApiError;

/// The three mutating phases of a live sync, plus the read-only fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Fetch,
    Add,
    Update,
    Delete,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Fetch => "fetch",
            Phase::Add => "add",
            Phase::Update => "update",
            Phase::Delete => "delete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives pipeline events. Every method defaults to a no-op.
pub trait SyncObserver {
    fn on_phase_start(&self, _phase: Phase, _items: usize) {}

    /// Called before batch `index` (1-based) of `total` is submitted.
    fn on_batch(&self, _phase: Phase, _index: usize, _total: usize) {}

    /// Called before waiting out a backoff after failed attempt `attempt`.
    fn on_retry(&self, _attempt: u32, _wait: Duration, _error: &ApiError) {}

    fn on_phase_finished(&self, _phase: Phase, _batches: usize, _failed: bool) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_phase_start(&self, phase: Phase, items: usize) {
        tracing::info!(%phase, items, "phase started");
    }

    fn on_batch(&self, phase: Phase, index: usize, total: usize) {
        tracing::info!(%phase, batch = index, total, "submitting batch");
    }

    fn on_retry(&self, attempt: u32, wait: Duration, error: &ApiError) {
        tracing::warn!(
            attempt,
            wait_ms = wait.as_millis() as u64,
            status = error.status(),
            error = %error,
            "retryable failure, backing off"
        );
    }

    fn on_phase_finished(&self, phase: Phase, batches: usize, failed: bool) {
        if failed {
            tracing::warn!(%phase, batches, "phase failed");
        } else {
            tracing::info!(%phase, batches, "phase finished");
        }
    }
}
