//! # termsync-sync
//!
//! Reconciliation and push pipeline.
//!
//! [`build_plan`] reads the remote project and diffs local keys against it;
//! [`execute_sync`] pushes a [`termsync_core::Plan`] back in rate-limited
//! batches. Every remote call goes through one [`RateLimitedExecutor`].

pub mod batch;
pub mod coordinator;
pub mod diff;
pub mod error;
pub mod executor;
pub mod fields;
pub mod observer;
pub mod pipeline;
pub mod retry;
pub mod snapshot;

#[cfg(test)]
mod fake;

pub use batch::{batch_count, run_batches, BatchFailure};
pub use coordinator::{execute_sync, preview, MachineTranslate, PhaseFailurePolicy, SyncOptions};
pub use diff::{diff, normalize_langs, DiffOptions};
pub use error::{DiffError, SyncError};
pub use executor::{RateLimitedExecutor, Sleeper, ThreadSleeper};
pub use observer::{NoopObserver, Phase, SyncObserver, TracingObserver};
pub use pipeline::build_plan;
pub use retry::{RetryPolicy, RetryState};
pub use snapshot::{fetch_snapshot, RemoteSnapshot};
