//! Batch orchestration.
//!
//! A changeset is cut into consecutive chunks of at most `batch_size` items
//! and each chunk is submitted as one call through the executor, strictly in
//! order. `n` chunks therefore take at least `(n - 1) * min_delay`.

use std::time::Duration;

use termsync_client::ApiError;

use crate::error::SyncError;
use crate::executor::{RateLimitedExecutor, Sleeper};
use crate::observer::{Phase, SyncObserver};

/// A batch failed; `completed` holds the results of the batches before it.
#[derive(Debug)]
pub struct BatchFailure<R> {
    pub completed: Vec<R>,
    /// 1-based index of the failing batch; 0 when no batch was attempted.
    pub batch: usize,
    pub total: usize,
    pub error: SyncError,
}

impl<R> BatchFailure<R> {
    pub fn message(&self) -> String {
        if self.batch == 0 {
            self.error.to_string()
        } else {
            format!("batch {} of {}: {}", self.batch, self.total, self.error)
        }
    }
}

/// Number of calls needed for `items` items.
pub fn batch_count(items: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        0
    } else {
        items.div_ceil(batch_size)
    }
}

/// Submit `items` in chunks, collecting one result per chunk in order.
pub fn run_batches<T, R, S, O>(
    executor: &mut RateLimitedExecutor<S, O>,
    phase: Phase,
    items: &[T],
    batch_size: usize,
    min_delay: Duration,
    mut op: impl FnMut(&[T]) -> Result<R, ApiError>,
) -> Result<Vec<R>, BatchFailure<R>>
where
    S: Sleeper,
    O: SyncObserver,
{
    if batch_size == 0 {
        return Err(BatchFailure {
            completed: Vec::new(),
            batch: 0,
            total: 0,
            error: SyncError::InvalidBatchSize,
        });
    }

    let total = batch_count(items.len(), batch_size);
    let mut results = Vec::with_capacity(total);
    for (i, chunk) in items.chunks(batch_size).enumerate() {
        executor.observer().on_batch(phase, i + 1, total);
        match executor.run(min_delay, || op(chunk)) {
            Ok(result) => results.push(result),
            Err(error) => {
                return Err(BatchFailure {
                    completed: results,
                    batch: i + 1,
                    total,
                    error,
                });
            }
        }
    }
    Ok(results)
}
