//! Rate-limited, retrying executor.
//!
//! [`RateLimitedExecutor::run`] executes one operation and, on success,
//! waits `min_delay` before returning. The wait happens after the call, so
//! consecutive calls through one executor are never closer than `min_delay`
//! no matter how long each call takes. Throttling and unavailability are
//! retried per [`RetryPolicy`]; every other failure is returned at once.
//!
//! `run` takes `&mut self`: one executor can never run two operations at the
//! same time.

use std::time::Duration;

use termsync_client::ApiError;

use crate::error::SyncError;
use crate::observer::{SyncObserver, TracingObserver};
use crate::retry::{FailureKind, RetryPolicy, RetryState};

/// Blocks the current thread. Injected so tests can record waits instead.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Real wall-clock sleeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub struct RateLimitedExecutor<S = ThreadSleeper, O = TracingObserver> {
    sleeper: S,
    observer: O,
    policy: RetryPolicy,
    rng: fastrand::Rng,
}

impl RateLimitedExecutor {
    /// Wall-clock sleeping, tracing progress, default policy.
    pub fn new() -> Self {
        Self::with_parts(
            ThreadSleeper,
            TracingObserver,
            RetryPolicy::default(),
            fastrand::Rng::new(),
        )
    }
}

impl Default for RateLimitedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sleeper, O: SyncObserver> RateLimitedExecutor<S, O> {
    pub fn with_parts(sleeper: S, observer: O, policy: RetryPolicy, rng: fastrand::Rng) -> Self {
        Self {
            sleeper,
            observer,
            policy,
            rng,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Run `op` until it succeeds, fails fatally, or exhausts its attempts.
    pub fn run<T>(
        &mut self,
        min_delay: Duration,
        mut op: impl FnMut() -> Result<T, ApiError>,
    ) -> Result<T, SyncError> {
        let mut state = RetryState::start();
        loop {
            let err = match op() {
                Ok(value) => {
                    if let RetryState::Attempting { attempt } = state {
                        tracing::trace!(attempt, "operation succeeded");
                    }
                    if !min_delay.is_zero() {
                        self.sleeper.sleep(min_delay);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let kind = FailureKind::of(&err);
            let jitter = match kind {
                FailureKind::Retryable { .. } => self.jitter(),
                FailureKind::Fatal => Duration::ZERO,
            };
            state = state.on_failure(kind, &self.policy, min_delay, jitter);
            match state {
                RetryState::BackingOff { attempt, wait, .. } => {
                    self.observer.on_retry(attempt, wait, &err);
                    self.sleeper.sleep(wait);
                    state = state.resume();
                }
                RetryState::Exhausted { attempts } => {
                    tracing::error!(attempts, error = %err, "retries exhausted");
                    return Err(SyncError::RetriesExhausted {
                        attempts,
                        status: err.status(),
                        source: err,
                    });
                }
                _ => return Err(SyncError::Remote(err)),
            }
        }
    }

    fn jitter(&mut self) -> Duration {
        let max = u64::try_from(self.policy.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.u64(0..max))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::time::Duration;

    use termsync_client::ApiError;

    use super::*;
    use crate::observer::Phase;

    /// Records waits instead of sleeping.
    #[derive(Debug, Default)]
    pub struct RecordingSleeper {
        pub waits: Vec<Duration>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.waits.push(duration);
        }
    }

    /// Records batch and retry events.
    #[derive(Debug, Default)]
    pub struct RecordingObserver {
        pub batches: RefCell<Vec<(Phase, usize, usize)>>,
        pub retries: RefCell<Vec<(u32, Duration)>>,
    }

    impl SyncObserver for RecordingObserver {
        fn on_batch(&self, phase: Phase, index: usize, total: usize) {
            self.batches.borrow_mut().push((phase, index, total));
        }

        fn on_retry(&self, attempt: u32, wait: Duration, _error: &ApiError) {
            self.retries.borrow_mut().push((attempt, wait));
        }
    }

    pub type TestExecutor = RateLimitedExecutor<RecordingSleeper, RecordingObserver>;

    pub fn executor() -> TestExecutor {
        RateLimitedExecutor::with_parts(
            RecordingSleeper::default(),
            RecordingObserver::default(),
            RetryPolicy::default(),
            fastrand::Rng::with_seed(7),
        )
    }

    pub fn executor_without_jitter() -> TestExecutor {
        RateLimitedExecutor::with_parts(
            RecordingSleeper::default(),
            RecordingObserver::default(),
            RetryPolicy {
                max_jitter: Duration::ZERO,
                ..RetryPolicy::default()
            },
            fastrand::Rng::with_seed(7),
        )
    }

    pub fn throttled(hint: Option<Duration>) -> ApiError {
        ApiError::Throttled {
            retry_after: hint,
            message: "Too Many Requests".into(),
        }
    }
}
