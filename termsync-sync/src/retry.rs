//! Retry policy as a small state machine.
//!
//! ```text
//!   Attempting(n) ──ok──────────────────────────▶ Succeeded(n)
//!        │
//!        ├─retryable, n < max──▶ BackingOff(n, wait) ──resume──▶ Attempting(n+1)
//!        ├─retryable, n = max──▶ Exhausted(n)
//!        └─fatal───────────────▶ Aborted(n)
//! ```
//!
//! The machine is pure: the caller supplies the jitter sample and performs
//! the actual waiting.

use std::time::Duration;

use termsync_client::ApiError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(5000);

/// Attempt ceiling and jitter range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total executions, including the first.
    pub max_attempts: u32,
    /// Upper bound (exclusive) of the random delay added to each backoff.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

/// How one failed attempt should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Retryable { hint: Option<Duration> },
    Fatal,
}

impl FailureKind {
    pub fn of(err: &ApiError) -> Self {
        if err.is_retryable() {
            FailureKind::Retryable {
                hint: err.retry_hint(),
            }
        } else {
            FailureKind::Fatal
        }
    }
}

/// Position in one operation's retry loop. Attempts are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting {
        attempt: u32,
    },
    BackingOff {
        attempt: u32,
        wait: Duration,
        hint: Option<Duration>,
    },
    Exhausted {
        attempts: u32,
    },
    Aborted {
        attempts: u32,
    },
    Succeeded {
        attempts: u32,
    },
}

impl RetryState {
    pub fn start() -> Self {
        RetryState::Attempting { attempt: 1 }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RetryState::Exhausted { .. } | RetryState::Aborted { .. } | RetryState::Succeeded { .. }
        )
    }

    pub fn on_success(self) -> Self {
        match self {
            RetryState::Attempting { attempt } => RetryState::Succeeded { attempts: attempt },
            other => other,
        }
    }

    pub fn on_failure(
        self,
        kind: FailureKind,
        policy: &RetryPolicy,
        min_delay: Duration,
        jitter: Duration,
    ) -> Self {
        let RetryState::Attempting { attempt } = self else {
            return self;
        };
        match kind {
            FailureKind::Fatal => RetryState::Aborted { attempts: attempt },
            FailureKind::Retryable { .. } if attempt >= policy.max_attempts => {
                RetryState::Exhausted { attempts: attempt }
            }
            FailureKind::Retryable { hint } => RetryState::BackingOff {
                attempt,
                wait: backoff(attempt - 1, min_delay, hint).saturating_add(jitter),
                hint,
            },
        }
    }

    /// Leave `BackingOff` once the wait has elapsed.
    pub fn resume(self) -> Self {
        match self {
            RetryState::BackingOff { attempt, .. } => RetryState::Attempting {
                attempt: attempt + 1,
            },
            other => other,
        }
    }
}

/// `max(min_delay, hint, min_delay * 2^failures)`, before jitter.
pub fn backoff(failures: u32, min_delay: Duration, hint: Option<Duration>) -> Duration {
    let exponential = min_delay.saturating_mul(1u32 << failures.min(16));
    min_delay
        .max(hint.unwrap_or(Duration::ZERO))
        .max(exponential)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn retryable() -> FailureKind {
        FailureKind::Retryable { hint: None }
    }

    #[rstest]
    #[case(0, None, 1)]
    #[case(1, None, 2)]
    #[case(3, None, 8)]
    #[case(0, Some(30), 30)]
    #[case(3, Some(5), 8)]
    fn backoff_takes_the_largest_candidate(
        #[case] failures: u32,
        #[case] hint_secs: Option<u64>,
        #[case] expected_secs: u64,
    ) {
        let wait = backoff(failures, SECOND, hint_secs.map(Duration::from_secs));
        assert_eq!(wait, Duration::from_secs(expected_secs));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let wait = backoff(u32::MAX, Duration::from_secs(u64::MAX / 2), None);
        assert_eq!(wait, Duration::MAX);
    }

    #[test]
    fn success_is_terminal() {
        let state = RetryState::start().on_success();
        assert_eq!(state, RetryState::Succeeded { attempts: 1 });
        assert!(state.is_terminal());
    }

    #[test]
    fn fatal_failure_aborts_immediately() {
        let policy = RetryPolicy::default();
        let state = RetryState::start().on_failure(FailureKind::Fatal, &policy, SECOND, SECOND);
        assert_eq!(state, RetryState::Aborted { attempts: 1 });
    }

    #[test]
    fn retryable_failure_backs_off_with_jitter() {
        let policy = RetryPolicy::default();
        let hint = Some(Duration::from_secs(3));
        let state = RetryState::start().on_failure(
            FailureKind::Retryable { hint },
            &policy,
            SECOND,
            Duration::from_millis(250),
        );
        assert_eq!(
            state,
            RetryState::BackingOff {
                attempt: 1,
                wait: Duration::from_millis(3250),
                hint,
            }
        );
        assert_eq!(state.resume(), RetryState::Attempting { attempt: 2 });
    }

    #[test]
    fn fifth_retryable_failure_exhausts() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::start();
        let mut waits = Vec::new();
        loop {
            state = state.on_failure(retryable(), &policy, SECOND, Duration::ZERO);
            match state {
                RetryState::BackingOff { wait, .. } => {
                    waits.push(wait.as_secs());
                    state = state.resume();
                }
                _ => break,
            }
        }
        assert_eq!(state, RetryState::Exhausted { attempts: 5 });
        assert_eq!(waits, vec![1, 2, 4, 8]);
    }

    #[test]
    fn transitions_from_terminal_states_are_ignored() {
        let policy = RetryPolicy::default();
        let done = RetryState::Succeeded { attempts: 2 };
        assert_eq!(done.on_failure(retryable(), &policy, SECOND, SECOND), done);
        assert_eq!(done.resume(), done);
        assert_eq!(done.on_success(), done);
    }

    #[test]
    fn classification_follows_error_kind() {
        let throttled = ApiError::Throttled {
            retry_after: Some(SECOND),
            message: String::new(),
        };
        assert_eq!(
            FailureKind::of(&throttled),
            FailureKind::Retryable { hint: Some(SECOND) }
        );
        let denied = ApiError::Unauthorized {
            message: String::new(),
        };
        assert_eq!(FailureKind::of(&denied), FailureKind::Fatal);
    }
}
