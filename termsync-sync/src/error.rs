//! Error types for termsync-sync.

use thiserror::Error;

use termsync_client::ApiError;
use termsync_core::PlanError;

/// Malformed diff inputs. These indicate an integration bug, not remote
/// state, and are never retried.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("local key #{index} has an empty identifier")]
    EmptyLocalKey { index: usize },

    #[error("remote term #{index} has an empty identifier")]
    EmptyRemoteTerm { index: usize },

    #[error("included language #{index} is empty")]
    EmptyLanguage { index: usize },

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// All errors that can arise from planning and executing a sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid diff input: {0}")]
    Diff(#[from] DiffError),

    /// A non-retryable remote failure, surfaced as-is.
    #[error(transparent)]
    Remote(#[from] ApiError),

    /// Throttling or unavailability persisted through every attempt.
    #[error("giving up after {attempts} attempts{}: {source}", status_suffix(.status))]
    RetriesExhausted {
        attempts: u32,
        status: Option<u16>,
        #[source]
        source: ApiError,
    },

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error(transparent)]
    Plan(#[from] PlanError),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_message_names_attempts_and_status() {
        let err = SyncError::RetriesExhausted {
            attempts: 5,
            status: Some(429),
            source: ApiError::Throttled {
                retry_after: None,
                message: "Too Many Requests".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("giving up after 5 attempts (HTTP 429): "), "{msg}");
        assert!(msg.contains("Too Many Requests"));
    }

    #[test]
    fn remote_errors_are_transparent() {
        let err = SyncError::from(ApiError::Unauthorized {
            message: "Invalid API Token".into(),
        });
        assert_eq!(err.to_string(), "invalid API credential (HTTP 401): Invalid API Token");
    }
}
