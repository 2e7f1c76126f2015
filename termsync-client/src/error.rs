//! Error types for termsync-client.

use std::time::Duration;

use thiserror::Error;

use termsync_core::ConfigError;

/// Coarse classification driving retry decisions upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Local misconfiguration; nothing was sent.
    Configuration,
    /// The service refused the credential.
    Credential,
    /// Too many requests.
    Throttled,
    /// Transient server-side unavailability.
    Unavailable,
    /// The service answered but reported failure in its payload.
    Rejected,
    Other,
}

impl ErrorClass {
    /// Only throttling and transient unavailability are worth another attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Throttled | ErrorClass::Unavailable)
    }
}

/// Every failure a remote call can produce, normalized.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid API credential (HTTP 401): {message}")]
    Unauthorized { message: String },

    #[error("rate limited (HTTP 429): {message}")]
    Throttled {
        retry_after: Option<Duration>,
        message: String,
    },

    #[error("service unavailable (HTTP {status}): {message}")]
    Unavailable { status: u16, message: String },

    /// Transport succeeded but the response envelope did not report success.
    #[error("request rejected by service (HTTP {status}, code {code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response payload: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ApiError::Config(_) => ErrorClass::Configuration,
            ApiError::Unauthorized { .. } => ErrorClass::Credential,
            ApiError::Throttled { .. } => ErrorClass::Throttled,
            ApiError::Unavailable { .. } => ErrorClass::Unavailable,
            ApiError::Rejected { .. } => ErrorClass::Rejected,
            ApiError::Http { .. } | ApiError::Transport(_) | ApiError::Decode(_) => {
                ErrorClass::Other
            }
        }
    }

    /// HTTP status attached to the failure, when one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Throttled { .. } => Some(429),
            ApiError::Unavailable { status, .. }
            | ApiError::Rejected { status, .. }
            | ApiError::Http { status, .. } => Some(*status),
            ApiError::Config(_) | ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }

    /// Server-supplied wait before retrying.
    pub fn retry_hint(&self) -> Option<Duration> {
        match self {
            ApiError::Throttled { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class().is_retryable()
    }
}
