//! Graph store error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur talking to the graph store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("store rejected the request: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Maps a transport error onto the timeout/connect variants where it
    /// is one of those.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Timeout(e.to_string())
        } else if e.is_connect() {
            StoreError::Connect(e.to_string())
        } else {
            StoreError::Http(e)
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Timeouts, connection failures, 429 and 5xx responses are transient.
    /// GraphQL errors and other 4xx responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Timeout(_) | StoreError::Connect(_) | StoreError::RateLimited { .. } => {
                true
            }
            StoreError::Status { status, .. } => *status == 429 || *status >= 500,
            StoreError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.as_u16() == 429 || s.is_server_error())
            }
            StoreError::GraphQl(_) | StoreError::Serialization(_) | StoreError::Config(_) => false,
        }
    }

    /// Returns true if this error represents a 429 rate-limit response.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            StoreError::RateLimited { .. } => true,
            StoreError::Status { status, .. } => *status == 429,
            StoreError::Http(e) => e.status().is_some_and(|s| s.as_u16() == 429),
            _ => false,
        }
    }

    /// Returns the retry-after duration if the store asked for one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            StoreError::RateLimited { retry_after_secs } => {
                Some(Duration::from_secs(*retry_after_secs))
            }
            _ => None,
        }
    }
}
