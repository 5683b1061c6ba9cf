//! Error types shared by the HTTP layer, the orchestration helpers and the
//! search pipeline.
//!
//! Transient failures (`Network`, `Throttled`, `ServerError`) are retried by
//! [`crate::http::RetryingClient`] and only surface wrapped inside
//! [`Error::RetriesExhausted`]. Domain outcomes of matching ("no track found",
//! "best candidate too weak") are not errors at all, see [`MatchError`].

use reqwest::StatusCode;
use thiserror::Error;

/// Crate-wide result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection level failure while talking to the upstream API.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Upstream answered `429 Too Many Requests`.
    #[error("upstream throttled the request")]
    Throttled,

    /// Upstream answered with a retryable 5xx status.
    #[error("upstream server error: {0}")]
    ServerError(StatusCode),

    /// Upstream answered with a status that is never retried.
    #[error("http request failed with {status} status: {body}")]
    Rejected { status: StatusCode, body: String },

    /// Every attempt failed with a transient error.
    #[error("http request failed after max retries {attempts}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Option<Box<Error>>,
    },

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("invalid request: {0}")]
    Request(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("authentication error: {0}")]
    Auth(String),

    /// A worker failed in a way nobody planned for, typically a panic.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Non-fatal outcome of matching a song against catalog search results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("track not found")]
    NotFound,

    #[error("match below threshold (best score {best:.2})")]
    BelowThreshold { best: f64 },
}
