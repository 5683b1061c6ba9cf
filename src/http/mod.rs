//! # HTTP Layer
//!
//! Resilient transport used by every upstream call in playgen.
//!
//! ```text
//! RetryingClient::execute
//!     ├── RateLimit        (shared circuit + sliding window, one per client)
//!     ├── Backoff          (jittered exponential wait per attempt)
//!     └── headers          (Retry-After parsing for 429 responses)
//! ```
//!
//! ## Retry policy
//!
//! | Outcome | Action |
//! | --- | --- |
//! | network error | backoff, retry |
//! | 429 Too Many Requests | open circuit for Retry-After (or backoff), retry |
//! | 5xx except 501 | backoff, retry |
//! | anything else | returned to the caller as-is |
//!
//! After `max_retries` attempts the client gives up with
//! [`Error::RetriesExhausted`](crate::error::Error::RetriesExhausted). All
//! waits race the caller's [`CancellationToken`](tokio_util::sync::CancellationToken).

pub mod backoff;
mod client;
pub mod decode;
pub mod headers;
pub mod ratelimit;

pub use backoff::Backoff;
pub use client::{ClientConfig, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, RetryingClient};
pub use ratelimit::{RateLimit, SlidingWindowCounter};
