use std::{sync::Arc, time::Duration};

use reqwest::{Client, Request, Response, StatusCode, Url};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{
    backoff::{Backoff, DEFAULT_MAX_WAIT, DEFAULT_MIN_WAIT},
    headers,
    ratelimit::RateLimit,
};
use crate::error::{Error, Result};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for a [`RetryingClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub max_retries: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
    pub timeout: Duration,
    /// Client side window in seconds; zero disables the window.
    pub limit_window: i64,
    /// Maximum requests per window; zero disables client side limiting.
    pub limit_num_requests: i64,
    /// Requests assumed in flight on top of the observed count. Set this when
    /// requests are issued in concurrent batches.
    pub limit_batch_size: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            min_wait: DEFAULT_MIN_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
            timeout: DEFAULT_TIMEOUT,
            limit_window: 0,
            limit_num_requests: 0,
            limit_batch_size: 0,
        }
    }
}

/// HTTP client that retries transient failures and coordinates all of its
/// requests through one shared [`RateLimit`].
///
/// Clones share the same connection pool and the same rate limit.
#[derive(Debug, Clone)]
pub struct RetryingClient {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
    max_retries: u32,
    backoff: Backoff,
    rate_limit: Arc<RateLimit>,
}

impl RetryingClient {
    /// Builds a client from `config`.
    ///
    /// Client side rate limiting is only set up when
    /// `config.limit_num_requests` is positive; otherwise the circuit is only
    /// opened by 429 responses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] if the underlying `reqwest` client cannot be
    /// built.
    ///
    /// # Example
    ///
    /// ```
    /// let client = RetryingClient::new(ClientConfig {
    ///     base_url: "https://api.spotify.com/v1".to_string(),
    ///     ..Default::default()
    /// })?
    /// .with_bearer_token(token);
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Request(e.to_string()))?;

        let rate_limit = if config.limit_num_requests > 0 {
            RateLimit::with_client_limits(
                config.limit_window,
                config.limit_num_requests,
                config.limit_batch_size,
            )
        } else {
            RateLimit::new()
        };

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: None,
            max_retries: config.max_retries.max(1),
            backoff: Backoff::new(config.min_wait, config.max_wait),
            rate_limit: Arc::new(rate_limit),
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn rate_limit(&self) -> &RateLimit {
        &self.rate_limit
    }

    /// Joins `endpoint` onto the base URL.
    pub fn url(&self, endpoint: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| Error::Request(format!("{raw}: {e}")))
    }

    /// Sends a GET request for `endpoint` relative to the base URL.
    ///
    /// # Arguments
    ///
    /// * `cancel` - aborts the request and any pending retry wait
    /// * `endpoint` - path below the base URL, with or without leading `/`
    /// * `query` - query parameters, encoded by `reqwest`
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute), plus [`Error::Request`] if the URL
    /// cannot be built.
    ///
    /// # Example
    ///
    /// ```
    /// let query = [("q", "track:yellow".to_string()), ("type", "track".to_string())];
    /// let response = client.get(&cancel, "/search", &query).await?;
    /// ```
    pub async fn get(
        &self,
        cancel: &CancellationToken,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Response> {
        let mut builder = self.client.get(self.url(endpoint)?).query(query);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let request = builder.build().map_err(|e| Error::Request(e.to_string()))?;
        self.execute(cancel, request).await
    }

    /// Sends `request`, retrying network failures, 429 and 5xx (except 501)
    /// responses up to `max_retries` attempts in total.
    ///
    /// Every other response, successful or not, is returned untouched. A 429
    /// opens the shared circuit so concurrent callers back off together.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] as soon as `cancel` fires, also while waiting
    /// - [`Error::RetriesExhausted`] with the last transient cause when every
    ///   attempt failed
    /// - [`Error::Request`] if `request` has a body that cannot be cloned
    pub async fn execute(&self, cancel: &CancellationToken, request: Request) -> Result<Response> {
        let mut last: Option<Error> = None;

        for attempt in 0..self.max_retries {
            if let Some(open_for) = self.rate_limit.open_for() {
                debug!(
                    attempt,
                    open_ms = open_for.as_millis() as u64,
                    "waiting for client circuit to close"
                );
                self.rate_limit.wait_until_open(cancel).await?;
            }

            let attempt_request = request
                .try_clone()
                .ok_or_else(|| Error::Request("request body cannot be cloned".to_string()))?;

            let wait = self.backoff.wait(attempt);
            self.rate_limit.increment();

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                result = self.client.execute(attempt_request) => result,
            };

            let response = match result {
                Ok(response) => response,
                Err(err) => {
                    warn!(error = %err, attempt, "http request failed with network error");
                    last = Some(Error::Network(err));
                    sleep(cancel, wait).await?;
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = headers::retry_after(response.headers()).unwrap_or(wait);
                drop(response);

                warn!(
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    request_count = self.rate_limit.count(),
                    "http request failed with too many requests"
                );
                self.rate_limit.set_limited(wait);
                last = Some(Error::Throttled);
                sleep(cancel, wait).await?;
                continue;
            }

            if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
                drop(response);

                warn!(
                    attempt,
                    status = status.as_u16(),
                    wait_ms = wait.as_millis() as u64,
                    "http request failed with server error"
                );
                last = Some(Error::ServerError(status));
                sleep(cancel, wait).await?;
                continue;
            }

            return Ok(response);
        }

        Err(Error::RetriesExhausted {
            attempts: self.max_retries,
            last: last.map(Box::new),
        })
    }
}

async fn sleep(cancel: &CancellationToken, duration: Duration) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
