//! # Spotify Integration Module
//!
//! Thin Spotify Web API client built on [`RetryingClient`]. Every request made
//! through one [`SpotifyClient`] (and its clones) shares the same client side
//! rate limit, so concurrent searches and page fetches throttle together.
//!
//! ## API Coverage
//!
//! - `GET /search` - track search by title, artist and optionally album
//!   ([`search`])
//! - `GET /playlists/{id}/tracks` - offset paginated playlist listing
//!   ([`playlists`])
//!
//! ## Rate Limits
//!
//! Spotify enforces a rolling 30 second window. The default client settings
//! stay at 175 requests per window and reserve room for 10 requests in
//! flight, see [`crate::config::client_config`].
//!
//! ## Authentication
//!
//! Requests carry a bearer token obtained elsewhere; see
//! [`crate::management::TokenManager`].

pub mod playlists;
pub mod search;

use crate::{
    error::Result,
    http::{ClientConfig, RetryingClient},
};

pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Default client side limits: Spotify's window is 30 seconds.
pub const LIMIT_WINDOW: i64 = 30;
pub const LIMIT_NUM_REQUESTS: i64 = 175;
pub const LIMIT_BATCH_SIZE: i64 = 10;

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: RetryingClient,
}

impl SpotifyClient {
    /// Creates a client sending `access_token` as bearer token on every request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`](crate::error::Error::Request) if the
    /// underlying HTTP client cannot be built from `config`.
    ///
    /// # Example
    ///
    /// ```
    /// let client = SpotifyClient::new(config::client_config()?, &token.access_token)?;
    /// ```
    pub fn new(config: ClientConfig, access_token: &str) -> Result<Self> {
        let http = RetryingClient::new(config)?.with_bearer_token(access_token);
        Ok(Self { http })
    }
}
