use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::SpotifyClient;
use crate::{
    error::Result,
    http::decode,
    matching::TrackSearcher,
    types::SearchTrackResponse,
};

/// Builds the search query, e.g. `track:yellow artist:coldplay album:parachutes`.
///
/// The album filter is left out when `album` is empty. Terms are not escaped
/// here; the query string encoder takes care of that.
pub fn build_query(artist: &str, title: &str, album: &str) -> String {
    let mut query = format!("track:{title} artist:{artist}");
    if !album.is_empty() {
        query.push_str(&format!(" album:{album}"));
    }
    query
}

#[async_trait]
impl TrackSearcher for SpotifyClient {
    /// Searches the catalog for tracks.
    ///
    /// Retries, throttling and backoff are handled by the underlying
    /// [`RetryingClient`](crate::http::RetryingClient); a non-2xx answer that is
    /// not retried surfaces as [`Error::Rejected`](crate::error::Error::Rejected).
    async fn search_track(
        &self,
        cancel: &CancellationToken,
        artist: &str,
        title: &str,
        album: &str,
    ) -> Result<SearchTrackResponse> {
        let query = [
            ("q", build_query(artist, title, album)),
            ("type", "track".to_string()),
        ];

        let response = self.http.get(cancel, "/search", &query).await?;
        decode::json::<SearchTrackResponse>(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query() {
        assert_eq!(
            build_query("coldplay", "yellow", "parachutes"),
            "track:yellow artist:coldplay album:parachutes"
        );
        assert_eq!(
            build_query("coldplay", "yellow", ""),
            "track:yellow artist:coldplay"
        );
    }
}
