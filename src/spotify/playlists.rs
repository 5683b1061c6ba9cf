use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::SpotifyClient;
use crate::{
    error::Result,
    http::decode,
    pagination::{self, DEFAULT_PAGE_CONCURRENCY, MAX_PAGE_SIZE, Page},
    types::{PlaylistTrackItem, SimpleTrack},
};

/// One page of a playlist's tracks.
#[async_trait]
pub trait PlaylistTrackGetter: Send + Sync {
    async fn get_playlist_tracks(
        &self,
        cancel: &CancellationToken,
        playlist_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Page<SimpleTrack>>;
}

#[async_trait]
impl PlaylistTrackGetter for SpotifyClient {
    async fn get_playlist_tracks(
        &self,
        cancel: &CancellationToken,
        playlist_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Page<SimpleTrack>> {
        let endpoint = format!("/playlists/{playlist_id}/tracks");
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];

        let response = self.http.get(cancel, &endpoint, &query).await?;
        let page = decode::json::<Page<PlaylistTrackItem>>(response).await?;

        Ok(Page {
            total: page.total,
            items: page.items.into_iter().filter_map(|item| item.track).collect(),
        })
    }
}

/// Loads every track of a playlist, fetching pages concurrently.
///
/// The order of the returned tracks is not the playlist order. Entries without
/// a track (local files, removed tracks) are left out.
///
/// # Arguments
///
/// * `cancel` - stops the outstanding page requests
/// * `getter` - page source, usually a [`SpotifyClient`]
/// * `playlist_id` - Spotify playlist id, not the full URI
///
/// # Errors
///
/// Fails with the first page error; no partial listing is returned.
///
/// # Example
///
/// ```
/// let tracks = get_all_playlist_tracks(&cancel, client, "37i9dQZF1DXcBWIGoYBM5M").await?;
/// println!("{} tracks", tracks.len());
/// ```
pub async fn get_all_playlist_tracks<G>(
    cancel: &CancellationToken,
    getter: G,
    playlist_id: &str,
) -> Result<Vec<SimpleTrack>>
where
    G: PlaylistTrackGetter + Clone + 'static,
{
    let playlist_id = playlist_id.to_string();

    pagination::get_all(
        cancel,
        MAX_PAGE_SIZE,
        DEFAULT_PAGE_CONCURRENCY,
        move |cancel, limit, offset| {
            let getter = getter.clone();
            let playlist_id = playlist_id.clone();
            async move {
                getter
                    .get_playlist_tracks(&cancel, &playlist_id, limit, offset)
                    .await
            }
        },
    )
    .await
}
