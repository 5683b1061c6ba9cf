use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::matcher::TrackMatcher;
use crate::{
    error::{MatchError, Result},
    types::{MatchResult, QuerySong, SearchTrackResponse, TrackCollection, TrackMatch},
};

/// Catalog search used to look up candidates for a song. An empty `album`
/// means the album is left out of the query.
#[async_trait]
pub trait TrackSearcher: Send + Sync {
    async fn search_track(
        &self,
        cancel: &CancellationToken,
        artist: &str,
        title: &str,
        album: &str,
    ) -> Result<SearchTrackResponse>;
}

/// Resolves songs to catalog tracks: searches, then lets the [`TrackMatcher`]
/// choose among the results.
pub struct TrackProvider<S> {
    searcher: S,
    matcher: TrackMatcher,
}

impl<S: TrackSearcher> TrackProvider<S> {
    pub fn new(searcher: S, matcher: TrackMatcher) -> Self {
        Self { searcher, matcher }
    }

    /// Searches with the album first. Radio feeds often carry album names the
    /// catalog does not know, so an empty result is retried without the album.
    ///
    /// The outer `Result` carries transport and upstream failures; the inner one
    /// the matching outcome.
    pub async fn get_track(
        &self,
        cancel: &CancellationToken,
        song: &QuerySong,
    ) -> Result<MatchResult> {
        let mut tracks = self.search(cancel, song, &song.album).await?;

        if tracks.items.is_empty() && !song.album.is_empty() {
            info!(
                artist = %song.artist,
                title = %song.title,
                album = %song.album,
                "track not found with album query param; searching without album"
            );
            tracks = self.search(cancel, song, "").await?;
        }

        if tracks.items.is_empty() {
            return Ok(Err(MatchError::NotFound));
        }

        info!(count = tracks.items.len(), "spotify search tracks found");

        Ok(self
            .matcher
            .find_match(song, &tracks.items)
            .map(|track| TrackMatch {
                song_id: song.id.clone(),
                track_id: track.id.clone(),
                track_uri: track.uri.clone(),
            }))
    }

    async fn search(
        &self,
        cancel: &CancellationToken,
        song: &QuerySong,
        album: &str,
    ) -> Result<TrackCollection> {
        let response = self
            .searcher
            .search_track(cancel, &song.artist, &song.title, album)
            .await?;
        Ok(response.tracks)
    }
}
