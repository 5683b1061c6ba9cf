use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::{error::MatchError, utils};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

/// A song announced by the radio station, waiting to be found on Spotify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySong {
    pub id: String,
    pub artist: String,
    pub title: String,
    pub album: String,
}

impl QuerySong {
    /// Builds a song with normalized fields and its stable hash as id.
    pub fn new(artist: &str, title: &str, album: &str) -> Self {
        let artist = utils::normalize(artist);
        let title = utils::normalize(title);
        let album = utils::normalize(album);

        Self {
            id: utils::song_hash(&artist, &title, &album),
            artist,
            title,
            album,
        }
    }
}

/// Raw song entry as found in an import file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongEntry {
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub album: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlbumType {
    Album,
    Single,
    Compilation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub album_type: AlbumType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

/// One track returned by a catalog search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub album: Album,
    pub artists: Vec<Artist>,
}

impl Candidate {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchTrackResponse {
    pub tracks: TrackCollection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackCollection {
    pub total: usize,
    pub items: Vec<Candidate>,
}

/// A song resolved to a Spotify track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMatch {
    pub song_id: String,
    pub track_id: String,
    pub track_uri: String,
}

/// A resolved track, or why none was accepted.
pub type MatchResult = Result<TrackMatch, MatchError>;

/// Outcome of searching one song, as recorded by the song store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Matched(TrackMatch),
    Unmatched { reason: String },
}

impl Resolution {
    pub fn unmatched(err: &MatchError) -> Self {
        Resolution::Unmatched {
            reason: err.to_string(),
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Resolution::Matched(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleTrack {
    pub id: String,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrackItem {
    /// Missing for local files and tracks removed from the catalog.
    pub track: Option<SimpleTrack>,
}

#[derive(Tabled)]
pub struct SongTableRow {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub status: String,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub name: String,
    pub artists: String,
    pub uri: String,
}
