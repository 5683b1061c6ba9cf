//! # CLI Module
//!
//! User-facing commands of playgen. Each command loads what it needs (song
//! store, token, configuration), delegates to the library and reports the
//! outcome with the crate's colored status macros.
//!
//! ## Commands
//!
//! - [`import_songs`] - Adds songs from a JSON file to the local song store
//! - [`list_songs`] - Shows stored songs and how they were resolved
//! - [`search`] - Resolves every pending song against the Spotify catalog
//! - [`playlist_tracks`] - Lists every track of a Spotify playlist
//!
//! ## Error Handling
//!
//! Fatal problems (no token, broken configuration, unreadable store) end the
//! process through [`crate::error!`]. A song without a matching track is not
//! fatal; it is stored as unmatched and counted in the summary.
//!
//! ## Cancellation
//!
//! Long running commands take the [`CancellationToken`] that `main` cancels
//! on Ctrl-C. Results saved before cancellation stay in the store.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod search;
mod songs;
mod tracks;

pub use search::search;
pub use songs::{import_songs, list_songs};
pub use tracks::playlist_tracks;

use crate::{config, error, management::TokenManager, spotify::SpotifyClient};

async fn spotify_client() -> SpotifyClient {
    let token_mgr = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => error!(
            "Failed to load token. Set SPOTIFY_ACCESS_TOKEN or provide a cached token.\n Error: {}",
            e
        ),
    };

    let token = match token_mgr.get_valid_token() {
        Ok(token) => token,
        Err(e) => error!("{}", e),
    };

    let client_config = match config::client_config() {
        Ok(cfg) => cfg,
        Err(e) => error!("{}", e),
    };

    match SpotifyClient::new(client_config, token) {
        Ok(client) => client,
        Err(e) => error!("Cannot create Spotify client. Err: {}", e),
    }
}
