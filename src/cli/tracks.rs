use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;
use tokio_util::sync::CancellationToken;

use crate::{error, spotify::playlists, success, types::TrackTableRow};

pub async fn playlist_tracks(cancel: CancellationToken, playlist_id: String) {
    let client = super::spotify_client().await;

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Fetching tracks of playlist {}...", playlist_id));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let tracks = match playlists::get_all_playlist_tracks(&cancel, client, &playlist_id).await {
        Ok(tracks) => tracks,
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to fetch playlist tracks. Err: {}", e);
        }
    };
    pb.finish_and_clear();

    let count = tracks.len();
    let mut rows: Vec<TrackTableRow> = tracks
        .into_iter()
        .map(|t| TrackTableRow {
            artists: t
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            name: t.name,
            uri: t.uri,
        })
        .collect();
    rows.sort_by(|a, b| a.artists.to_lowercase().cmp(&b.artists.to_lowercase()));

    println!("{}", Table::new(rows));
    success!("{} tracks in playlist {}", count, playlist_id);
}
