use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::{
    config, error, info,
    management::SongManager,
    matching::{TrackMatcher, TrackProvider},
    search::{BatchSearch, SongStore},
    success, warning,
};

pub async fn search(cancel: CancellationToken) {
    let store = match SongManager::load().await {
        Ok(store) => Arc::new(store),
        Err(e) => error!("Cannot load songs. Err: {}", e),
    };

    let pending = match store.unresolved_songs().await {
        Ok(songs) => songs,
        Err(e) => error!("Cannot load songs. Err: {}", e),
    };

    if pending.is_empty() {
        success!("Nothing to search, every song is resolved.");
        return;
    }

    let match_config = match config::match_config() {
        Ok(cfg) => cfg,
        Err(e) => error!("{}", e),
    };

    let client = super::spotify_client().await;
    let provider = TrackProvider::new(
        client,
        TrackMatcher::new(match_config.weights, match_config.threshold),
    );

    info!("Searching Spotify for {} songs", pending.len());

    let pb = ProgressBar::new(pending.len() as u64);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} [{bar:30.blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let progress = pb.clone();
    let batch = BatchSearch::new(provider, Arc::clone(&store))
        .with_concurrency(match_config.concurrency)
        .on_progress(move |song, _| {
            progress.set_message(format!("{} - {}", song.artist, song.title));
            progress.inc(1);
        });

    match batch.resolve_all(&cancel, pending).await {
        Ok(report) => {
            pb.finish_and_clear();
            success!("Matched {} of {} songs", report.matched, report.total());
            if report.unmatched > 0 {
                warning!(
                    "{} songs without a match, see `playgen songs list --unmatched`",
                    report.unmatched
                );
            }
        }
        Err(e) => {
            if e.is_cancelled() {
                pb.abandon();
            } else {
                pb.finish_and_clear();
            }
            info!(
                "Saved {} matched and {} unmatched songs before stopping",
                e.report.matched, e.report.unmatched
            );
            if e.is_cancelled() {
                warning!("Search cancelled. Run `playgen search` again to resume.");
            } else {
                error!("Search failed. Err: {}", e.source);
            }
        }
    }
}
