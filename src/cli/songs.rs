use std::path::PathBuf;

use tabled::Table;

use crate::{
    error, info,
    management::SongManager,
    success,
    types::{QuerySong, Resolution, SongEntry, SongTableRow},
    utils, warning,
};

pub async fn import_songs(file: PathBuf) {
    let content = match async_fs::read_to_string(&file).await {
        Ok(c) => c,
        Err(e) => error!("Cannot read {}. Err: {}", file.display(), e),
    };

    let entries: Vec<SongEntry> = match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => error!("Invalid song file {}. Err: {}", file.display(), e),
    };

    let total = entries.len();
    let songs: Vec<QuerySong> = entries
        .iter()
        .filter(|e| !e.artist.trim().is_empty() && !e.title.trim().is_empty())
        .map(|e| QuerySong::new(&e.artist, &e.title, &e.album))
        .collect();

    let skipped = total - songs.len();
    if skipped > 0 {
        warning!("Skipped {} entries without artist or title", skipped);
    }

    let store = match SongManager::load().await {
        Ok(store) => store,
        Err(e) => error!("Cannot load songs. Err: {}", e),
    };

    let candidates = songs.len();
    let added = store.add_songs(songs).await;
    if let Err(e) = store.persist().await {
        error!("Cannot save songs. Err: {}", e);
    }

    if added < candidates {
        info!("{} songs were already known", candidates - added);
    }
    success!(
        "Imported {} new songs, {} songs stored in {}",
        added,
        store.count().await,
        store.path().display()
    );
}

pub async fn list_songs(unmatched_only: bool) {
    let store = match SongManager::load().await {
        Ok(store) => store,
        Err(e) => error!("Cannot load songs. Err: {}", e),
    };

    let records = store.all().await;
    if records.is_empty() {
        warning!("No songs stored yet. Import some with `playgen songs import <file>`.");
        return;
    }

    let mut rows: Vec<SongTableRow> = records
        .into_iter()
        .filter(|r| !unmatched_only || !matches!(r.resolution, Some(Resolution::Matched(_))))
        .map(|r| SongTableRow {
            status: status_label(r.resolution.as_ref()),
            artist: r.song.artist,
            title: r.song.title,
            album: r.song.album,
        })
        .collect();

    if rows.is_empty() {
        success!("Every song has a matching track.");
        return;
    }

    utils::sort_song_table_rows(&mut rows);
    println!("{}", Table::new(rows));
}

fn status_label(resolution: Option<&Resolution>) -> String {
    match resolution {
        None => "pending".to_string(),
        Some(Resolution::Matched(track)) => track.track_uri.clone(),
        Some(Resolution::Unmatched { reason }) => format!("unmatched ({reason})"),
    }
}
