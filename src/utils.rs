use std::cmp::Ordering;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

use crate::types::SongTableRow;

/// Case-folds and collapses whitespace so the same song announced twice with
/// different spelling of spaces or case compares equal.
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn song_hash(artist: &str, title: &str, album: &str) -> String {
    let key = format!(
        "{}|{}|{}",
        normalize(artist),
        normalize(title),
        normalize(album)
    );
    let hash = Sha256::digest(key.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn sort_song_table_rows(rows: &mut Vec<SongTableRow>) {
    rows.sort_by(|a, b| {
        match a.artist.cmp(&b.artist) {
            Ordering::Equal => a.title.cmp(&b.title), // secondary sort: title ascending
            other => other,
        }
    });
}
