use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use playgen::{
    Error,
    error::Result,
    management::SongManager,
    matching::{TrackMatcher, TrackProvider, TrackSearcher},
    search::{BatchError, BatchReport, BatchSearch, SongStore},
    types::{
        Album, AlbumType, Artist, Candidate, QuerySong, Resolution, SearchTrackResponse,
        TrackCollection,
    },
};
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

/// Finds a track for every title except "unknown". "obscure" only has poor
/// candidates, "broken" fails and "explode" panics.
struct CatalogSearcher;

fn candidate(id: &str, name: &str, artist: &str, album: &str) -> Candidate {
    Candidate {
        id: id.to_string(),
        uri: format!("spotify:track:{id}"),
        name: name.to_string(),
        album: Album {
            id: String::new(),
            name: album.to_string(),
            album_type: AlbumType::Album,
        },
        artists: vec![Artist {
            id: String::new(),
            name: artist.to_string(),
        }],
    }
}

#[async_trait]
impl TrackSearcher for CatalogSearcher {
    async fn search_track(
        &self,
        _cancel: &CancellationToken,
        artist: &str,
        title: &str,
        album: &str,
    ) -> Result<SearchTrackResponse> {
        if title == "broken" {
            return Err(Error::RetriesExhausted {
                attempts: 3,
                last: Some(Box::new(Error::ServerError(StatusCode::BAD_GATEWAY))),
            });
        }

        if title == "explode" {
            panic!("search backend exploded");
        }

        let items = if title.starts_with("unknown") {
            Vec::new()
        } else if title == "obscure" {
            vec![
                candidate("x1", "Nothing Alike", "Nobody Else", "Far Away"),
                candidate("x2", "Wrong Tune", "Another Band", "Elsewhere"),
            ]
        } else {
            vec![candidate(&format!("{title}-id"), title, artist, album)]
        };

        Ok(SearchTrackResponse {
            tracks: TrackCollection {
                total: items.len(),
                items,
            },
        })
    }
}

#[derive(Default)]
struct MemoryStore {
    songs: Vec<QuerySong>,
    saved: Mutex<HashMap<String, Resolution>>,
    fail_for: Option<String>,
}

#[async_trait]
impl SongStore for MemoryStore {
    async fn unresolved_songs(&self) -> Result<Vec<QuerySong>> {
        let saved = self.saved.lock().unwrap();
        Ok(self
            .songs
            .iter()
            .filter(|s| !saved.contains_key(&s.id))
            .cloned()
            .collect())
    }

    async fn save_match_result(&self, song_id: &str, resolution: &Resolution) -> Result<()> {
        if self.fail_for.as_deref() == Some(song_id) {
            return Err(Error::Storage("disk full".to_string()));
        }
        self.saved
            .lock()
            .unwrap()
            .insert(song_id.to_string(), resolution.clone());
        Ok(())
    }
}

fn songs(titles: &[&str]) -> Vec<QuerySong> {
    titles
        .iter()
        .map(|title| QuerySong::new("Some Artist", title, "Some Album"))
        .collect()
}

fn provider() -> TrackProvider<CatalogSearcher> {
    TrackProvider::new(CatalogSearcher, TrackMatcher::default())
}

#[tokio::test]
async fn test_batch_records_every_outcome() {
    let store = Arc::new(MemoryStore {
        songs: songs(&["first", "second", "unknown one", "third", "unknown two"]),
        ..Default::default()
    });
    let progress = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&progress);

    let report = BatchSearch::new(provider(), Arc::clone(&store))
        .with_concurrency(2)
        .on_progress(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.matched, 3);
    assert_eq!(report.unmatched, 2);
    assert_eq!(report.total(), 5);
    assert_eq!(progress.load(Ordering::SeqCst), 5);

    let saved = store.saved.lock().unwrap();
    assert_eq!(saved.len(), 5);

    let first = &store.songs[0];
    match &saved[&first.id] {
        Resolution::Matched(track) => {
            assert_eq!(track.song_id, first.id);
            assert_eq!(track.track_id, "first-id");
        }
        other => panic!("expected a match, got {other:?}"),
    }

    let unknown = &store.songs[2];
    assert_eq!(
        saved[&unknown.id],
        Resolution::Unmatched {
            reason: "track not found".to_string()
        }
    );
}

#[tokio::test]
async fn test_batch_skips_resolved_songs() {
    let store = Arc::new(MemoryStore {
        songs: songs(&["first", "second"]),
        ..Default::default()
    });
    let batch = BatchSearch::new(provider(), Arc::clone(&store));

    let first = batch.run(&CancellationToken::new()).await.unwrap();
    let second = batch.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(first.matched, 2);
    assert_eq!(second.total(), 0);
}

#[tokio::test]
async fn test_batch_search_failure_aborts() {
    let store = Arc::new(MemoryStore {
        songs: songs(&["first", "broken", "second"]),
        ..Default::default()
    });

    let result = BatchSearch::new(provider(), Arc::clone(&store))
        .with_concurrency(1)
        .run(&CancellationToken::new())
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err.source, Error::RetriesExhausted { .. }));
    assert_eq!(err.report.matched, 1);
    // the broken song is never recorded as unmatched
    let broken = &store.songs[1];
    assert!(!store.saved.lock().unwrap().contains_key(&broken.id));
}

#[tokio::test]
async fn test_batch_store_failure_aborts() {
    let songs = songs(&["first", "second", "third"]);
    let store = Arc::new(MemoryStore {
        fail_for: Some(songs[1].id.clone()),
        songs,
        ..Default::default()
    });

    let result = BatchSearch::new(provider(), store)
        .run(&CancellationToken::new())
        .await;

    match result {
        Err(BatchError {
            source: Error::Storage(msg),
            ..
        }) => assert_eq!(msg, "disk full"),
        other => panic!("expected Storage, got {other:?}"),
    }
}

#[tokio::test]
async fn test_batch_failure_keeps_partial_report() {
    let songs = songs(&["unknown a", "unknown b", "unknown c", "unknown d"]);
    let store = Arc::new(MemoryStore {
        fail_for: Some(songs[2].id.clone()),
        songs,
        ..Default::default()
    });

    let err = BatchSearch::new(provider(), Arc::clone(&store))
        .with_concurrency(1)
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err.source, Error::Storage(_)));
    assert!(!err.is_cancelled());
    assert_eq!(
        err.report,
        BatchReport {
            matched: 0,
            unmatched: 2
        }
    );
    assert!(err.to_string().contains("0 matched, 2 unmatched"));
    assert_eq!(store.saved.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_batch_below_threshold_is_unmatched() {
    let store = Arc::new(MemoryStore {
        songs: songs(&["first", "obscure", "second"]),
        ..Default::default()
    });

    let report = BatchSearch::new(provider(), Arc::clone(&store))
        .with_concurrency(1)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.matched, 2);
    assert_eq!(report.unmatched, 1);

    let saved = store.saved.lock().unwrap();
    let obscure = &store.songs[1];
    match &saved[&obscure.id] {
        Resolution::Unmatched { reason } => {
            assert!(reason.starts_with("match below threshold"), "{reason}")
        }
        other => panic!("expected unmatched, got {other:?}"),
    }
}

#[tokio::test]
async fn test_batch_worker_panic_stops_batch() {
    let mut titles = vec!["explode".to_string()];
    titles.extend((0..20).map(|n| format!("song {n}")));
    let titles: Vec<&str> = titles.iter().map(String::as_str).collect();
    let store = Arc::new(MemoryStore {
        songs: songs(&titles),
        ..Default::default()
    });

    let err = BatchSearch::new(provider(), Arc::clone(&store))
        .with_concurrency(1)
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    match &err.source {
        Error::Unexpected(msg) => assert!(msg.contains("search backend exploded"), "{msg}"),
        other => panic!("expected Unexpected, got {other:?}"),
    }
    assert_eq!(err.report, BatchReport::default());
    assert!(store.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_cancelled_before_start() {
    let store = Arc::new(MemoryStore {
        songs: songs(&["first", "second"]),
        ..Default::default()
    });
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = BatchSearch::new(provider(), Arc::clone(&store))
        .run(&cancel)
        .await;

    let err = result.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.report, BatchReport::default());
    assert!(store.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_with_song_manager() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("songs.json");

    let store = Arc::new(SongManager::load_from(path.clone()).await.unwrap());
    store.add_songs(songs(&["first", "unknown"])).await;

    let report = BatchSearch::new(provider(), Arc::clone(&store))
        .run(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.matched, 1);
    assert_eq!(report.unmatched, 1);

    // every outcome is already on disk
    let reloaded = SongManager::load_from(path).await.unwrap();
    assert!(reloaded.unresolved_songs().await.unwrap().is_empty());
    assert!(reloaded.all().await.iter().all(|r| r.resolution.is_some()));
}
