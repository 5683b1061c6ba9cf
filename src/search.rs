//! # Batch Search
//!
//! Resolves many songs against the catalog at once. Each song goes through the
//! [`TrackProvider`] on one of `concurrency` workers and its outcome is saved in
//! a [`SongStore`] before the worker moves on.
//!
//! ## Outcomes
//!
//! | Outcome | Recorded as | Batch |
//! | --- | --- | --- |
//! | acceptable track found | [`Resolution::Matched`] | continues |
//! | no track, or best below threshold | [`Resolution::Unmatched`] | continues |
//! | retries exhausted, rejected, store failure, panic | nothing | stops |
//! | caller cancelled | nothing | stops |
//!
//! A stopped batch still reports how many songs were matched and unmatched
//! before it stopped, see [`BatchError`].

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    error::{self, Result},
    matching::{TrackProvider, TrackSearcher},
    parallel,
    types::{QuerySong, Resolution},
};

/// Anything higher than this many concurrent searches starts to get throttled
/// by Spotify.
pub const DEFAULT_MATCH_CONCURRENCY: usize = 6;

/// Where songs waiting for a match come from and where results go.
///
/// Implementations are called from up to `concurrency` workers at once.
#[async_trait]
pub trait SongStore: Send + Sync {
    async fn unresolved_songs(&self) -> Result<Vec<QuerySong>>;

    async fn save_match_result(&self, song_id: &str, resolution: &Resolution) -> Result<()>;
}

/// Songs saved by one batch, split by outcome.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub matched: usize,
    pub unmatched: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.matched + self.unmatched
    }
}

/// A batch that stopped early, with what it had saved until then.
#[derive(Debug, Error)]
#[error(
    "{source} ({matched} matched, {unmatched} unmatched before stopping)",
    matched = .report.matched,
    unmatched = .report.unmatched
)]
pub struct BatchError {
    pub report: BatchReport,
    #[source]
    pub source: error::Error,
}

impl BatchError {
    pub fn is_cancelled(&self) -> bool {
        self.source.is_cancelled()
    }
}

type ProgressFn = dyn Fn(&QuerySong, &Resolution) + Send + Sync;

/// Searches Spotify for many songs concurrently and records every outcome in
/// a [`SongStore`].
///
/// # Example
///
/// ```
/// let store = Arc::new(SongManager::load().await?);
/// let provider = TrackProvider::new(spotify, TrackMatcher::default());
///
/// let report = BatchSearch::new(provider, store)
///     .with_concurrency(4)
///     .on_progress(|song, _| println!("{}", song.title))
///     .run(&CancellationToken::new())
///     .await?;
/// ```
pub struct BatchSearch<S, St: ?Sized> {
    provider: Arc<TrackProvider<S>>,
    store: Arc<St>,
    concurrency: usize,
    on_progress: Option<Arc<ProgressFn>>,
}

impl<S, St> BatchSearch<S, St>
where
    S: TrackSearcher + 'static,
    St: SongStore + ?Sized + 'static,
{
    pub fn new(provider: TrackProvider<S>, store: Arc<St>) -> Self {
        Self {
            provider: Arc::new(provider),
            store,
            concurrency: DEFAULT_MATCH_CONCURRENCY,
            on_progress: None,
        }
    }

    /// Number of songs searched at once, at least 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Called after each song's outcome has been saved.
    pub fn on_progress(
        mut self,
        callback: impl Fn(&QuerySong, &Resolution) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Resolves every song the store reports as unresolved.
    ///
    /// # Errors
    ///
    /// Same as [`resolve_all`](Self::resolve_all); failing to list the
    /// unresolved songs is reported with an empty report.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
    ) -> std::result::Result<BatchReport, BatchError> {
        let songs = self
            .store
            .unresolved_songs()
            .await
            .map_err(|source| BatchError {
                report: BatchReport::default(),
                source,
            })?;
        self.resolve_all(cancel, songs).await
    }

    /// Resolves `songs`, saving a [`Resolution`] for each.
    ///
    /// Songs without an acceptable track are saved as unmatched and counted;
    /// they never fail the batch.
    ///
    /// # Errors
    ///
    /// Any other failure (search exhausted its retries, the store failed, a
    /// worker panicked, `cancel` fired) stops the remaining songs. The returned
    /// [`BatchError`] carries that failure together with the counts of songs
    /// saved before the batch stopped.
    pub async fn resolve_all(
        &self,
        cancel: &CancellationToken,
        songs: Vec<QuerySong>,
    ) -> std::result::Result<BatchReport, BatchError> {
        let songs = Arc::new(songs);
        let matched = Arc::new(AtomicUsize::new(0));
        let unmatched = Arc::new(AtomicUsize::new(0));

        let worker = {
            let songs = Arc::clone(&songs);
            let provider = Arc::clone(&self.provider);
            let store = Arc::clone(&self.store);
            let on_progress = self.on_progress.clone();
            let matched = Arc::clone(&matched);
            let unmatched = Arc::clone(&unmatched);

            move |cancel: CancellationToken, idx: usize| {
                let songs = Arc::clone(&songs);
                let provider = Arc::clone(&provider);
                let store = Arc::clone(&store);
                let on_progress = on_progress.clone();
                let matched = Arc::clone(&matched);
                let unmatched = Arc::clone(&unmatched);

                async move {
                    let song = &songs[idx];

                    let resolution = match provider.get_track(&cancel, song).await? {
                        Ok(track) => Resolution::Matched(track),
                        Err(err) => {
                            warn!(
                                artist = %song.artist,
                                title = %song.title,
                                album = %song.album,
                                error = %err,
                                "spotify track not found for song"
                            );
                            Resolution::unmatched(&err)
                        }
                    };

                    store.save_match_result(&song.id, &resolution).await?;

                    if resolution.is_matched() {
                        matched.fetch_add(1, Ordering::Relaxed);
                    } else {
                        unmatched.fetch_add(1, Ordering::Relaxed);
                    }

                    if let Some(callback) = &on_progress {
                        callback(song, &resolution);
                    }

                    Ok(())
                }
            }
        };

        let outcome = parallel::run_all(cancel, songs.len(), self.concurrency, worker).await;

        let report = BatchReport {
            matched: matched.load(Ordering::Relaxed),
            unmatched: unmatched.load(Ordering::Relaxed),
        };

        match outcome {
            Ok(()) => Ok(report),
            Err(source) => Err(BatchError { report, source }),
        }
    }
}
