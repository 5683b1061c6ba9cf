use tracing::{debug, info};

use super::similarity::string_similarity;
use crate::{
    error::MatchError,
    types::{AlbumType, Artist, Candidate, QuerySong},
};

/// Minimum weighted score (percent) a candidate needs to be accepted.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 70.0;

/// Relative weight of each field in the combined score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub artist: f64,
    pub title: f64,
    pub album: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            artist: 0.35,
            title: 0.40,
            album: 0.25,
        }
    }
}

/// Per-field similarity of one candidate to the queried song, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub artist: f64,
    pub title: f64,
    pub album: f64,
}

impl MatchScore {
    pub fn score(song: &QuerySong, candidate: &Candidate) -> Self {
        Self {
            artist: artist_similarity(&song.artist, &candidate.artists),
            title: string_similarity(&song.title, &candidate.name),
            album: album_similarity(song, candidate),
        }
    }

    pub fn is_exact(&self) -> bool {
        self.artist == 100.0 && self.title == 100.0 && self.album == 100.0
    }

    pub fn weighted_average(&self, weights: &MatchWeights) -> f64 {
        self.artist * weights.artist + self.title * weights.title + self.album * weights.album
    }
}

/// Picks the catalog track that best fits a song.
#[derive(Debug, Clone, Copy)]
pub struct TrackMatcher {
    weights: MatchWeights,
    threshold: f64,
}

impl TrackMatcher {
    pub fn new(weights: MatchWeights, threshold: f64) -> Self {
        Self { weights, threshold }
    }

    /// Returns the best candidate for `song`.
    ///
    /// - no candidates: [`MatchError::NotFound`]
    /// - a single candidate is trusted as-is, without scoring
    /// - a candidate matching all three fields exactly wins immediately
    /// - otherwise the highest weighted score wins if it reaches the threshold;
    ///   on equal scores the earlier candidate is kept
    pub fn find_match<'a>(
        &self,
        song: &QuerySong,
        candidates: &'a [Candidate],
    ) -> Result<&'a Candidate, MatchError> {
        match candidates {
            [] => return Err(MatchError::NotFound),
            [only] => return Ok(only),
            _ => {}
        }

        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let score = MatchScore::score(song, candidate);
            if score.is_exact() {
                debug!(track = %candidate.name, "exact match track found");
                return Ok(candidate);
            }
            scored.push((candidate, score));
        }

        let (best, average) = self.select_best(scored)?;
        info!(
            percent = average,
            track = %best.name,
            artist = %best.artist_names(),
            "partial match track found"
        );
        Ok(best)
    }

    /// Returns the item with the highest weighted average and that average, or
    /// [`MatchError::BelowThreshold`] if it does not reach the threshold.
    pub fn select_best<T>(
        &self,
        scored: impl IntoIterator<Item = (T, MatchScore)>,
    ) -> Result<(T, f64), MatchError> {
        let mut best: Option<(T, f64)> = None;

        for (item, score) in scored {
            let average = score.weighted_average(&self.weights);
            match &best {
                Some((_, best_average)) if average <= *best_average => {}
                _ => best = Some((item, average)),
            }
        }

        match best {
            None => Err(MatchError::NotFound),
            Some((_, average)) if average < self.threshold => {
                Err(MatchError::BelowThreshold { best: average })
            }
            Some(best) => Ok(best),
        }
    }
}

impl Default for TrackMatcher {
    fn default() -> Self {
        Self::new(MatchWeights::default(), DEFAULT_MATCH_THRESHOLD)
    }
}

fn artist_similarity(artist: &str, artists: &[Artist]) -> f64 {
    // TODO: work out how the station credits features; until then the best
    // scoring credited artist stands in for all of them
    artists
        .iter()
        .map(|a| string_similarity(artist, &a.name))
        .fold(0.0, f64::max)
}

fn album_similarity(song: &QuerySong, candidate: &Candidate) -> f64 {
    // stations tend to list a single under an album name starting with its title
    if candidate.album.album_type == AlbumType::Single
        && song
            .album
            .to_lowercase()
            .starts_with(&song.title.to_lowercase())
    {
        return 100.0;
    }

    string_similarity(&song.album, &candidate.album.name)
}
