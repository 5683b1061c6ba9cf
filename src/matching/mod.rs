//! # Track Matching
//!
//! Radio station metadata is loose: featured artists are spelled differently,
//! album names are missing or refer to a compilation, singles are filed under
//! their title. Catalog searches therefore return several plausible tracks and
//! this module decides which one, if any, is the song that was played.
//!
//! ## Scoring
//!
//! Each candidate gets three Levenshtein based similarities (artist, title and
//! album, in percent) combined into one weighted score:
//!
//! ```text
//! score = 0.35 * artist + 0.40 * title + 0.25 * album
//! ```
//!
//! The best score must reach the threshold (70 by default). A candidate matching
//! all three fields exactly is taken right away, and a search returning a single
//! track is trusted without scoring.
//!
//! ## Components
//!
//! - [`similarity`] - case-insensitive Levenshtein similarity
//! - [`matcher`] - candidate scoring and selection
//! - [`provider`] - search (with album, then without) followed by matching

pub mod matcher;
pub mod provider;
pub mod similarity;

pub use matcher::{DEFAULT_MATCH_THRESHOLD, MatchScore, MatchWeights, TrackMatcher};
pub use provider::{TrackProvider, TrackSearcher};
pub use similarity::string_similarity;
