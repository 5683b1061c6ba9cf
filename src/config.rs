//! Configuration management for playgen.
//!
//! Values come from environment variables, optionally loaded from a `.env` file
//! in the local data directory. The configuration follows a layered approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults
//!
//! | Variable | Default |
//! | --- | --- |
//! | `SPOTIFY_API_URL` | `https://api.spotify.com/v1` |
//! | `SPOTIFY_ACCESS_TOKEN` | unset, falls back to the cached token |
//! | `PLAYGEN_MAX_RETRIES` | 3 |
//! | `PLAYGEN_MIN_BACKOFF_MS` | 100 |
//! | `PLAYGEN_MAX_BACKOFF_MS` | 2000 |
//! | `PLAYGEN_RATE_LIMIT_WINDOW` | 30 (seconds) |
//! | `PLAYGEN_RATE_LIMIT_MAX_REQUESTS` | 175 |
//! | `PLAYGEN_RATE_LIMIT_BATCH_SIZE` | 10 |
//! | `PLAYGEN_MATCH_CONCURRENCY` | 6 |
//! | `PLAYGEN_MATCH_THRESHOLD` | 70 |
//! | `PLAYGEN_WEIGHT_ARTIST` / `_TITLE` / `_ALBUM` | 0.35 / 0.40 / 0.25 |

use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    error::{Error, Result},
    http::{ClientConfig, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, backoff},
    matching::{DEFAULT_MATCH_THRESHOLD, MatchWeights},
    search::DEFAULT_MATCH_CONCURRENCY,
    spotify,
};

/// Loads environment variables from `playgen/.env` in the local data directory.
///
/// The directory is created if needed. A missing `.env` file is not an error;
/// every setting has a default or can come from the process environment.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/playgen/.env`
/// - macOS: `~/Library/Application Support/playgen/.env`
/// - Windows: `%LOCALAPPDATA%/playgen/.env`
pub async fn load_env() -> std::result::Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("playgen/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Returns an access token provided through the environment, if any.
pub fn spotify_access_token() -> Option<String> {
    env::var("SPOTIFY_ACCESS_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty())
}

/// Settings of the search pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    pub concurrency: usize,
    pub threshold: f64,
    pub weights: MatchWeights,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_MATCH_CONCURRENCY,
            threshold: DEFAULT_MATCH_THRESHOLD,
            weights: MatchWeights::default(),
        }
    }
}

/// HTTP client settings for the Spotify API, read from the environment.
pub fn client_config() -> Result<ClientConfig> {
    client_config_from(|key| env::var(key).ok())
}

/// Matching settings, read from the environment.
pub fn match_config() -> Result<MatchConfig> {
    match_config_from(|key| env::var(key).ok())
}

pub fn client_config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<ClientConfig> {
    let min_wait_ms = parse(&lookup, "PLAYGEN_MIN_BACKOFF_MS", millis(backoff::DEFAULT_MIN_WAIT))?;
    let max_wait_ms = parse(&lookup, "PLAYGEN_MAX_BACKOFF_MS", millis(backoff::DEFAULT_MAX_WAIT))?;
    if max_wait_ms < min_wait_ms {
        return Err(Error::Config(format!(
            "PLAYGEN_MAX_BACKOFF_MS ({max_wait_ms}) is lower than PLAYGEN_MIN_BACKOFF_MS ({min_wait_ms})"
        )));
    }

    let max_retries: u32 = parse(&lookup, "PLAYGEN_MAX_RETRIES", DEFAULT_MAX_RETRIES)?;
    if max_retries == 0 {
        return Err(Error::Config(
            "PLAYGEN_MAX_RETRIES must be at least 1".to_string(),
        ));
    }

    Ok(ClientConfig {
        base_url: lookup("SPOTIFY_API_URL").unwrap_or_else(|| spotify::SPOTIFY_API_URL.to_string()),
        max_retries,
        min_wait: Duration::from_millis(min_wait_ms),
        max_wait: Duration::from_millis(max_wait_ms),
        timeout: DEFAULT_TIMEOUT,
        limit_window: parse(&lookup, "PLAYGEN_RATE_LIMIT_WINDOW", spotify::LIMIT_WINDOW)?,
        limit_num_requests: parse(
            &lookup,
            "PLAYGEN_RATE_LIMIT_MAX_REQUESTS",
            spotify::LIMIT_NUM_REQUESTS,
        )?,
        limit_batch_size: parse(
            &lookup,
            "PLAYGEN_RATE_LIMIT_BATCH_SIZE",
            spotify::LIMIT_BATCH_SIZE,
        )?,
    })
}

pub fn match_config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<MatchConfig> {
    let defaults = MatchConfig::default();

    let concurrency: usize = parse(&lookup, "PLAYGEN_MATCH_CONCURRENCY", defaults.concurrency)?;
    if concurrency == 0 {
        return Err(Error::Config(
            "PLAYGEN_MATCH_CONCURRENCY must be at least 1".to_string(),
        ));
    }

    let threshold: f64 = parse(&lookup, "PLAYGEN_MATCH_THRESHOLD", defaults.threshold)?;
    if !(0.0..=100.0).contains(&threshold) {
        return Err(Error::Config(format!(
            "PLAYGEN_MATCH_THRESHOLD must be between 0 and 100, got {threshold}"
        )));
    }

    let weights = MatchWeights {
        artist: parse(&lookup, "PLAYGEN_WEIGHT_ARTIST", defaults.weights.artist)?,
        title: parse(&lookup, "PLAYGEN_WEIGHT_TITLE", defaults.weights.title)?,
        album: parse(&lookup, "PLAYGEN_WEIGHT_ALBUM", defaults.weights.album)?,
    };
    if [weights.artist, weights.title, weights.album]
        .iter()
        .any(|w| *w < 0.0)
    {
        return Err(Error::Config("match weights must not be negative".to_string()));
    }

    Ok(MatchConfig {
        concurrency,
        threshold,
        weights,
    })
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| Error::Config(format!("{key}={raw}: {e}"))),
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
