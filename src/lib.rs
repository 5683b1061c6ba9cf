//! Radio playlist to Spotify matching library.
//!
//! playgen takes the songs a radio station announced, searches each of them in
//! the Spotify catalog and records which track (if any) it resolved to. The
//! hard parts are the plumbing around the Spotify Web API: a retrying HTTP
//! client with a shared rate limit circuit, a bounded parallel runner with
//! cancellation, and concurrent offset pagination.
//!
//! # Modules
//!
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by every layer
//! - `http` - Retrying client, backoff, rate limiting
//! - `management` - Song store and token cache
//! - `matching` - Candidate scoring and track resolution
//! - `pagination` - Concurrent offset pagination
//! - `parallel` - Bounded parallel runner
//! - `search` - Batch search orchestration
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use playgen::{config, management::SongManager, search::BatchSearch};
//!
//! #[tokio::main]
//! async fn main() -> playgen::error::Result<()> {
//!     config::load_env().await.map_err(playgen::Error::Config)?;
//!     let store = std::sync::Arc::new(SongManager::load().await?);
//!     // Build a TrackProvider and run a BatchSearch...
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod management;
pub mod matching;
pub mod pagination;
pub mod parallel;
pub mod search;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{Error, MatchError};

/// Prints a status line with a blue `o` marker.
///
/// ```
/// info!("Imported {} songs", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a status line with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red `!` line to stderr and exits with status 1.
///
/// Only for fatal errors in command handlers; library code returns
/// [`Error`] instead.
///
/// ```
/// error!("Cannot load songs. Err: {}", e);
/// // not reached
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a yellow `!` line for problems that do not stop the command.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
