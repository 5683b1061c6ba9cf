use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use playgen::{cli, config, error, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage the songs waiting to be matched
    #[command(subcommand)]
    Songs(SongsCommand),

    /// Search Spotify for every song without a result yet
    Search,

    /// List every track of a Spotify playlist
    Tracks(TracksOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Subcommand, Debug, Clone)]
pub enum SongsCommand {
    /// Import songs from a JSON array of {artist, title, album} objects
    Import(ImportOptions),

    /// List stored songs and their match status
    List(ListOptions),
}

#[derive(Parser, Debug, Clone)]
pub struct ImportOptions {
    /// Path to the JSON file
    pub file: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct ListOptions {
    /// Only show songs without a matching track
    #[clap(long)]
    pub unmatched: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TracksOptions {
    /// Spotify playlist id
    pub playlist_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warning!("Interrupted, stopping...");
            on_signal.cancel();
        }
    });

    match cli.command {
        Command::Songs(SongsCommand::Import(opt)) => cli::import_songs(opt.file).await,
        Command::Songs(SongsCommand::List(opt)) => cli::list_songs(opt.unmatched).await,
        Command::Search => cli::search(cancel).await,
        Command::Tracks(opt) => cli::playlist_tracks(cancel, opt.playlist_id).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
