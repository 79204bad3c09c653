//! iPod library export
//!
//! Reads the iTunesDB and Play Counts files copied off an iPod and writes
//! the library, or one playlist, as CSV or JSON ordered by play count.

mod config;
mod export;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use itunesdb_core::{merge_play_statistics, parse_database, select_and_sort, stats, Database};

use config::{Config, OutputFormat};

#[derive(Parser)]
#[command(name = "ipod-export")]
#[command(about = "Extract music library data from iPod iTunes database files")]
#[command(version)]
struct Cli {
    /// Path to the iTunesDB file
    #[arg(long, env = "ITUNES_DB_PATH", default_value = "./iTunes/iTunesDB")]
    itunes_db: PathBuf,

    /// Path to the Play Counts file
    #[arg(long, env = "PLAY_COUNTS_PATH", default_value = "./iTunes/Play Counts")]
    play_counts: PathBuf,

    /// Directory for derived output file names
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Export this playlist instead of the full library
    #[arg(short, long)]
    playlist: Option<String>,

    /// Output file (default: ipod_music_library.<ext> or <playlist>.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List playlists and exit
    #[arg(short, long)]
    list_playlists: bool,

    /// Include the device master list when listing playlists
    #[arg(long)]
    include_master: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();

    let config = Config {
        itunes_db: cli.itunes_db,
        play_counts: cli.play_counts,
        output_dir: cli.output_dir,
        output: cli.output,
        playlist: cli.playlist,
        format: cli.format,
    };

    let db = load_library(&config)?;

    if cli.list_playlists {
        list_playlists(&db, cli.include_master);
        return Ok(());
    }

    let tracks = select_and_sort(&db, config.playlist.as_deref())?;
    match &config.playlist {
        Some(name) => info!("Exporting {} tracks from playlist '{}'", tracks.len(), name),
        None => info!("Exporting {} tracks from full library", tracks.len()),
    }

    let output_path = config.output_path();
    export::export_tracks(&tracks, &output_path, config.format)?;
    println!("Exported to: {}", output_path.display());

    print_summary(&db, config.playlist.as_deref())?;
    Ok(())
}

/// Parse the database and merge play counts if the file is there
fn load_library(config: &Config) -> anyhow::Result<Database> {
    info!("iTunesDB: {:?}", config.itunes_db);
    let data = fs::read(&config.itunes_db)
        .with_context(|| format!("Cannot read iTunesDB at {:?}", config.itunes_db))?;
    let db = parse_database(&data)
        .with_context(|| format!("Cannot parse iTunesDB at {:?}", config.itunes_db))?;

    match read_optional(&config.play_counts)? {
        Some(counts) => Ok(merge_play_statistics(db, &counts)),
        None => {
            info!("Play Counts file not found, play counts will be 0");
            Ok(db)
        }
    }
}

/// Read a file that is allowed to be missing
fn read_optional(path: &Path) -> anyhow::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => {
            debug!("Read {} bytes from {:?}", data.len(), path);
            Ok(Some(data))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Cannot read {:?}", path)),
    }
}

fn list_playlists(db: &Database, include_master: bool) {
    let shown: Vec<_> = db
        .playlists()
        .iter()
        .filter(|p| include_master || !p.is_master)
        .collect();

    println!("Found {} playlists:", shown.len());
    for playlist in shown {
        let marker = if playlist.is_master { " [master]" } else { "" };
        println!("  - {} ({} tracks){}", playlist.name, playlist.len(), marker);
    }
}

fn print_summary(db: &Database, playlist: Option<&str>) -> anyhow::Result<()> {
    let library = stats::summarize(db);
    println!();
    println!("Summary:");
    println!("  Total tracks: {}", library.total_tracks);
    println!("  Tracks with play counts: {}", library.played_tracks);
    println!(
        "  Highly rated tracks ({}+ stars): {}",
        stats::HIGH_RATING,
        library.highly_rated
    );
    println!(
        "  Total playlists: {} ({} user)",
        library.total_playlists, library.user_playlists
    );

    if let Some(name) = playlist {
        let summary = stats::summarize_playlist(db, name)?;
        println!(
            "  Playlist '{}': {} tracks, {} total plays",
            summary.name, summary.tracks, summary.total_plays
        );
        if summary.dangling > 0 {
            debug!(
                "Playlist '{}' references {} missing tracks",
                summary.name, summary.dangling
            );
        }
    }
    Ok(())
}
