//! Export configuration

use std::path::{Path, PathBuf};

use clap::ValueEnum;

/// Default output name when exporting the whole library
pub const LIBRARY_FILE_STEM: &str = "ipod_music_library";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// iTunesDB file
    pub itunes_db: PathBuf,
    /// Play Counts file, may be missing
    pub play_counts: PathBuf,
    /// Directory for derived output paths
    pub output_dir: PathBuf,
    /// Explicit output path, overrides the derived one
    pub output: Option<PathBuf>,
    /// Export this playlist instead of the full library
    pub playlist: Option<String>,
    pub format: OutputFormat,
}

impl Config {
    /// Where the export goes: the explicit path if given, otherwise a file
    /// named after the playlist (or the library) in the output directory
    pub fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.output {
            return path.clone();
        }
        let stem = match &self.playlist {
            Some(name) => sanitize_playlist_name(name),
            None => LIBRARY_FILE_STEM.to_string(),
        };
        derived_path(&self.output_dir, &stem, self.format)
    }
}

fn derived_path(dir: &Path, stem: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}.{}", stem, format.extension()))
}

/// File-system friendly form of a playlist name
///
/// Keeps alphanumerics, spaces, `-` and `_`, drops trailing whitespace,
/// turns spaces into underscores and lowercases the result.
pub fn sanitize_playlist_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().replace(' ', "_").to_lowercase()
}
