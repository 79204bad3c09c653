//! itunesdb-core: read-only access to the iPod iTunesDB
//!
//! This crate decodes:
//! - iTunesDB (chunk tree of tracks, playlists and their data objects)
//! - Play Counts (per-track statistics written by the device between syncs)
//!
//! and selects and orders tracks for export.

pub mod chunk;
pub mod cursor;
pub mod data_object;
pub mod database;
pub mod error;
pub mod item;
pub mod play_counts;
pub mod playlist;
pub mod select;
pub mod stats;
pub mod string;
pub mod track;

#[cfg(test)]
mod testutil;

pub use database::{parse_database, Database};
pub use error::{Error, Result};
pub use play_counts::{merge_play_statistics, PlayCounts};
pub use playlist::Playlist;
pub use select::{select_and_sort, ExportRow};
pub use stats::{LibraryStats, PlaylistStats};
pub use track::Track;
