//! Library and playlist summaries
//!
//! Counts reported after an export:
//! - tracks in the library, and how many have been played at least once
//! - tracks rated [`HIGH_RATING`] stars or more
//! - playlists, with and without the master list
//! - per playlist: resolved entries, missing references and total plays

use serde::Serialize;

use crate::database::Database;
use crate::error::Result;

/// Star rating counted as "highly rated"
pub const HIGH_RATING: u8 = 4;

/// Statistics about a parsed library
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    pub total_tracks: usize,
    pub played_tracks: usize,
    pub highly_rated: usize,
    pub total_plays: u64,
    pub total_playlists: usize,
    pub user_playlists: usize,
}

/// Statistics about one playlist
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistStats {
    pub name: String,
    /// Entries that resolve to a track, duplicates included
    pub tracks: usize,
    /// References to track ids that are not in the library
    pub dangling: usize,
    pub total_plays: u64,
}

pub fn summarize(db: &Database) -> LibraryStats {
    let mut stats = LibraryStats {
        total_tracks: db.track_count(),
        total_playlists: db.playlist_count(),
        user_playlists: db.user_playlists().count(),
        ..Default::default()
    };

    for track in db.tracks() {
        if track.play_count > 0 {
            stats.played_tracks += 1;
        }
        if track.rating >= HIGH_RATING {
            stats.highly_rated += 1;
        }
        stats.total_plays += u64::from(track.play_count);
    }

    stats
}

pub fn summarize_playlist(db: &Database, name: &str) -> Result<PlaylistStats> {
    let playlist = db.require_playlist(name)?;

    let mut stats = PlaylistStats {
        name: playlist.name.clone(),
        ..Default::default()
    };
    for id in &playlist.track_ids {
        match db.track(*id) {
            Some(track) => {
                stats.tracks += 1;
                stats.total_plays += u64::from(track.play_count);
            }
            None => stats.dangling += 1,
        }
    }

    Ok(stats)
}
