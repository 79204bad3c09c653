//! Track selection and export ordering

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::Database;
use crate::error::Result;
use crate::playlist::Playlist;
use crate::track::Track;

/// Pick the tracks to export and order them
///
/// With no playlist name every track is selected. Otherwise the first
/// playlist whose name matches exactly (case-sensitive) supplies the tracks,
/// in stored order; references to missing track ids are dropped. The result
/// is sorted by [`compare_for_export`].
pub fn select_and_sort<'a>(db: &'a Database, playlist: Option<&str>) -> Result<Vec<&'a Track>> {
    let mut tracks: Vec<&Track> = match playlist {
        None => db.tracks().iter().collect(),
        Some(name) => playlist_tracks(db, db.require_playlist(name)?),
    };

    sort_tracks(&mut tracks);
    Ok(tracks)
}

/// Resolve a playlist's references, keeping duplicates and skipping ids that
/// match no track
pub fn playlist_tracks<'a>(db: &'a Database, playlist: &Playlist) -> Vec<&'a Track> {
    let mut dangling = 0usize;
    let tracks: Vec<&Track> = playlist
        .track_ids
        .iter()
        .filter_map(|id| {
            let track = db.track(*id);
            if track.is_none() {
                dangling += 1;
            }
            track
        })
        .collect();

    if dangling > 0 {
        debug!(
            "Playlist '{}': dropped {} references to missing tracks",
            playlist.name, dangling
        );
    }
    tracks
}

/// Most played first, then highest rated, then title by byte order
pub fn compare_for_export(a: &Track, b: &Track) -> Ordering {
    b.play_count
        .cmp(&a.play_count)
        .then_with(|| b.rating.cmp(&a.rating))
        .then_with(|| a.title.as_bytes().cmp(b.title.as_bytes()))
}

/// Stable sort; equal keys keep their selection order
pub fn sort_tracks(tracks: &mut [&Track]) {
    tracks.sort_by(|a, b| compare_for_export(a, b));
}

/// One exported row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Artist")]
    pub artist: String,
    #[serde(rename = "Album")]
    pub album: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Genre")]
    pub genre: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<u32>,
    #[serde(rename = "Rating")]
    pub rating: u8,
    #[serde(rename = "Play Count")]
    pub play_count: u32,
}

impl ExportRow {
    pub const HEADERS: [&'static str; 7] = [
        "Artist",
        "Album",
        "Title",
        "Genre",
        "Year",
        "Rating",
        "Play Count",
    ];
}

impl From<&Track> for ExportRow {
    fn from(track: &Track) -> Self {
        Self {
            artist: track.artist.clone(),
            album: track.album.clone(),
            title: track.title.clone(),
            genre: track.genre.clone(),
            year: track.year,
            rating: track.rating,
            play_count: track.play_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::parse_database;
    use crate::error::Error;
    use crate::play_counts::merge_play_statistics;
    use crate::testutil::*;

    fn track(id: u32, title: &str, plays: u32, rating: u8) -> Track {
        Track {
            play_count: plays,
            rating,
            ..Track::new(id, title)
        }
    }

    fn db_of(tracks: Vec<Track>, playlists: Vec<Playlist>) -> Database {
        let mut db = Database::new();
        for t in tracks {
            db.add_track(t);
        }
        for p in playlists {
            db.add_playlist(p);
        }
        db
    }

    fn titles(tracks: &[&Track]) -> Vec<String> {
        tracks.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_full_library_ordering() {
        let db = db_of(
            vec![
                track(1, "A", 5, 3),
                track(2, "B", 5, 4),
                track(3, "C", 2, 5),
            ],
            vec![],
        );
        let sorted = select_and_sort(&db, None).unwrap();
        assert_eq!(titles(&sorted), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_equal_plays_and_rating_order_by_title() {
        let db = db_of(
            vec![
                track(1, "Zeta", 10, 5),
                track(2, "Alpha", 10, 5),
                track(3, "Beta", 1, 0),
            ],
            vec![],
        );
        let ids: Vec<u32> = select_and_sort(&db, None)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_title_breaks_ties_by_byte_order() {
        let db = db_of(
            vec![
                track(1, "beta", 0, 0),
                track(2, "Zulu", 0, 0),
                track(3, "alpha", 0, 0),
                track(4, "Échelle", 0, 0),
            ],
            vec![],
        );
        let sorted = select_and_sort(&db, None).unwrap();
        assert_eq!(titles(&sorted), vec!["Zulu", "alpha", "beta", "Échelle"]);
    }

    #[test]
    fn test_equal_keys_keep_selection_order() {
        let db = db_of(
            vec![track(1, "Same", 1, 1), track(2, "Same", 1, 1), track(3, "Same", 1, 1)],
            vec![Playlist::new("Mix", vec![3, 1, 2])],
        );
        let ids: Vec<u32> = select_and_sort(&db, Some("Mix"))
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_playlist_drops_dangling_refs() {
        let db = db_of(
            vec![track(1, "One", 0, 0), track(2, "Two", 0, 0)],
            vec![Playlist::new("Mix", vec![2, 77, 1, 2])],
        );
        let found = db.playlist("Mix").unwrap();
        let ids: Vec<u32> = playlist_tracks(&db, found).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1, 2]);
        assert_eq!(select_and_sort(&db, Some("Mix")).unwrap().len(), 3);
    }

    #[test]
    fn test_playlist_not_found_lists_names() {
        let db = db_of(
            vec![track(1, "One", 0, 0)],
            vec![Playlist::new("Chill", vec![1]), Playlist::new("Gym", vec![])],
        );
        match select_and_sort(&db, Some("chill")) {
            Err(Error::PlaylistNotFound { name, available }) => {
                assert_eq!(name, "chill");
                assert_eq!(available, vec!["Chill", "Gym"]);
            }
            other => panic!("expected PlaylistNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_playlist_selects_nothing() {
        let db = db_of(vec![track(1, "One", 0, 0)], vec![Playlist::new("Empty", vec![])]);
        assert!(select_and_sort(&db, Some("Empty")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_merge_select() {
        let tracks = vec![
            TrackFixture::new(1, "Quiet").rating(5).build(),
            TrackFixture::new(2, "Loud").rating(1).build(),
            TrackFixture::new(3, "Never").rating(3).build(),
        ];
        let playlists = vec![
            playlist_chunk("iPod", true, &[1, 2, 3]),
            playlist_chunk("Picks", false, &[3, 2]),
        ];
        let data = database(&[tracks_dataset(&tracks), playlists_dataset(&playlists)]);
        let db = merge_play_statistics(parse_database(&data).unwrap(), &play_counts(&[2, 9], 0x10));

        assert_eq!(
            titles(&select_and_sort(&db, None).unwrap()),
            vec!["Loud", "Quiet", "Never"]
        );
        assert_eq!(
            titles(&select_and_sort(&db, Some("Picks")).unwrap()),
            vec!["Loud", "Never"]
        );
    }

    #[test]
    fn test_export_row() {
        let mut t = track(1, "Song", 4, 2);
        t.artist = "Band".into();
        t.year = Some(2001);
        let row = ExportRow::from(&t);
        assert_eq!(row.title, "Song");
        assert_eq!(row.artist, "Band");
        assert_eq!(row.album, "");
        assert_eq!(row.genre, None);
        assert_eq!(row.year, Some(2001));
        assert_eq!(row.play_count, 4);
    }
}
