//! iTunesDB walker
//!
//! The file is a tree of chunks:
//!
//! ```text
//! mhbd                 root
//! +- mhsd (kind 1)     tracks dataset
//! |  +- mhlt           track list
//! |     +- mhit ...    tracks, each with mhod children
//! +- mhsd (kind 2)     playlists dataset
//! |  +- mhlp           playlist list
//! |     +- mhyp ...    playlists, with mhod and mhip children
//! +- mhsd (kind 3..)   podcasts, albums, ... (skipped)
//! ```
//!
//! Unknown chunks at any level are header-decoded and skipped.

use std::collections::HashMap;

use binrw::binread;
use tracing::{debug, info, warn};

use crate::chunk::{Children, ListHeader, RawChunk, Tag};
use crate::cursor::{ByteCursor, Record};
use crate::error::{Error, Result};
use crate::item::Item;
use crate::playlist::Playlist;
use crate::track::Track;

/// Dataset kinds (`mhsd` offset 0x0C)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Tracks,
    Playlists,
    Podcasts,
    Albums,
    SmartPlaylists,
    Other(u32),
}

impl DatasetKind {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => DatasetKind::Tracks,
            2 => DatasetKind::Playlists,
            3 => DatasetKind::Podcasts,
            4 => DatasetKind::Albums,
            5 => DatasetKind::SmartPlaylists,
            other => DatasetKind::Other(other),
        }
    }
}

/// Root header fields from 0x0C
#[binread]
#[br(little)]
struct DatabaseHeader {
    _unknown: u32,
    version: u32,
    child_count: u32,
}

impl Record for DatabaseHeader {
    const SIZE: usize = 12;
}

const ROOT_MIN_HEADER_LEN: u32 = 0x18;
const ROOT_ID_END: u32 = 0x20;
const DATASET_MIN_HEADER_LEN: u32 = 0x10;

/// Everything recovered from one iTunesDB
#[derive(Debug, Clone, Default)]
pub struct Database {
    /// Format version from the root header
    pub version: u32,
    /// Database id from the root header
    pub id: Option<u64>,
    /// Tracks in assembly order
    tracks: Vec<Track>,
    /// Track id -> index into `tracks`
    index: HashMap<u32, usize>,
    /// Track chunk ordinal -> index into `tracks`. Differs from the identity
    /// mapping only when a track id repeats.
    slots: Vec<usize>,
    playlists: Vec<Playlist>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a track in assembly order. A track whose id is already present
    /// replaces the earlier one in place.
    pub fn add_track(&mut self, track: Track) {
        match self.index.get(&track.id) {
            Some(&existing) => {
                warn!("Duplicate track id {}; keeping the later entry", track.id);
                self.tracks[existing] = track;
                self.slots.push(existing);
            }
            None => {
                let position = self.tracks.len();
                self.index.insert(track.id, position);
                self.tracks.push(track);
                self.slots.push(position);
            }
        }
    }

    pub fn add_playlist(&mut self, playlist: Playlist) {
        self.playlists.push(playlist);
    }

    /// Tracks in assembly order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: u32) -> Option<&Track> {
        self.index.get(&id).map(|&i| &self.tracks[i])
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Number of track chunks assembled, including duplicates
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Track assembled from the `ordinal`-th track chunk
    pub(crate) fn track_at_slot_mut(&mut self, ordinal: usize) -> Option<&mut Track> {
        let index = *self.slots.get(ordinal)?;
        self.tracks.get_mut(index)
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    /// Playlists other than the device-managed master list
    pub fn user_playlists(&self) -> impl Iterator<Item = &Playlist> {
        self.playlists.iter().filter(|p| !p.is_master)
    }

    pub fn master_playlist(&self) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.is_master)
    }

    /// First playlist with exactly this name
    pub fn playlist(&self, name: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.name == name)
    }

    /// Like [`Database::playlist`], but a missing name is an error listing
    /// every playlist name
    pub fn require_playlist(&self, name: &str) -> Result<&Playlist> {
        self.playlist(name).ok_or_else(|| Error::PlaylistNotFound {
            name: name.to_string(),
            available: self.playlists.iter().map(|p| p.name.clone()).collect(),
        })
    }

    pub fn playlist_count(&self) -> usize {
        self.playlists.len()
    }
}

/// Parse a complete iTunesDB buffer
pub fn parse_database(data: &[u8]) -> Result<Database> {
    let mut cursor = ByteCursor::new(data);
    let root = RawChunk::read(&mut cursor, 0)?;

    if root.tag() != Tag::DATABASE {
        return Err(root.malformed(format!("expected root chunk '{}'", Tag::DATABASE)));
    }
    if root.header.header_len < ROOT_MIN_HEADER_LEN {
        return Err(root.malformed(format!(
            "root header is {} bytes, needs at least {}",
            root.header.header_len, ROOT_MIN_HEADER_LEN
        )));
    }

    let mut fields = root.header_fields()?;
    let header: DatabaseHeader = fields.read_record()?;
    let id = if root.header.header_len >= ROOT_ID_END {
        Some(fields.read_u64_le()?)
    } else {
        None
    };

    debug!(
        "Database version {:#x}, {} datasets declared",
        header.version, header.child_count
    );

    let mut db = Database {
        version: header.version,
        id,
        ..Default::default()
    };

    for child in root.children()? {
        let dataset = child?;
        if dataset.tag() != Tag::DATASET {
            debug!(
                "Skipping '{}' at offset {:#x} in root",
                dataset.tag(),
                dataset.header.offset
            );
            continue;
        }
        walk_dataset(&dataset, &mut db)?;
    }

    if !cursor.is_empty() {
        debug!("{} trailing bytes after root chunk", cursor.remaining());
    }

    info!(
        "Parsed {} tracks and {} playlists",
        db.track_count(),
        db.playlist_count()
    );

    Ok(db)
}

fn walk_dataset(dataset: &RawChunk<'_>, db: &mut Database) -> Result<()> {
    if dataset.header.header_len < DATASET_MIN_HEADER_LEN {
        return Err(dataset.malformed(format!(
            "dataset header is {} bytes, needs at least {}",
            dataset.header.header_len, DATASET_MIN_HEADER_LEN
        )));
    }

    let code = dataset.header_fields()?.read_u32_le()?;
    match DatasetKind::from_code(code) {
        DatasetKind::Tracks => walk_tracks(dataset, db),
        DatasetKind::Playlists => walk_playlists(dataset, db),
        kind => {
            debug!(
                "Skipping dataset {:?} ({} bytes) at offset {:#x}",
                kind, dataset.header.total_len, dataset.header.offset
            );
            Ok(())
        }
    }
}

/// Open the list at the start of a dataset's payload and iterate its items
fn list_items<'a>(dataset: &RawChunk<'a>, expected: Tag) -> Result<(ListHeader, Children<'a>)> {
    let mut payload = dataset.payload()?;
    let list = ListHeader::read(&mut payload)?;
    if list.tag != expected {
        debug!(
            "Dataset at offset {:#x} holds '{}', expected '{}'",
            dataset.header.offset, list.tag, expected
        );
    }
    payload.seek_absolute(list.items_start())?;
    Ok((list, Children::new(payload, dataset.depth + 1)))
}

fn walk_tracks(dataset: &RawChunk<'_>, db: &mut Database) -> Result<()> {
    let (list, items) = list_items(dataset, Tag::TRACK_LIST)?;

    let mut found = 0u32;
    for chunk in items {
        let chunk = chunk?;
        match Item::decode(&chunk)? {
            Item::Track(track) => {
                db.add_track(track);
                found += 1;
            }
            other => debug!(
                "Skipping '{}' at offset {:#x} in track list",
                other.tag(),
                chunk.header.offset
            ),
        }
    }

    if found != list.item_count {
        debug!(
            "Track list declares {} tracks, found {}",
            list.item_count, found
        );
    }
    Ok(())
}

fn walk_playlists(dataset: &RawChunk<'_>, db: &mut Database) -> Result<()> {
    let (list, items) = list_items(dataset, Tag::PLAYLIST_LIST)?;

    let mut ordinal = 0u32;
    for chunk in items {
        let chunk = chunk?;
        match Item::decode(&chunk)? {
            Item::Playlist(mut playlist) => {
                if playlist.name.is_empty() {
                    playlist.name = format!("Playlist_{}", ordinal);
                }
                debug!(
                    "Playlist '{}': {} entries{}",
                    playlist.name,
                    playlist.len(),
                    if playlist.is_master { " (master)" } else { "" }
                );
                db.add_playlist(playlist);
                ordinal += 1;
            }
            other => debug!(
                "Skipping '{}' at offset {:#x} in playlist list",
                other.tag(),
                chunk.header.offset
            ),
        }
    }

    if ordinal != list.item_count {
        debug!(
            "Playlist list declares {} playlists, found {}",
            list.item_count, ordinal
        );
    }
    Ok(())
}
