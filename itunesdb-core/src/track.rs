//! Track records and the `mhit` assembler
//!
//! Fixed header fields (offsets from the start of the chunk):
//!
//! ```text
//! 0x0C  data object count   u32
//! 0x10  track id            u32
//! 0x1F  rating              u8, 0-100 in steps of 20
//! 0x24  file size           u32
//! 0x28  length              u32, milliseconds
//! 0x2C  track number        u32
//! 0x30  total tracks        u32
//! 0x34  year                u32, 0 if unset
//! 0x38  bitrate             u32, kbps
//! 0x3C  sample rate         u32, Hz << 16 (headers >= 0x40 bytes)
//! 0x70  dbid                u64 (headers >= 0x78 bytes)
//! ```
//!
//! Text fields come from the `mhod` children. A repeated type code overwrites
//! the earlier value (last one wins).

use binrw::binread;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chunk::{RawChunk, Tag};
use crate::cursor::Record;
use crate::data_object::{DataObject, ObjectKind, ObjectValue};
use crate::error::{Error, Result};
use crate::item::Item;

/// Smallest header that holds every field up to and including the bitrate
pub const MIN_HEADER_LEN: u32 = 0x3C;

const SAMPLE_RATE_END: u32 = 0x40;
const DBID_OFFSET: usize = 0x70;
const DBID_END: u32 = 0x78;

/// A single track from the library
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Track id, referenced by playlists
    pub id: u32,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: Option<String>,
    pub year: Option<u32>,
    /// Stars, 0-5
    pub rating: u8,
    /// Plays recorded in the Play Counts file, 0 until merged
    pub play_count: u32,
    /// Mac epoch seconds from the Play Counts file
    pub last_played: Option<u32>,
    pub duration_ms: u32,
    /// Bitrate in kbps
    pub bitrate: u32,
    /// Sample rate in Hz
    pub sample_rate: Option<u32>,
    pub track_number: u32,
    pub total_tracks: u32,
    pub file_size: u32,
    /// Device path, colon separated (":iPod_Control:Music:F00:ABCD.mp3")
    pub location: Option<String>,
    pub file_kind: Option<String>,
    pub composer: Option<String>,
    pub comment: Option<String>,
    pub album_artist: Option<String>,
    /// 64-bit database id, stable across syncs
    pub dbid: Option<u64>,
}

impl Track {
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    /// Overwrite the field a data object carries. Returns false for objects
    /// that do not describe a track field.
    pub fn apply(&mut self, object: DataObject) -> bool {
        let text = match object.value {
            ObjectValue::Text(text) => text,
            _ => return false,
        };
        match object.kind {
            ObjectKind::Title => self.title = text,
            ObjectKind::Artist => self.artist = text,
            ObjectKind::Album => self.album = text,
            ObjectKind::Genre => self.genre = non_empty(text),
            ObjectKind::Location => self.location = non_empty(text),
            ObjectKind::FileKind => self.file_kind = non_empty(text),
            ObjectKind::Composer => self.composer = non_empty(text),
            ObjectKind::Comment => self.comment = non_empty(text),
            ObjectKind::AlbumArtist => self.album_artist = non_empty(text),
            _ => return false,
        }
        true
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Convert the raw 0-100 rating byte to stars
pub fn stars_from_raw(raw: u8) -> u8 {
    (raw / 20).min(5)
}

/// Header fields from 0x0C through 0x3B
#[binread]
#[br(little)]
struct TrackHeader {
    object_count: u32,
    id: u32,
    #[br(pad_before = 11)]
    rating: u8,
    #[br(pad_before = 4)]
    file_size: u32,
    duration_ms: u32,
    track_number: u32,
    total_tracks: u32,
    year: u32,
    bitrate: u32,
}

impl Record for TrackHeader {
    const SIZE: usize = 48;
}

/// Build a [`Track`] from an `mhit` chunk
pub fn assemble(chunk: &RawChunk<'_>) -> Result<Track> {
    let header_len = chunk.header.header_len;
    if header_len < MIN_HEADER_LEN {
        return Err(chunk.malformed(format!(
            "track header is {} bytes, needs at least {}",
            header_len, MIN_HEADER_LEN
        )));
    }

    let mut fields = chunk.header_fields()?;
    let fixed: TrackHeader = fields.read_record()?;

    let sample_rate = if header_len >= SAMPLE_RATE_END {
        Some(fields.read_u32_le()? >> 16).filter(|rate| *rate > 0)
    } else {
        None
    };

    let dbid = if header_len >= DBID_END {
        fields.seek_absolute(chunk.header.offset + DBID_OFFSET)?;
        Some(fields.read_u64_le()?)
    } else {
        None
    };

    let mut track = Track {
        id: fixed.id,
        rating: stars_from_raw(fixed.rating),
        year: (fixed.year != 0).then_some(fixed.year),
        duration_ms: fixed.duration_ms,
        bitrate: fixed.bitrate,
        sample_rate,
        track_number: fixed.track_number,
        total_tracks: fixed.total_tracks,
        file_size: fixed.file_size,
        dbid,
        ..Default::default()
    };

    let mut objects = 0u32;
    for child in chunk.children()? {
        let child = child?;
        match Item::decode(&child) {
            Ok(Item::DataObject(object)) => {
                objects += 1;
                let kind = object.kind;
                if !track.apply(object) {
                    debug!("Track {}: ignoring data object type {}", track.id, kind.code());
                }
            }
            Ok(other) => {
                debug!(
                    "Track {}: skipping nested '{}' at offset {:#x}",
                    track.id,
                    other.tag(),
                    child.header.offset
                );
            }
            Err(Error::InvalidEncoding { offset, reason }) => {
                objects += 1;
                warn!(
                    "Track {}: unreadable text at offset {:#x}: {}",
                    track.id, offset, reason
                );
            }
            Err(e @ Error::MalformedChunk { .. }) if child.tag() == Tag::DATA_OBJECT => {
                objects += 1;
                warn!("Track {}: skipping unreadable data object: {}", track.id, e);
            }
            Err(e) => return Err(e),
        }
    }

    if objects != fixed.object_count {
        debug!(
            "Track {}: header declares {} data objects, found {}",
            track.id, fixed.object_count, objects
        );
    }

    Ok(track)
}
