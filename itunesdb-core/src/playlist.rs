//! Playlists (`mhyp`) and their track references (`mhip`)
//!
//! `mhyp` header fields:
//!
//! ```text
//! 0x0C  data object count       u32
//! 0x10  track reference count   u32
//! 0x14  hidden flag             u8, non-zero on the master "all tracks" list
//! 0x18  timestamp               u32
//! 0x1C  playlist id             u64 (headers >= 0x24 bytes)
//! 0x2A  podcast flag            u16 (headers >= 0x2C bytes)
//! ```
//!
//! `mhip` carries the referenced track id at 0x18.

use binrw::binread;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chunk::{RawChunk, Tag};
use crate::cursor::Record;
use crate::data_object::{ObjectKind, ObjectValue, SmartRules};
use crate::error::{Error, Result};
use crate::item::Item;

pub const MIN_HEADER_LEN: u32 = 0x1C;
pub const MIN_REF_HEADER_LEN: u32 = 0x1C;

const ID_END: u32 = 0x24;
const PODCAST_FLAG_OFFSET: usize = 0x2A;
const PODCAST_FLAG_END: u32 = 0x2C;
const REF_TRACK_ID_OFFSET: usize = 0x18;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: Option<u64>,
    pub name: String,
    /// Referenced track ids in stored order. May contain duplicates and ids
    /// with no matching track.
    pub track_ids: Vec<u32>,
    /// Device-managed list of every track
    pub is_master: bool,
    pub is_podcast: bool,
    pub smart: Option<SmartRules>,
}

impl Playlist {
    pub fn new(name: impl Into<String>, track_ids: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            track_ids,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.track_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track_ids.is_empty()
    }
}

/// A playlist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackRef {
    pub track_id: u32,
    /// Position from the attached data object, if any. Stored order is what
    /// counts; this is informational.
    pub position: Option<u32>,
}

#[binread]
#[br(little)]
struct PlaylistHeader {
    object_count: u32,
    ref_count: u32,
    hidden: u8,
    #[br(pad_before = 3)]
    _timestamp: u32,
}

impl Record for PlaylistHeader {
    const SIZE: usize = 16;
}

/// Build a [`Playlist`] from an `mhyp` chunk
///
/// The name is left empty when no title object is present; the walker
/// assigns a fallback.
pub fn assemble(chunk: &RawChunk<'_>) -> Result<Playlist> {
    let header_len = chunk.header.header_len;
    if header_len < MIN_HEADER_LEN {
        return Err(chunk.malformed(format!(
            "playlist header is {} bytes, needs at least {}",
            header_len, MIN_HEADER_LEN
        )));
    }

    let mut fields = chunk.header_fields()?;
    let fixed: PlaylistHeader = fields.read_record()?;

    let id = if header_len >= ID_END {
        Some(fields.read_u64_le()?)
    } else {
        None
    };

    let is_podcast = if header_len >= PODCAST_FLAG_END {
        fields.seek_absolute(chunk.header.offset + PODCAST_FLAG_OFFSET)?;
        fields.read_u16_le()? == 1
    } else {
        false
    };

    let mut playlist = Playlist {
        id,
        is_master: fixed.hidden != 0,
        is_podcast,
        ..Default::default()
    };

    let mut objects = 0u32;
    for child in chunk.children()? {
        let child = child?;
        match Item::decode(&child) {
            Ok(Item::DataObject(object)) => {
                objects += 1;
                match (object.kind, object.value) {
                    (ObjectKind::Title, ObjectValue::Text(name)) => {
                        playlist.name = name.trim().to_string();
                    }
                    (_, ObjectValue::SmartRules(rules)) => playlist.smart = Some(rules),
                    (kind, _) => debug!("Playlist: ignoring data object type {}", kind.code()),
                }
            }
            Ok(Item::TrackRef(entry)) => playlist.track_ids.push(entry.track_id),
            Ok(other) => {
                debug!(
                    "Playlist: skipping nested '{}' at offset {:#x}",
                    other.tag(),
                    child.header.offset
                );
            }
            Err(Error::InvalidEncoding { offset, reason }) => {
                objects += 1;
                warn!("Playlist: unreadable text at offset {:#x}: {}", offset, reason);
            }
            // The prefix decoded, so the entry's extent is known
            Err(e @ Error::MalformedChunk { .. })
                if matches!(child.tag(), Tag::TRACK_REF | Tag::DATA_OBJECT) =>
            {
                warn!("Playlist: skipping unreadable '{}': {}", child.tag(), e);
            }
            Err(e) => return Err(e),
        }
    }

    if objects != fixed.object_count || playlist.track_ids.len() != fixed.ref_count as usize {
        debug!(
            "Playlist '{}': header declares {} objects / {} entries, found {} / {}",
            playlist.name,
            fixed.object_count,
            fixed.ref_count,
            objects,
            playlist.track_ids.len()
        );
    }

    Ok(playlist)
}

/// Decode an `mhip` chunk
pub fn assemble_ref(chunk: &RawChunk<'_>) -> Result<TrackRef> {
    if chunk.header.header_len < MIN_REF_HEADER_LEN {
        return Err(chunk.malformed(format!(
            "track reference header is {} bytes, needs at least {}",
            chunk.header.header_len, MIN_REF_HEADER_LEN
        )));
    }

    let mut fields = chunk.header_fields()?;
    fields.seek_absolute(chunk.header.offset + REF_TRACK_ID_OFFSET)?;
    let track_id = fields.read_u32_le()?;

    let mut position = None;
    for child in chunk.children()? {
        let child = child?;
        match Item::decode(&child) {
            Ok(Item::DataObject(object)) => {
                if let (ObjectKind::Position, ObjectValue::Integer(p)) = (object.kind, object.value) {
                    position = Some(p);
                }
            }
            Ok(_) => {}
            Err(Error::InvalidEncoding { offset, reason }) => {
                warn!("Track reference: unreadable text at offset {:#x}: {}", offset, reason);
            }
            Err(e @ Error::MalformedChunk { .. }) if child.tag() == Tag::DATA_OBJECT => {
                warn!("Track reference: skipping unreadable data object: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(TrackRef { track_id, position })
}
