//! Tag dispatch for item-level chunks

use crate::chunk::{RawChunk, Tag};
use crate::data_object::{self, DataObject};
use crate::error::Result;
use crate::playlist::{self, Playlist, TrackRef};
use crate::track::{self, Track};

/// Decoded content of one chunk, chosen by its tag
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Track(Track),
    Playlist(Playlist),
    TrackRef(TrackRef),
    DataObject(DataObject),
    /// Header-decoded and skipped
    Unknown(Tag),
}

impl Item {
    pub fn decode(chunk: &RawChunk<'_>) -> Result<Item> {
        Ok(match chunk.tag() {
            Tag::TRACK => Item::Track(track::assemble(chunk)?),
            Tag::PLAYLIST => Item::Playlist(playlist::assemble(chunk)?),
            Tag::TRACK_REF => Item::TrackRef(playlist::assemble_ref(chunk)?),
            Tag::DATA_OBJECT => Item::DataObject(data_object::decode(chunk)?),
            other => Item::Unknown(other),
        })
    }

    pub fn tag(&self) -> Tag {
        match self {
            Item::Track(_) => Tag::TRACK,
            Item::Playlist(_) => Tag::PLAYLIST,
            Item::TrackRef(_) => Tag::TRACK_REF,
            Item::DataObject(_) => Tag::DATA_OBJECT,
            Item::Unknown(tag) => *tag,
        }
    }
}
