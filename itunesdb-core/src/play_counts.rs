//! `Play Counts` file parsing and merging
//!
//! The device writes this file between syncs. It is a flat array with one
//! fixed-size entry per track:
//!
//! ```text
//! header:  "mhdp", header_len u32, entry_len u32, entry_count u32
//! entry:   0x00 play count   u32
//!          0x04 last played  u32, Mac epoch seconds (entry_len >= 8)
//!          0x08 bookmark     u32, milliseconds      (entry_len >= 12)
//!          0x0C rating       u32, 0-100             (entry_len >= 16)
//! ```
//!
//! Entries carry no track id. Entry *i* belongs to the *i*-th track chunk of
//! the iTunesDB, so a database and Play Counts file from different syncs will
//! silently mismatch. This is a limitation of the format and is kept as-is.

use binrw::binread;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chunk::Tag;
use crate::cursor::{ByteCursor, Record};
use crate::database::Database;
use crate::error::{Error, Result};

const HEADER_LEN: usize = 16;
const MIN_ENTRY_LEN: usize = 4;

#[binread]
#[br(little)]
struct PlayCountsHeader {
    _tag: [u8; 4],
    header_len: u32,
    entry_len: u32,
    entry_count: u32,
}

impl Record for PlayCountsHeader {
    const SIZE: usize = HEADER_LEN;
}

/// One Play Counts entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayCountEntry {
    pub play_count: u32,
    pub last_played: Option<u32>,
    pub bookmark_ms: Option<u32>,
    /// Raw 0-100 rating. Informational; not applied to tracks.
    pub rating: Option<u32>,
}

/// Parsed Play Counts file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayCounts {
    entries: Vec<PlayCountEntry>,
}

impl PlayCounts {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::PlayCounts(format!(
                "file is {} bytes, shorter than the {}-byte header",
                data.len(),
                HEADER_LEN
            )));
        }

        let mut cursor = ByteCursor::new(data);
        let tag = cursor.peek_tag()?;
        if tag != Tag::PLAY_COUNTS {
            return Err(Error::PlayCounts(format!(
                "unexpected magic '{}', expected '{}'",
                tag,
                Tag::PLAY_COUNTS
            )));
        }

        let header: PlayCountsHeader = cursor.read_record()?;
        let header_len = header.header_len as usize;
        let entry_len = header.entry_len as usize;

        if header_len < HEADER_LEN {
            return Err(Error::PlayCounts(format!(
                "header length {} is shorter than {}",
                header_len, HEADER_LEN
            )));
        }
        if entry_len < MIN_ENTRY_LEN {
            return Err(Error::PlayCounts(format!(
                "entry length {} cannot hold a play count",
                entry_len
            )));
        }
        cursor.seek_absolute(header_len)?;

        let declared = header.entry_count as usize;
        let mut entries = Vec::with_capacity(declared.min(cursor.remaining() / entry_len));

        for i in 0..declared {
            if cursor.remaining() < entry_len {
                warn!(
                    "Play Counts truncated: {} of {} entries present",
                    i, declared
                );
                break;
            }
            let start = cursor.position();
            let mut entry = cursor.window(start, start + entry_len)?;
            cursor.skip(entry_len)?;
            entries.push(read_entry(&mut entry, entry_len)?);
        }

        debug!("Found {} play count entries", entries.len());
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PlayCountEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PlayCountEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PlayCountEntry> for PlayCounts {
    fn from_iter<I: IntoIterator<Item = PlayCountEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn read_entry(entry: &mut ByteCursor<'_>, entry_len: usize) -> Result<PlayCountEntry> {
    let play_count = entry.read_u32_le()?;
    let mut optional = |min_len: usize| -> Result<Option<u32>> {
        if entry_len >= min_len {
            entry.read_u32_le().map(Some)
        } else {
            Ok(None)
        }
    };
    let last_played = optional(8)?.filter(|t| *t != 0);
    let bookmark_ms = optional(12)?;
    let rating = optional(16)?;

    Ok(PlayCountEntry {
        play_count,
        last_played,
        bookmark_ms,
        rating,
    })
}

impl Database {
    /// Apply entries positionally. Tracks past the last entry keep their
    /// current play count; entries past the last track are ignored.
    /// Returns the number of entries applied.
    pub fn apply_play_counts(&mut self, counts: &PlayCounts) -> usize {
        let mut applied = 0;
        for (ordinal, entry) in counts.entries().iter().enumerate() {
            match self.track_at_slot_mut(ordinal) {
                Some(track) => {
                    track.play_count = entry.play_count;
                    track.last_played = entry.last_played;
                    applied += 1;
                }
                None => {
                    debug!(
                        "Ignoring {} play count entries beyond the last track",
                        counts.len() - ordinal
                    );
                    break;
                }
            }
        }
        applied
    }
}

/// Merge a Play Counts file into a database
///
/// An unreadable file is logged and leaves every play count untouched.
pub fn merge_play_statistics(mut db: Database, data: &[u8]) -> Database {
    match PlayCounts::parse(data) {
        Ok(counts) => {
            let applied = db.apply_play_counts(&counts);
            info!(
                "Merged {} play count entries into {} tracks",
                applied,
                db.track_count()
            );
        }
        Err(e) => warn!("Ignoring Play Counts file: {}", e),
    }
    db
}
