//! Chunk headers and sibling iteration
//!
//! Every iTunesDB record starts with the same 12-byte prefix:
//!
//! ```text
//! 0x00  tag         4 bytes, e.g. "mhit"
//! 0x04  header_len  u32, size of the fixed header including this prefix
//! 0x08  total_len   u32, size of header plus all nested children
//! ```
//!
//! The decoder only validates this prefix. Interpreting the rest of the header
//! and the payload is left to the assemblers. Iteration over siblings always
//! resumes at `offset + total_len`, so a chunk that was only partly understood
//! (or not at all) never desynchronizes the walk.

use std::fmt;

use binrw::binread;

use crate::cursor::{ByteCursor, Record};
use crate::error::{Error, Result};

/// Maximum chunk nesting accepted before the input is treated as corrupt.
/// Real databases nest at most five levels (mhbd > mhsd > mhyp > mhip > mhod).
pub const MAX_DEPTH: usize = 8;

/// Size of the common tag/header_len/total_len prefix
pub const PREFIX_LEN: usize = 12;

/// Four raw tag bytes. Not required to be ASCII.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const DATABASE: Tag = Tag(*b"mhbd");
    pub const DATASET: Tag = Tag(*b"mhsd");
    pub const TRACK_LIST: Tag = Tag(*b"mhlt");
    pub const PLAYLIST_LIST: Tag = Tag(*b"mhlp");
    pub const TRACK: Tag = Tag(*b"mhit");
    pub const PLAYLIST: Tag = Tag(*b"mhyp");
    pub const TRACK_REF: Tag = Tag(*b"mhip");
    pub const DATA_OBJECT: Tag = Tag(*b"mhod");
    pub const PLAY_COUNTS: Tag = Tag(*b"mhdp");
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(\"{}\")", self)
    }
}

#[binread]
#[br(little)]
struct RawPrefix {
    tag: [u8; 4],
    header_len: u32,
    total_len: u32,
}

impl Record for RawPrefix {
    const SIZE: usize = PREFIX_LEN;
}

/// Validated chunk prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: Tag,
    /// Absolute offset of the tag
    pub offset: usize,
    pub header_len: u32,
    pub total_len: u32,
}

impl ChunkHeader {
    /// Decode and validate a prefix. `total_len` must fit in what remains of
    /// the cursor's window.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let offset = cursor.position();
        let available = cursor.remaining();
        let raw: RawPrefix = cursor.read_record()?;
        let tag = Tag(raw.tag);

        if (raw.header_len as usize) < PREFIX_LEN {
            return Err(Error::malformed(
                tag,
                offset,
                format!(
                    "header length {} is shorter than the {}-byte prefix",
                    raw.header_len, PREFIX_LEN
                ),
            ));
        }
        if raw.total_len < raw.header_len {
            return Err(Error::malformed(
                tag,
                offset,
                format!(
                    "total length {} is smaller than header length {}",
                    raw.total_len, raw.header_len
                ),
            ));
        }
        if raw.total_len as usize > available {
            return Err(Error::malformed(
                tag,
                offset,
                format!(
                    "total length {} exceeds the {} bytes left in the parent",
                    raw.total_len, available
                ),
            ));
        }

        Ok(Self {
            tag,
            offset,
            header_len: raw.header_len,
            total_len: raw.total_len,
        })
    }

    /// Absolute offset where the payload (children) begins
    pub fn payload_start(&self) -> usize {
        self.offset + self.header_len as usize
    }

    /// Absolute offset of the next sibling chunk
    pub fn next_sibling(&self) -> usize {
        self.offset + self.total_len as usize
    }

    pub fn payload_len(&self) -> usize {
        (self.total_len - self.header_len) as usize
    }
}

/// A header-decoded chunk and the bytes it owns
#[derive(Debug, Clone)]
pub struct RawChunk<'a> {
    pub header: ChunkHeader,
    pub depth: usize,
    body: ByteCursor<'a>,
}

impl<'a> RawChunk<'a> {
    /// Decode the chunk at the cursor and leave the cursor at its next sibling
    pub fn read(cursor: &mut ByteCursor<'a>, depth: usize) -> Result<Self> {
        let header = ChunkHeader::read(cursor)?;
        let body = cursor.window(cursor.position(), header.next_sibling())?;
        cursor.seek_absolute(header.next_sibling())?;
        Ok(Self {
            header,
            depth,
            body,
        })
    }

    pub fn tag(&self) -> Tag {
        self.header.tag
    }

    /// Header bytes after the common prefix, `[offset + 12, offset + header_len)`
    pub fn header_fields(&self) -> Result<ByteCursor<'a>> {
        self.body
            .window(self.header.offset + PREFIX_LEN, self.header.payload_start())
    }

    /// Payload bytes, `[offset + header_len, offset + total_len)`
    pub fn payload(&self) -> Result<ByteCursor<'a>> {
        self.body
            .window(self.header.payload_start(), self.header.next_sibling())
    }

    /// Iterate the chunks nested in the payload
    pub fn children(&self) -> Result<Children<'a>> {
        let depth = self.depth + 1;
        if depth > MAX_DEPTH {
            return Err(Error::malformed(
                self.header.tag,
                self.header.offset,
                format!("nesting deeper than {} levels", MAX_DEPTH),
            ));
        }
        Ok(Children::new(self.payload()?, depth))
    }

    pub(crate) fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::malformed(self.header.tag, self.header.offset, reason)
    }
}

/// Sibling chunks laid end to end inside a window
///
/// Stops after the first error: once a header cannot be decoded there is no
/// reliable way to find the next sibling.
pub struct Children<'a> {
    cursor: ByteCursor<'a>,
    depth: usize,
    failed: bool,
}

impl<'a> Children<'a> {
    pub fn new(cursor: ByteCursor<'a>, depth: usize) -> Self {
        Self {
            cursor,
            depth,
            failed: false,
        }
    }
}

impl<'a> Iterator for Children<'a> {
    type Item = Result<RawChunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor.is_empty() {
            return None;
        }
        let chunk = RawChunk::read(&mut self.cursor, self.depth);
        if chunk.is_err() {
            self.failed = true;
        }
        Some(chunk)
    }
}

/// Header of an `mhlt`/`mhlp` list. Unlike other chunks its third
/// field is an item count, and its items run to the end of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHeader {
    pub tag: Tag,
    pub offset: usize,
    pub header_len: u32,
    pub item_count: u32,
}

impl ListHeader {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let offset = cursor.position();
        let available = cursor.remaining();
        let raw: RawPrefix = cursor.read_record()?;
        let tag = Tag(raw.tag);

        if (raw.header_len as usize) < PREFIX_LEN || raw.header_len as usize > available {
            return Err(Error::malformed(
                tag,
                offset,
                format!(
                    "list header length {} outside 12..={}",
                    raw.header_len, available
                ),
            ));
        }

        Ok(Self {
            tag,
            offset,
            header_len: raw.header_len,
            item_count: raw.total_len,
        })
    }

    pub fn items_start(&self) -> usize {
        self.offset + self.header_len as usize
    }
}
