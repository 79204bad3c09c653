//! `mhod` data objects
//!
//! A data object carries one field of its parent track, playlist or track
//! reference. Layout after the common prefix:
//!
//! ```text
//! 0x0C  type code  u32
//! ....  (rest of header, usually up to 0x18)
//! payload:
//!   text types:   encoding u32, byte_len u32, 2 x u32 unknown, text bytes
//!   position:     u32
//!   smart rules:  "SLst" blob, big-endian
//! ```
//!
//! Unknown type codes decode to [`ObjectValue::Unknown`] and are never an error.

use binrw::binread;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::{RawChunk, PREFIX_LEN};
use crate::cursor::{ByteCursor, Record};
use crate::error::{Error, Result};
use crate::string::decode_text;

/// Known type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Title,
    Location,
    Album,
    Artist,
    Genre,
    FileKind,
    Comment,
    Composer,
    AlbumArtist,
    SmartRules,
    Position,
    Other(u32),
}

impl ObjectKind {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => ObjectKind::Title,
            2 => ObjectKind::Location,
            3 => ObjectKind::Album,
            4 => ObjectKind::Artist,
            5 => ObjectKind::Genre,
            6 => ObjectKind::FileKind,
            8 => ObjectKind::Comment,
            12 => ObjectKind::Composer,
            22 => ObjectKind::AlbumArtist,
            51 => ObjectKind::SmartRules,
            100 => ObjectKind::Position,
            other => ObjectKind::Other(other),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            ObjectKind::Title => 1,
            ObjectKind::Location => 2,
            ObjectKind::Album => 3,
            ObjectKind::Artist => 4,
            ObjectKind::Genre => 5,
            ObjectKind::FileKind => 6,
            ObjectKind::Comment => 8,
            ObjectKind::Composer => 12,
            ObjectKind::AlbumArtist => 22,
            ObjectKind::SmartRules => 51,
            ObjectKind::Position => 100,
            ObjectKind::Other(code) => *code,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ObjectKind::Title
                | ObjectKind::Location
                | ObjectKind::Album
                | ObjectKind::Artist
                | ObjectKind::Genre
                | ObjectKind::FileKind
                | ObjectKind::Comment
                | ObjectKind::Composer
                | ObjectKind::AlbumArtist
        )
    }
}

/// How smart playlist rules combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conjunction {
    All,
    Any,
}

/// Smart playlist rule set. Only the summary is decoded; the raw blob is
/// kept so callers can interpret individual rules if they need to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartRules {
    pub conjunction: Conjunction,
    pub rule_count: u32,
    #[serde(skip)]
    pub raw: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectValue {
    Text(String),
    Integer(u32),
    SmartRules(SmartRules),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataObject {
    pub kind: ObjectKind,
    pub value: ObjectValue,
}

impl DataObject {
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            ObjectValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Sub-header preceding string bytes
#[binread]
#[br(little)]
struct StringHeader {
    encoding: u32,
    byte_len: u32,
    _unknown: [u32; 2],
}

impl Record for StringHeader {
    const SIZE: usize = 16;
}

/// Leading fields of an `SLst` rule blob (big-endian, unlike the rest of the file)
#[binread]
#[br(big, magic = b"SLst")]
struct RulesHeader {
    _unknown: u32,
    rule_count: u32,
    conjunction: u32,
}

impl Record for RulesHeader {
    const SIZE: usize = 16;
}

/// Minimum header: prefix plus the type code
const MIN_HEADER_LEN: usize = PREFIX_LEN + 4;

/// Decode one `mhod` chunk
///
/// Fails with `InvalidEncoding` when a text payload is inconsistent with its
/// declared length. The chunk boundary is still known to the caller, so that
/// failure only costs this one field.
pub fn decode(chunk: &RawChunk<'_>) -> Result<DataObject> {
    if (chunk.header.header_len as usize) < MIN_HEADER_LEN {
        return Err(chunk.malformed(format!(
            "data object header is {} bytes, needs at least {}",
            chunk.header.header_len, MIN_HEADER_LEN
        )));
    }

    let code = chunk.header_fields()?.read_u32_le()?;
    let kind = ObjectKind::from_code(code);
    let mut payload = chunk.payload()?;

    let value = match kind {
        k if k.is_text() => ObjectValue::Text(decode_string(&mut payload)?),
        ObjectKind::Position => ObjectValue::Integer(payload.read_u32_le()?),
        ObjectKind::SmartRules => ObjectValue::SmartRules(decode_rules(&mut payload)),
        ObjectKind::Other(code) => {
            debug!(
                "Skipping data object type {} at offset {:#x}",
                code, chunk.header.offset
            );
            ObjectValue::Unknown
        }
        // is_text() covers the remaining named kinds
        _ => ObjectValue::Unknown,
    };

    Ok(DataObject { kind, value })
}

fn decode_string(payload: &mut ByteCursor<'_>) -> Result<String> {
    let offset = payload.position();
    if payload.remaining() < StringHeader::SIZE {
        return Err(Error::InvalidEncoding {
            offset,
            reason: format!(
                "string header needs {} bytes, {} available",
                StringHeader::SIZE,
                payload.remaining()
            ),
        });
    }

    let header: StringHeader = payload.read_record()?;
    let byte_len = header.byte_len as usize;
    if byte_len > payload.remaining() {
        return Err(Error::InvalidEncoding {
            offset,
            reason: format!(
                "string declares {} bytes, {} available",
                byte_len,
                payload.remaining()
            ),
        });
    }

    let text_offset = payload.position();
    let bytes = payload.read_bytes(byte_len)?;
    decode_text(header.encoding, bytes, text_offset)
}

fn decode_rules(payload: &mut ByteCursor<'_>) -> SmartRules {
    let offset = payload.position();
    let raw = payload
        .read_bytes(payload.remaining())
        .map(<[u8]>::to_vec)
        .unwrap_or_default();

    let mut blob = ByteCursor::new(&raw);
    match blob.read_record::<RulesHeader>() {
        Ok(header) => SmartRules {
            conjunction: if header.conjunction == 1 {
                Conjunction::Any
            } else {
                Conjunction::All
            },
            rule_count: header.rule_count,
            raw,
        },
        Err(e) => {
            debug!("Unreadable smart rules at offset {:#x}: {}", offset, e);
            SmartRules {
                conjunction: Conjunction::All,
                rule_count: 0,
                raw,
            }
        }
    }
}
