//! Error types for itunesdb-core

use thiserror::Error;

use crate::chunk::Tag;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Binary format error: {0}")]
    BinRw(String),

    /// A field declared more bytes than the buffer holds.
    #[error("Truncated input at offset {offset:#x}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Malformed chunk '{tag}' at offset {offset:#x}: {reason}")]
    MalformedChunk {
        tag: Tag,
        offset: usize,
        reason: String,
    },

    #[error("Invalid text encoding at offset {offset:#x}: {reason}")]
    InvalidEncoding { offset: usize, reason: String },

    #[error("Playlist '{name}' not found. Available playlists: {available:?}")]
    PlaylistNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("Play Counts error: {0}")]
    PlayCounts(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(tag: Tag, offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedChunk {
            tag,
            offset,
            reason: reason.into(),
        }
    }
}

impl From<binrw::Error> for Error {
    fn from(e: binrw::Error) -> Self {
        Error::BinRw(e.to_string())
    }
}
