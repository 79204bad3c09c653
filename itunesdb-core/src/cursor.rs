//! Bounds-checked reader over an in-memory iTunesDB buffer
//!
//! Every position reported by the cursor is absolute (relative to the start of
//! the file), so errors raised deep inside a nested chunk still point at the
//! right byte. A cursor may be narrowed to a window; reads past the window end
//! fail with [`Error::TruncatedInput`] even if the underlying buffer continues.

use std::io::Cursor;

use binrw::{BinRead, Endian};

use crate::chunk::Tag;
use crate::error::{Error, Result};

/// A fixed-size record decoded with binrw.
///
/// `SIZE` is checked against the remaining bytes before decoding so that a
/// short buffer surfaces as `TruncatedInput` with exact byte counts.
pub trait Record: Sized {
    const SIZE: usize;
}

#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> ByteCursor<'a> {
    /// Cursor over the whole buffer
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            end: data.len(),
        }
    }

    /// Absolute offset of the next byte to be read
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Absolute offset one past the last readable byte
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.end
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(Error::TruncatedInput {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Look at the next four bytes as a chunk tag without consuming them
    pub fn peek_tag(&self) -> Result<Tag> {
        self.ensure(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        Ok(Tag(raw))
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Jump forward to an absolute offset, typically the start of the next
    /// sibling chunk. Moving backwards is rejected.
    pub fn seek_absolute(&mut self, offset: usize) -> Result<()> {
        if offset < self.pos {
            return Err(Error::BinRw(format!(
                "refusing to rewind from {:#x} to {:#x}",
                self.pos, offset
            )));
        }
        self.skip(offset - self.pos)
    }

    /// Child cursor over `[start, end)`, which must lie inside this cursor's
    /// readable range. The parent's position is not changed.
    pub fn window(&self, start: usize, end: usize) -> Result<ByteCursor<'a>> {
        if start < self.pos || start > end {
            return Err(Error::BinRw(format!(
                "invalid window {:#x}..{:#x} (cursor at {:#x})",
                start, end, self.pos
            )));
        }
        if end > self.end {
            return Err(Error::TruncatedInput {
                offset: start,
                needed: end - start,
                available: self.end.saturating_sub(start),
            });
        }
        Ok(ByteCursor {
            data: self.data,
            pos: start,
            end,
        })
    }

    /// Decode a little-endian fixed-layout record and advance past it
    pub fn read_record<T>(&mut self) -> Result<T>
    where
        T: Record + for<'b> BinRead<Args<'b> = ()>,
    {
        let start = self.pos;
        let bytes = self.read_bytes(T::SIZE)?;
        let mut reader = Cursor::new(bytes);
        T::read_options(&mut reader, Endian::Little, ())
            .map_err(|e| Error::BinRw(format!("{} (record at offset {:#x})", e, start)))
    }
}
