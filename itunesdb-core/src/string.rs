//! Text decoding for iTunesDB string objects
//!
//! Most strings are UTF-16LE. Some newer writers mark a string as UTF-8 via
//! the encoding field of the string sub-header.
//!
//! Decoding is total for well-sized input: unpaired surrogates become U+FFFD.
//! Only a byte count that cannot hold whole UTF-16 code units is an error.

use crate::error::{Error, Result};

/// Encoding field value for UTF-8 payloads
pub const ENCODING_UTF8: u32 = 2;

/// Decode UTF-16LE, trimming trailing NULs
///
/// `offset` is the absolute position of `bytes`, used only for error context.
pub fn decode_utf16le(bytes: &[u8], offset: usize) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(Error::InvalidEncoding {
            offset,
            reason: format!("UTF-16 text has odd byte count {}", bytes.len()),
        });
    }

    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));

    let text: String = char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();

    Ok(trim_nul(text))
}

/// Decode UTF-8, replacing invalid sequences
pub fn decode_utf8(bytes: &[u8]) -> String {
    trim_nul(String::from_utf8_lossy(bytes).into_owned())
}

/// Decode according to a string sub-header's encoding field
pub fn decode_text(encoding: u32, bytes: &[u8], offset: usize) -> Result<String> {
    match encoding {
        ENCODING_UTF8 => Ok(decode_utf8(bytes)),
        _ => decode_utf16le(bytes, offset),
    }
}

fn trim_nul(mut text: String) -> String {
    let trimmed = text.trim_end_matches('\0').len();
    text.truncate(trimmed);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn test_ascii() {
        assert_eq!(decode_utf16le(&utf16("foo"), 0).unwrap(), "foo");
    }

    #[test]
    fn test_non_latin() {
        assert_eq!(decode_utf16le(&utf16("日本語"), 0).unwrap(), "日本語");
        // Surrogate pair
        assert_eq!(decode_utf16le(&utf16("🎵"), 0).unwrap(), "🎵");
    }

    #[test]
    fn test_empty() {
        assert_eq!(decode_utf16le(&[], 0).unwrap(), "");
    }

    #[test]
    fn test_trailing_nul_trimmed() {
        let mut bytes = utf16("Title");
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(decode_utf16le(&bytes, 0).unwrap(), "Title");
    }

    #[test]
    fn test_odd_length_is_invalid() {
        match decode_utf16le(&[0x41, 0x00, 0x42], 0x40) {
            Err(Error::InvalidEncoding { offset, .. }) => assert_eq!(offset, 0x40),
            other => panic!("expected InvalidEncoding, got {:?}", other),
        }
    }

    #[test]
    fn test_lone_surrogate_replaced() {
        // 'A', unpaired high surrogate, 'B'
        let bytes = [0x41, 0x00, 0x00, 0xD8, 0x42, 0x00];
        assert_eq!(decode_utf16le(&bytes, 0).unwrap(), "A\u{FFFD}B");
    }

    #[test]
    fn test_utf8_encoding_flag() {
        assert_eq!(decode_text(ENCODING_UTF8, "Café".as_bytes(), 0).unwrap(), "Café");
        assert_eq!(decode_text(1, &utf16("Café"), 0).unwrap(), "Café");
    }
}
