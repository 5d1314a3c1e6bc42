//! Modified UTF-8 codec.
//!
//! String data items store text as Modified UTF-8: the NUL character takes two
//! bytes (`C0 80`) and supplementary characters are written as two encoded
//! surrogates of three bytes each. String ids are ordered by UTF-16 code
//! units, not by Rust's UTF-8 byte order, so that ordering lives here too.

use std::cmp::Ordering;

/// Error while decoding Modified UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Mutf8Error {
    #[error("invalid byte 0x{byte:02x} at offset {offset}")]
    InvalidByte { byte: u8, offset: usize },
    #[error("truncated sequence at offset {0}")]
    Truncated(usize),
    #[error("unpaired surrogate in string data")]
    UnpairedSurrogate,
}

/// Encode `s` as Modified UTF-8 (without the trailing NUL).
pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x01..=0x7f => out.push(unit as u8),
            0x00 | 0x80..=0x7ff => {
                out.push(0xc0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
            _ => {
                out.push(0xe0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    out
}

/// Number of UTF-16 code units in `s`, as stored in `string_data_item.utf16_size`.
pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Decode Modified UTF-8 bytes (without the trailing NUL).
pub fn decode(bytes: &[u8]) -> Result<String, Mutf8Error> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        let continuation = |offset: usize| -> Result<u16, Mutf8Error> {
            let b = *bytes.get(offset).ok_or(Mutf8Error::Truncated(offset))?;
            if b & 0xc0 != 0x80 {
                return Err(Mutf8Error::InvalidByte { byte: b, offset });
            }
            Ok(u16::from(b & 0x3f))
        };
        match b0 >> 4 {
            0x0..=0x7 if b0 != 0 => {
                units.push(u16::from(b0));
                i += 1;
            }
            0xc | 0xd => {
                let b1 = continuation(i + 1)?;
                units.push((u16::from(b0 & 0x1f) << 6) | b1);
                i += 2;
            }
            0xe => {
                let b1 = continuation(i + 1)?;
                let b2 = continuation(i + 2)?;
                units.push((u16::from(b0 & 0x0f) << 12) | (b1 << 6) | b2);
                i += 3;
            }
            _ => return Err(Mutf8Error::InvalidByte { byte: b0, offset: i }),
        }
    }
    String::from_utf16(&units).map_err(|_| Mutf8Error::UnpairedSurrogate)
}

/// Compare two strings by their UTF-16 code units.
///
/// This is the order the format mandates for the string id table. It differs
/// from `str::cmp` for characters above U+FFFF versus U+E000..U+FFFF.
pub fn cmp_utf16(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}
