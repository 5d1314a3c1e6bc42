//! LEB128 codecs.
//!
//! The data section stores most counts, indices and offsets as unsigned or
//! signed LEB128. `uleb128p1` stores `value + 1` so that `NO_INDEX` (-1)
//! encodes as a single zero byte.

/// Append `value` as unsigned LEB128.
pub fn write_uleb128(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Append `value` as signed LEB128.
pub fn write_sleb128(out: &mut Vec<u8>, mut value: i32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let sign_clear = byte & 0x40 == 0;
        if (value == 0 && sign_clear) || (value == -1 && !sign_clear) {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Append an optional index as `uleb128p1` (`None` encodes as `NO_INDEX`).
pub fn write_uleb128p1(out: &mut Vec<u8>, value: Option<u32>) {
    match value {
        Some(v) => write_uleb128(out, v + 1),
        None => out.push(0),
    }
}

/// Number of bytes `value` occupies as unsigned LEB128.
pub fn uleb128_len(value: u32) -> usize {
    let bits = 32 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Decode an unsigned LEB128 at `*pos`, advancing it.
///
/// Returns `None` on truncated input or an encoding longer than five bytes.
pub fn read_uleb128(bytes: &[u8], pos: &mut usize) -> Option<u32> {
    let mut result = 0u32;
    for i in 0..5 {
        let byte = *bytes.get(*pos)?;
        *pos += 1;
        result |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Some(result);
        }
    }
    None
}

/// Decode a signed LEB128 at `*pos`, advancing it.
pub fn read_sleb128(bytes: &[u8], pos: &mut usize) -> Option<i32> {
    let mut result = 0i32;
    let mut shift = 0;
    loop {
        let byte = *bytes.get(*pos)?;
        *pos += 1;
        result |= i32::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if shift < 32 && byte & 0x40 != 0 {
                result |= -1 << shift;
            }
            return Some(result);
        }
        if shift >= 35 {
            return None;
        }
    }
}
