//! Encoded value tags and minimal-width numeric encoding.
//!
//! Every encoded value starts with one tag byte: the low five bits hold the
//! [`ValueType`], the high three bits hold `value_arg`. For sized kinds
//! `value_arg` is the payload length minus one; booleans carry their value
//! there; the remaining kinds use zero.

/// Kind of an encoded value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ValueType {
    Byte = 0x00,
    Short = 0x02,
    Char = 0x03,
    Int = 0x04,
    Long = 0x06,
    Float = 0x10,
    Double = 0x11,
    MethodType = 0x15,
    MethodHandle = 0x16,
    String = 0x17,
    Type = 0x18,
    Field = 0x19,
    Method = 0x1a,
    Enum = 0x1b,
    Array = 0x1c,
    Annotation = 0x1d,
    Null = 0x1e,
    Boolean = 0x1f,
}

impl ValueType {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0x00 => Self::Byte,
            0x02 => Self::Short,
            0x03 => Self::Char,
            0x04 => Self::Int,
            0x06 => Self::Long,
            0x10 => Self::Float,
            0x11 => Self::Double,
            0x15 => Self::MethodType,
            0x16 => Self::MethodHandle,
            0x17 => Self::String,
            0x18 => Self::Type,
            0x19 => Self::Field,
            0x1a => Self::Method,
            0x1b => Self::Enum,
            0x1c => Self::Array,
            0x1d => Self::Annotation,
            0x1e => Self::Null,
            0x1f => Self::Boolean,
            _ => return None,
        })
    }
}

/// Compose a tag byte.
#[inline]
pub fn value_tag(ty: ValueType, arg: u8) -> u8 {
    debug_assert!(arg < 8, "value_arg out of range");
    (arg << 5) | ty as u8
}

/// Split a tag byte into its kind and `value_arg`.
pub fn split_tag(tag: u8) -> Option<(ValueType, u8)> {
    Some((ValueType::from_u8(tag & 0x1f)?, tag >> 5))
}

/// Fewest bytes whose sign extension reproduces `value`.
pub fn signed_size(value: i64) -> usize {
    let redundant = if value < 0 {
        value.leading_ones()
    } else {
        value.leading_zeros()
    };
    // one sign bit must survive
    let significant = 64 - redundant + 1;
    (significant as usize).div_ceil(8).clamp(1, 8)
}

/// Fewest bytes whose zero extension reproduces `value` (at least one).
pub fn unsigned_size(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// Bytes left once low-order zero bytes are dropped from a `width`-byte value.
pub fn right_zero_extended_size(bits: u64, width: usize) -> usize {
    let trailing = if bits == 0 {
        width - 1
    } else {
        (bits.trailing_zeros() as usize / 8).min(width - 1)
    };
    width - trailing
}

/// Write the low `size` bytes of `value`, little-endian.
pub fn write_sized(out: &mut Vec<u8>, value: u64, size: usize) {
    out.extend_from_slice(&value.to_le_bytes()[..size]);
}

/// Write tag plus minimal signed payload.
pub fn write_signed(out: &mut Vec<u8>, ty: ValueType, value: i64) {
    let size = signed_size(value);
    out.push(value_tag(ty, (size - 1) as u8));
    write_sized(out, value as u64, size);
}

/// Write tag plus minimal unsigned payload.
pub fn write_unsigned(out: &mut Vec<u8>, ty: ValueType, value: u64) {
    let size = unsigned_size(value);
    out.push(value_tag(ty, (size - 1) as u8));
    write_sized(out, value, size);
}

/// Write tag plus the high-order bytes of a `width`-byte value.
pub fn write_right_zero_extended(out: &mut Vec<u8>, ty: ValueType, bits: u64, width: usize) {
    let size = right_zero_extended_size(bits, width);
    out.push(value_tag(ty, (size - 1) as u8));
    let shifted = bits >> ((width - size) * 8);
    write_sized(out, shifted, size);
}

/// Read `size` bytes as a sign-extended integer.
pub fn read_signed(bytes: &[u8], size: usize) -> i64 {
    let raw = read_unsigned(bytes, size);
    let shift = 64 - size * 8;
    ((raw << shift) as i64) >> shift
}

/// Read `size` bytes as a zero-extended integer.
pub fn read_unsigned(bytes: &[u8], size: usize) -> u64 {
    assert!((1..=8).contains(&size) && bytes.len() >= size, "bad payload size");
    let mut buf = [0u8; 8];
    buf[..size].copy_from_slice(&bytes[..size]);
    u64::from_le_bytes(buf)
}

/// Read `size` bytes as the high-order bytes of a `width`-byte value.
pub fn read_right_zero_extended(bytes: &[u8], size: usize, width: usize) -> u64 {
    read_unsigned(bytes, size) << ((width - size) * 8)
}
