//! Format constants.

/// First four magic bytes; the version digits and a NUL follow.
pub const MAGIC_PREFIX: [u8; 4] = *b"dex\n";

/// Format version written when none is configured.
pub const DEFAULT_VERSION: u32 = 35;

/// Versions the writer knows how to label.
pub const SUPPORTED_VERSIONS: [u32; 4] = [35, 37, 38, 39];

/// Size of `header_item` in bytes.
pub const HEADER_SIZE: u32 = 0x70;

/// Endian tag for little-endian files.
pub const ENDIAN_CONSTANT: u32 = 0x1234_5678;

/// Sentinel for an absent index.
pub const NO_INDEX: u32 = 0xffff_ffff;

/// Byte offsets of the fields written after everything else.
pub const CHECKSUM_OFFSET: usize = 8;
pub const SIGNATURE_OFFSET: usize = 12;
pub const SIGNATURE_SIZE: usize = 20;

/// Debug info state machine opcodes.
pub const DBG_END_SEQUENCE: u8 = 0x00;
pub const DBG_ADVANCE_PC: u8 = 0x01;
pub const DBG_ADVANCE_LINE: u8 = 0x02;
pub const DBG_START_LOCAL: u8 = 0x03;
pub const DBG_START_LOCAL_EXTENDED: u8 = 0x04;
pub const DBG_END_LOCAL: u8 = 0x05;
pub const DBG_FIRST_SPECIAL: u8 = 0x0a;
pub const DBG_LINE_BASE: i32 = -4;
pub const DBG_LINE_RANGE: i32 = 15;

/// Payload pseudo-instruction identifiers.
pub const PACKED_SWITCH_IDENT: u16 = 0x0100;
pub const SPARSE_SWITCH_IDENT: u16 = 0x0200;
pub const FILL_ARRAY_DATA_IDENT: u16 = 0x0300;

/// Descriptors of the system annotations the writer generates.
pub const SIGNATURE_ANNOTATION: &str = "Ldalvik/annotation/Signature;";
pub const THROWS_ANNOTATION: &str = "Ldalvik/annotation/Throws;";

/// The 8 magic bytes for a format version, e.g. `dex\n035\0`.
pub fn magic(version: u32) -> [u8; 8] {
    let digits = format!("{:03}", version % 1000);
    let d = digits.as_bytes();
    [
        MAGIC_PREFIX[0],
        MAGIC_PREFIX[1],
        MAGIC_PREFIX[2],
        MAGIC_PREFIX[3],
        d[0],
        d[1],
        d[2],
        0,
    ]
}

/// Parse the version out of 8 magic bytes.
pub fn magic_version(magic: &[u8; 8]) -> Option<u32> {
    if magic[..4] != MAGIC_PREFIX || magic[7] != 0 {
        return None;
    }
    std::str::from_utf8(&magic[4..7]).ok()?.parse().ok()
}
