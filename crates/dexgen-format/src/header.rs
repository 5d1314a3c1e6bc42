//! Container header (112 bytes).
//!
//! Layout:
//! - 0-7: magic (`dex\n` + three version digits + NUL)
//! - 8-11: Adler-32 checksum of everything after this field
//! - 12-31: SHA-1 signature of everything after this field
//! - 32-55: file size, header size, endian tag, link size/offset, map offset
//! - 56-111: (size, offset) pairs for string ids, type ids, proto ids,
//!   field ids, method ids, class defs and the data region

use super::constants::{DEFAULT_VERSION, ENDIAN_CONSTANT, HEADER_SIZE, SIGNATURE_SIZE, magic};

/// Size and offset of one header-described section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SectionRef {
    pub size: u32,
    pub off: u32,
}

impl SectionRef {
    pub fn new(size: u32, off: u32) -> Self {
        Self { size, off }
    }
}

/// File header - first 112 bytes of the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 8],
    pub checksum: u32,
    pub signature: [u8; SIGNATURE_SIZE],
    pub file_size: u32,
    pub header_size: u32,
    pub endian_tag: u32,
    /// Always zero: static linking is not produced.
    pub link: SectionRef,
    pub map_off: u32,
    pub string_ids: SectionRef,
    pub type_ids: SectionRef,
    pub proto_ids: SectionRef,
    pub field_ids: SectionRef,
    pub method_ids: SectionRef,
    pub class_defs: SectionRef,
    pub data: SectionRef,
}

impl Default for Header {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION)
    }
}

impl Header {
    /// Empty header for the given format version.
    pub fn new(version: u32) -> Self {
        Self {
            magic: magic(version),
            checksum: 0,
            signature: [0; SIGNATURE_SIZE],
            file_size: 0,
            header_size: HEADER_SIZE,
            endian_tag: ENDIAN_CONSTANT,
            link: SectionRef::default(),
            map_off: 0,
            string_ids: SectionRef::default(),
            type_ids: SectionRef::default(),
            proto_ids: SectionRef::default(),
            field_ids: SectionRef::default(),
            method_ids: SectionRef::default(),
            class_defs: SectionRef::default(),
            data: SectionRef::default(),
        }
    }

    /// Decode header from the first 112 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= HEADER_SIZE as usize, "header too short");

        let u32_at = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };
        let section_at = |offset: usize| SectionRef::new(u32_at(offset), u32_at(offset + 4));

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[0..8]);
        let mut signature = [0u8; SIGNATURE_SIZE];
        signature.copy_from_slice(&bytes[12..32]);

        Self {
            magic,
            checksum: u32_at(8),
            signature,
            file_size: u32_at(32),
            header_size: u32_at(36),
            endian_tag: u32_at(40),
            link: section_at(44),
            map_off: u32_at(52),
            string_ids: section_at(56),
            type_ids: section_at(64),
            proto_ids: section_at(72),
            field_ids: section_at(80),
            method_ids: section_at(88),
            class_defs: section_at(96),
            data: section_at(104),
        }
    }

    /// Encode header to 112 bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE as usize] {
        let mut bytes = [0u8; HEADER_SIZE as usize];
        let mut put = |offset: usize, value: u32| {
            bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        };

        put(8, self.checksum);
        put(32, self.file_size);
        put(36, self.header_size);
        put(40, self.endian_tag);
        let sections = [
            (44, self.link),
            (56, self.string_ids),
            (64, self.type_ids),
            (72, self.proto_ids),
            (80, self.field_ids),
            (88, self.method_ids),
            (96, self.class_defs),
            (104, self.data),
        ];
        for (offset, section) in sections {
            put(offset, section.size);
            put(offset + 4, section.off);
        }
        put(52, self.map_off);

        bytes[0..8].copy_from_slice(&self.magic);
        bytes[12..32].copy_from_slice(&self.signature);
        bytes
    }

    pub fn version(&self) -> Option<u32> {
        super::constants::magic_version(&self.magic)
    }

    pub fn validate_magic(&self) -> bool {
        self.version().is_some()
    }

    pub fn validate_endian(&self) -> bool {
        self.endian_tag == ENDIAN_CONSTANT
    }
}
