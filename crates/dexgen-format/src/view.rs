//! Read-only view over a produced container.
//!
//! Parses just enough to check a container: the header, the map list and the
//! string and type tables. Other sections are reachable through
//! [`ContainerView::section`] and the raw bytes.

use dexgen_core::leb128::read_uleb128;
use dexgen_core::{Mutf8Error, mutf8};

use super::constants::{ENDIAN_CONSTANT, HEADER_SIZE};
use super::header::Header;
use super::map::{MAP_ITEM_SIZE, MapItem, MapItemType};

/// Container parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("file too small: {0} bytes (minimum {HEADER_SIZE})")]
    FileTooSmall(usize),
    #[error("invalid magic")]
    InvalidMagic,
    #[error("unexpected endian tag 0x{0:08x}")]
    BadEndian(u32),
    #[error("size mismatch: header says {header} bytes, got {actual}")]
    SizeMismatch { header: u32, actual: usize },
    #[error("{what} at offset 0x{offset:x} is out of bounds")]
    OutOfBounds { what: &'static str, offset: usize },
    #[error("unknown map item type 0x{0:04x}")]
    UnknownMapItem(u16),
    #[error("{kind} index {index} out of range ({len} entries)")]
    IndexOutOfRange {
        kind: &'static str,
        index: u32,
        len: u32,
    },
    #[error("string data: {0}")]
    StringData(#[from] Mutf8Error),
}

/// Parsed view over container bytes.
#[derive(Debug)]
pub struct ContainerView<'a> {
    bytes: &'a [u8],
    header: Header,
    map: Vec<MapItem>,
}

impl<'a> ContainerView<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ViewError> {
        if bytes.len() < HEADER_SIZE as usize {
            return Err(ViewError::FileTooSmall(bytes.len()));
        }
        let header = Header::from_bytes(bytes);
        if !header.validate_magic() {
            return Err(ViewError::InvalidMagic);
        }
        if header.endian_tag != ENDIAN_CONSTANT {
            return Err(ViewError::BadEndian(header.endian_tag));
        }
        if header.file_size as usize != bytes.len() {
            return Err(ViewError::SizeMismatch {
                header: header.file_size,
                actual: bytes.len(),
            });
        }

        let map = parse_map(bytes, header.map_off as usize)?;
        Ok(Self { bytes, header, map })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn map(&self) -> &[MapItem] {
        &self.map
    }

    /// Map entry for a section kind, if present.
    pub fn section(&self, kind: MapItemType) -> Option<MapItem> {
        self.map.iter().copied().find(|item| item.kind == kind)
    }

    pub fn string_count(&self) -> u32 {
        self.header.string_ids.size
    }

    pub fn type_count(&self) -> u32 {
        self.header.type_ids.size
    }

    /// Decoded string at `index`.
    pub fn string(&self, index: u32) -> Result<String, ViewError> {
        let len = self.string_count();
        if index >= len {
            return Err(ViewError::IndexOutOfRange {
                kind: "string",
                index,
                len,
            });
        }
        let id_off = self.header.string_ids.off as usize + index as usize * 4;
        let data_off = self.u32_at(id_off, "string_id_item")? as usize;

        let mut pos = data_off;
        let oob = ViewError::OutOfBounds {
            what: "string_data_item",
            offset: data_off,
        };
        read_uleb128(self.bytes, &mut pos).ok_or_else(|| oob.clone())?;
        let rest = self.bytes.get(pos..).ok_or_else(|| oob.clone())?;
        let end = rest.iter().position(|&b| b == 0).ok_or(oob)?;
        Ok(mutf8::decode(&rest[..end])?)
    }

    /// All strings in index order.
    pub fn strings(&self) -> Result<Vec<String>, ViewError> {
        (0..self.string_count()).map(|i| self.string(i)).collect()
    }

    /// String index of the descriptor of type `index`.
    pub fn type_string_index(&self, index: u32) -> Result<u32, ViewError> {
        let len = self.type_count();
        if index >= len {
            return Err(ViewError::IndexOutOfRange {
                kind: "type",
                index,
                len,
            });
        }
        let off = self.header.type_ids.off as usize + index as usize * 4;
        self.u32_at(off, "type_id_item")
    }

    /// Descriptor of type `index`.
    pub fn type_descriptor(&self, index: u32) -> Result<String, ViewError> {
        self.string(self.type_string_index(index)?)
    }

    /// All type descriptors in index order.
    pub fn types(&self) -> Result<Vec<String>, ViewError> {
        (0..self.type_count())
            .map(|i| self.type_descriptor(i))
            .collect()
    }

    pub fn u32_at(&self, offset: usize, what: &'static str) -> Result<u32, ViewError> {
        self.bytes
            .get(offset..offset + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or(ViewError::OutOfBounds { what, offset })
    }
}

fn parse_map(bytes: &[u8], map_off: usize) -> Result<Vec<MapItem>, ViewError> {
    let oob = |offset| ViewError::OutOfBounds {
        what: "map_list",
        offset,
    };
    let count_bytes = bytes.get(map_off..map_off + 4).ok_or(oob(map_off))?;
    let count = u32::from_le_bytes([count_bytes[0], count_bytes[1], count_bytes[2], count_bytes[3]]);

    let mut items = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let off = map_off + 4 + i * MAP_ITEM_SIZE as usize;
        let raw = bytes
            .get(off..off + MAP_ITEM_SIZE as usize)
            .ok_or(oob(off))?;
        let item = MapItem::from_bytes(raw)
            .ok_or_else(|| ViewError::UnknownMapItem(u16::from_le_bytes([raw[0], raw[1]])))?;
        items.push(item);
    }
    Ok(items)
}
