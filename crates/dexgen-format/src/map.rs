//! Map list items.
//!
//! The map list trails the data region: a u32 count followed by one 12-byte
//! item per non-empty section, ordered by offset.

/// Size of one `map_item` in bytes.
pub const MAP_ITEM_SIZE: u32 = 12;

/// Section kind codes stored in `map_item.type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum MapItemType {
    HeaderItem = 0x0000,
    StringIdItem = 0x0001,
    TypeIdItem = 0x0002,
    ProtoIdItem = 0x0003,
    FieldIdItem = 0x0004,
    MethodIdItem = 0x0005,
    ClassDefItem = 0x0006,
    MapList = 0x1000,
    TypeList = 0x1001,
    AnnotationSetRefList = 0x1002,
    AnnotationSetItem = 0x1003,
    ClassDataItem = 0x2000,
    CodeItem = 0x2001,
    StringDataItem = 0x2002,
    DebugInfoItem = 0x2003,
    AnnotationItem = 0x2004,
    EncodedArrayItem = 0x2005,
    AnnotationsDirectoryItem = 0x2006,
}

impl MapItemType {
    /// Emission order of every section in a produced container.
    pub const LAYOUT_ORDER: [Self; 18] = [
        Self::HeaderItem,
        Self::StringIdItem,
        Self::TypeIdItem,
        Self::ProtoIdItem,
        Self::FieldIdItem,
        Self::MethodIdItem,
        Self::ClassDefItem,
        Self::AnnotationSetRefList,
        Self::AnnotationSetItem,
        Self::CodeItem,
        Self::AnnotationsDirectoryItem,
        Self::TypeList,
        Self::StringDataItem,
        Self::DebugInfoItem,
        Self::AnnotationItem,
        Self::EncodedArrayItem,
        Self::ClassDataItem,
        Self::MapList,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::LAYOUT_ORDER.into_iter().find(|t| t.code() == code)
    }

    /// Required alignment of items of this kind.
    pub fn alignment(self) -> usize {
        match self {
            Self::StringDataItem
            | Self::DebugInfoItem
            | Self::AnnotationItem
            | Self::EncodedArrayItem
            | Self::ClassDataItem => 1,
            _ => 4,
        }
    }

    /// Fixed item size, for the index sections.
    pub fn item_size(self) -> Option<u32> {
        match self {
            Self::HeaderItem => Some(0x70),
            Self::StringIdItem | Self::TypeIdItem => Some(4),
            Self::ProtoIdItem => Some(12),
            Self::FieldIdItem | Self::MethodIdItem => Some(8),
            Self::ClassDefItem => Some(32),
            _ => None,
        }
    }

    /// Whether items of this kind live in the data region.
    pub fn is_data(self) -> bool {
        !matches!(
            self,
            Self::HeaderItem
                | Self::StringIdItem
                | Self::TypeIdItem
                | Self::ProtoIdItem
                | Self::FieldIdItem
                | Self::MethodIdItem
                | Self::ClassDefItem
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::HeaderItem => "header_item",
            Self::StringIdItem => "string_id_item",
            Self::TypeIdItem => "type_id_item",
            Self::ProtoIdItem => "proto_id_item",
            Self::FieldIdItem => "field_id_item",
            Self::MethodIdItem => "method_id_item",
            Self::ClassDefItem => "class_def_item",
            Self::MapList => "map_list",
            Self::TypeList => "type_list",
            Self::AnnotationSetRefList => "annotation_set_ref_list",
            Self::AnnotationSetItem => "annotation_set_item",
            Self::ClassDataItem => "class_data_item",
            Self::CodeItem => "code_item",
            Self::StringDataItem => "string_data_item",
            Self::DebugInfoItem => "debug_info_item",
            Self::AnnotationItem => "annotation_item",
            Self::EncodedArrayItem => "encoded_array_item",
            Self::AnnotationsDirectoryItem => "annotations_directory_item",
        }
    }
}

/// One entry of the map list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapItem {
    pub kind: MapItemType,
    pub count: u32,
    pub offset: u32,
}

impl MapItem {
    pub fn new(kind: MapItemType, count: u32, offset: u32) -> Self {
        Self { kind, count, offset }
    }

    pub fn to_bytes(&self) -> [u8; MAP_ITEM_SIZE as usize] {
        let mut bytes = [0u8; MAP_ITEM_SIZE as usize];
        bytes[0..2].copy_from_slice(&self.kind.code().to_le_bytes());
        bytes[4..8].copy_from_slice(&self.count.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.offset.to_le_bytes());
        bytes
    }

    /// Decode one item. Returns `None` for an unknown type code.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        assert!(bytes.len() >= MAP_ITEM_SIZE as usize, "map item too short");
        let code = u16::from_le_bytes([bytes[0], bytes[1]]);
        let count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let offset = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        Some(Self::new(MapItemType::from_code(code)?, count, offset))
    }
}
