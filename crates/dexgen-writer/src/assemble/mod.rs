//! Container assembly: section layout, byte emission, checksum and signature.
//!
//! Sections are placed in a fixed order. Every item is aligned as its kind
//! requires, empty sections are left out of the map, and the data region runs
//! from the first data section to the end of the map list. The header is
//! written last: SHA-1 over everything after the signature, then Adler-32
//! over everything after the checksum.

mod items;
mod order;

#[cfg(test)]
mod assemble_tests;

use dexgen_core::leb128::write_uleb128;
use dexgen_core::mutf8;
use dexgen_format::constants::{CHECKSUM_OFFSET, SIGNATURE_OFFSET, SIGNATURE_SIZE};
use dexgen_format::{HEADER_SIZE, Header, MAP_ITEM_SIZE, MapItem, MapItemType, SectionRef};
use sha1::{Digest, Sha1};

use crate::class::ClassRecord;
use crate::config::WriterConfig;
use crate::error::WriteError;
use crate::pool::{PoolKind, Resolver};

use items::DataItems;
use order::class_order;

/// Produce the container bytes for the committed classes.
pub(crate) fn assemble(
    classes: &[ClassRecord],
    resolver: &Resolver<'_>,
    config: &WriterConfig,
) -> Result<Vec<u8>, WriteError> {
    let order = class_order(classes);
    let items = items::collect(classes, &order, resolver, config)?;
    let strings: Vec<Vec<u8>> = resolver.strings().map(string_data).collect();

    let mut p = Placer::default();
    p.place(MapItemType::HeaderItem, [HEADER_SIZE]);
    let string_ids = p.fixed(MapItemType::StringIdItem, resolver.len(PoolKind::String));
    let type_ids = p.fixed(MapItemType::TypeIdItem, resolver.len(PoolKind::Type));
    let proto_ids = p.fixed(MapItemType::ProtoIdItem, resolver.len(PoolKind::Proto));
    let field_ids = p.fixed(MapItemType::FieldIdItem, resolver.len(PoolKind::Field));
    let method_ids = p.fixed(MapItemType::MethodIdItem, resolver.len(PoolKind::Method));
    let class_defs = p.fixed(MapItemType::ClassDefItem, items.class_defs.len());

    let ref_list_offs = p.place(
        MapItemType::AnnotationSetRefList,
        items.ref_lists.iter().map(|l| 4 + 4 * l.len() as u32),
    );
    let set_offs = p.place(
        MapItemType::AnnotationSetItem,
        items.annotation_sets.iter().map(|s| 4 + 4 * s.len() as u32),
    );
    let code_offs = p.place(
        MapItemType::CodeItem,
        items.codes.iter().map(|c| c.size() as u32),
    );
    let directory_offs = p.place(
        MapItemType::AnnotationsDirectoryItem,
        items.directories.iter().map(|d| d.size()),
    );
    let type_list_offs = p.place(
        MapItemType::TypeList,
        items.type_lists.iter().map(|l| 4 + 2 * l.len() as u32),
    );
    let string_data_offs = p.place(
        MapItemType::StringDataItem,
        strings.iter().map(|s| s.len() as u32),
    );
    let debug_codes: Vec<usize> = (0..items.codes.len())
        .filter(|&i| items.codes[i].debug_info.is_some())
        .collect();
    let debug_offs = p.place(
        MapItemType::DebugInfoItem,
        debug_codes
            .iter()
            .map(|&i| items.codes[i].debug_info.as_ref().map_or(0, |d| d.len() as u32)),
    );
    let annotation_offs = p.place(
        MapItemType::AnnotationItem,
        items.annotations.iter().map(|a| a.len() as u32),
    );
    let array_offs = p.place(
        MapItemType::EncodedArrayItem,
        items.arrays.iter().map(|a| a.len() as u32),
    );
    let class_data: Vec<(usize, Vec<u8>)> = items
        .class_defs
        .iter()
        .enumerate()
        .filter_map(|(i, def)| def.data.as_ref().map(|d| (i, d.encode(&code_offs))))
        .collect();
    let class_data_offs = p.place(
        MapItemType::ClassDataItem,
        class_data.iter().map(|(_, bytes)| bytes.len() as u32),
    );
    let map_count = p.map.len() as u32 + 1;
    let map_off = p.place(MapItemType::MapList, [4 + MAP_ITEM_SIZE * map_count])[0];
    let file_size = p.cursor;

    let offsets = Offsets {
        ref_lists: &ref_list_offs,
        sets: &set_offs,
        codes: &code_offs,
        directories: &directory_offs,
        type_lists: &type_list_offs,
        string_data: &string_data_offs,
        annotations: &annotation_offs,
        arrays: &array_offs,
        debug: debug_codes
            .iter()
            .zip(&debug_offs)
            .fold(vec![0; items.codes.len()], |mut acc, (&code, &off)| {
                acc[code] = off;
                acc
            }),
        class_data: class_data.iter().zip(&class_data_offs).fold(
            vec![0; items.class_defs.len()],
            |mut acc, ((def, _), &off)| {
                acc[*def] = off;
                acc
            },
        ),
    };

    let mut out = vec![0u8; HEADER_SIZE as usize];
    let mut w = Emitter { out: &mut out };

    w.at(string_ids.off);
    for off in &string_data_offs {
        w.u32(*off);
    }
    w.at(type_ids.off);
    for descriptor in resolver.type_ids() {
        w.u32(descriptor);
    }
    w.at(proto_ids.off);
    for (proto, params) in resolver.proto_ids().zip(&items.proto_params) {
        w.u32(proto.shorty);
        w.u32(proto.ret);
        w.u32(params.map_or(0, |l| type_list_offs[l]));
    }
    w.at(field_ids.off);
    for field in resolver.field_ids() {
        w.u16(field.owner as u16);
        w.u16(field.kind as u16);
        w.u32(field.name);
    }
    w.at(method_ids.off);
    for method in resolver.method_ids() {
        w.u16(method.owner as u16);
        w.u16(method.kind as u16);
        w.u32(method.name);
    }
    w.at(class_defs.off);
    for (i, def) in items.class_defs.iter().enumerate() {
        w.u32(def.class_idx);
        w.u32(def.access);
        w.u32(def.superclass);
        w.u32(def.interfaces.map_or(0, |l| type_list_offs[l]));
        w.u32(def.source_file);
        w.u32(def.directory.map_or(0, |d| directory_offs[d]));
        w.u32(offsets.class_data[i]);
        w.u32(def.static_values.map_or(0, |a| array_offs[a]));
    }

    w.data_items(&items, &offsets, &strings, &class_data, &class_data_offs);

    w.at(map_off);
    w.u32(map_count);
    for item in &p.map {
        w.bytes(&item.to_bytes());
    }
    debug_assert_eq!(out.len() as u32, file_size);

    let data_off = p
        .map
        .iter()
        .find(|item| item.kind.is_data())
        .map_or(map_off, |item| item.offset);
    let header = Header {
        file_size,
        map_off,
        string_ids,
        type_ids,
        proto_ids,
        field_ids,
        method_ids,
        class_defs,
        data: SectionRef::new(file_size - data_off, data_off),
        ..Header::new(config.version())
    };
    out[..HEADER_SIZE as usize].copy_from_slice(&header.to_bytes());
    sign(&mut out)?;

    tracing::debug!(
        file_size,
        sections = p.map.len(),
        classes = items.class_defs.len(),
        codes = items.codes.len(),
        "container assembled"
    );
    Ok(out)
}

/// SHA-1 signature, then the Adler-32 checksum that covers it.
fn sign(out: &mut [u8]) -> Result<(), WriteError> {
    let signature_at = SIGNATURE_OFFSET;
    let digest = Sha1::digest(&out[signature_at + SIGNATURE_SIZE..]);
    out[signature_at..signature_at + SIGNATURE_SIZE].copy_from_slice(&digest);

    let checksum_at = CHECKSUM_OFFSET;
    let checksum = adler32::adler32(&out[signature_at..]).map_err(WriteError::Checksum)?;
    out[checksum_at..checksum_at + 4].copy_from_slice(&checksum.to_le_bytes());
    Ok(())
}

/// `string_data_item`: UTF-16 length, Modified UTF-8 bytes, NUL.
fn string_data(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    write_uleb128(&mut out, mutf8::utf16_len(s) as u32);
    out.extend(mutf8::encode(s));
    out.push(0);
    out
}

/// Assigns offsets section by section and records the map.
#[derive(Default)]
struct Placer {
    cursor: u32,
    map: Vec<MapItem>,
}

impl Placer {
    /// Place items of `sizes` in order; returns their offsets.
    fn place(&mut self, kind: MapItemType, sizes: impl IntoIterator<Item = u32>) -> Vec<u32> {
        let align = kind.alignment() as u32;
        let offsets: Vec<u32> = sizes
            .into_iter()
            .map(|size| {
                self.cursor = self.cursor.next_multiple_of(align);
                let off = self.cursor;
                self.cursor += size;
                off
            })
            .collect();
        if let Some(&first) = offsets.first() {
            tracing::trace!(section = kind.name(), count = offsets.len(), offset = first, "placed");
            self.map.push(MapItem::new(kind, offsets.len() as u32, first));
        }
        offsets
    }

    /// Place a fixed-size index section; an empty one has offset zero.
    fn fixed(&mut self, kind: MapItemType, count: usize) -> SectionRef {
        let size = kind.item_size().unwrap_or(0);
        let offsets = self.place(kind, std::iter::repeat_n(size, count));
        SectionRef::new(count as u32, offsets.first().copied().unwrap_or(0))
    }
}

struct Offsets<'a> {
    ref_lists: &'a [u32],
    sets: &'a [u32],
    codes: &'a [u32],
    directories: &'a [u32],
    type_lists: &'a [u32],
    string_data: &'a [u32],
    annotations: &'a [u32],
    arrays: &'a [u32],
    /// Debug info offset per code item, zero when it has none.
    debug: Vec<u32>,
    /// Class data offset per class definition, zero when it has none.
    class_data: Vec<u32>,
}

struct Emitter<'a> {
    out: &'a mut Vec<u8>,
}

impl Emitter<'_> {
    /// Pad with zeros up to `offset`.
    fn at(&mut self, offset: u32) {
        let offset = offset as usize;
        debug_assert!(offset >= self.out.len() || offset == 0);
        if offset > self.out.len() {
            self.out.resize(offset, 0);
        }
    }

    fn u16(&mut self, value: u16) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    fn data_items(
        &mut self,
        items: &DataItems,
        offsets: &Offsets<'_>,
        strings: &[Vec<u8>],
        class_data: &[(usize, Vec<u8>)],
        class_data_offs: &[u32],
    ) {
        for (list, &off) in items.ref_lists.iter().zip(offsets.ref_lists) {
            self.at(off);
            self.u32(list.len() as u32);
            for set in list {
                self.u32(set.map_or(0, |s| offsets.sets[s]));
            }
        }
        for (set, &off) in items.annotation_sets.iter().zip(offsets.sets) {
            self.at(off);
            self.u32(set.len() as u32);
            for &item in set {
                self.u32(offsets.annotations[item]);
            }
        }
        for (i, (code, &off)) in items.codes.iter().zip(offsets.codes).enumerate() {
            self.at(off);
            code.write(offsets.debug[i], self.out);
        }
        for (dir, &off) in items.directories.iter().zip(offsets.directories) {
            self.at(off);
            self.u32(dir.class.map_or(0, |s| offsets.sets[s]));
            self.u32(dir.fields.len() as u32);
            self.u32(dir.methods.len() as u32);
            self.u32(dir.params.len() as u32);
            for &(index, set) in dir.fields.iter().chain(&dir.methods) {
                self.u32(index);
                self.u32(offsets.sets[set]);
            }
            for &(index, list) in &dir.params {
                self.u32(index);
                self.u32(offsets.ref_lists[list]);
            }
        }
        for (list, &off) in items.type_lists.iter().zip(offsets.type_lists) {
            self.at(off);
            self.u32(list.len() as u32);
            for &ty in list {
                self.u16(ty as u16);
            }
        }
        for (s, &off) in strings.iter().zip(offsets.string_data) {
            self.at(off);
            self.bytes(s);
        }
        for (code, &off) in items.codes.iter().zip(&offsets.debug) {
            if let Some(debug) = &code.debug_info {
                self.at(off);
                self.bytes(debug);
            }
        }
        for (item, &off) in items.annotations.iter().zip(offsets.annotations) {
            self.at(off);
            self.bytes(item);
        }
        for (array, &off) in items.arrays.iter().zip(offsets.arrays) {
            self.at(off);
            self.bytes(array);
        }
        for ((_, bytes), &off) in class_data.iter().zip(class_data_offs) {
            self.at(off);
            self.bytes(bytes);
        }
    }
}
