use dexgen_core::AccessFlags;
use dexgen_format::constants::{CHECKSUM_OFFSET, SIGNATURE_OFFSET, SIGNATURE_SIZE};
use dexgen_format::{ApplicationVisitor, ClassVisitor, MapItemType, dump};
use indoc::indoc;
use sha1::{Digest, Sha1};

use crate::config::WriterConfig;
use crate::test_utils::{sample_bytes, view};
use crate::writer::ApplicationWriter;

fn write(build: impl FnOnce(&mut ApplicationWriter)) -> Vec<u8> {
    let mut writer = ApplicationWriter::new();
    build(&mut writer);
    writer.visit_end().unwrap();
    writer.into_bytes().unwrap()
}

#[test]
fn empty_container_is_header_and_map() {
    let bytes = write(|_| {});
    assert_eq!(bytes.len(), 0x8c);

    let view = view(&bytes);
    insta::assert_snapshot!(dump(&view).unwrap(), @r"
    [header]
    version = 035
    file_size = 0x8c
    map_off = 0x70
    data = 28 @ 0x70

    [map]
    0x0000 header_item                   1 @ 0x0
    0x1000 map_list                      1 @ 0x70
    ");
}

#[test]
fn bare_class_layout() {
    let bytes = write(|w| {
        let class = w
            .visit_class(AccessFlags::PUBLIC, "LA;", None, None, &[])
            .unwrap()
            .unwrap();
        class.visit_end();
    });

    let view = view(&bytes);
    insta::assert_snapshot!(dump(&view).unwrap(), @r#"
    [header]
    version = 035
    file_size = 0xec
    map_off = 0xa0
    string_ids = 1 @ 0x70
    type_ids = 1 @ 0x74
    class_defs = 1 @ 0x78
    data = 84 @ 0x98

    [map]
    0x0000 header_item                   1 @ 0x0
    0x0001 string_id_item                1 @ 0x70
    0x0002 type_id_item                  1 @ 0x74
    0x0006 class_def_item                1 @ 0x78
    0x2002 string_data_item              1 @ 0x98
    0x1000 map_list                      1 @ 0xa0

    [strings]
    S0 "LA;"

    [types]
    T0 S0 LA;
    "#);

    let def = view.header().class_defs.off as usize;
    assert_eq!(view.u32_at(def, "class_idx").unwrap(), 0);
    assert_eq!(view.u32_at(def + 4, "access").unwrap(), 0x1);
    // superclass, source file
    assert_eq!(view.u32_at(def + 8, "superclass").unwrap(), u32::MAX);
    assert_eq!(view.u32_at(def + 16, "source_file").unwrap(), u32::MAX);
    // interfaces, annotations, class data, static values
    for field in [12, 20, 24, 28] {
        assert_eq!(view.u32_at(def + field, "class_def").unwrap(), 0);
    }
}

#[test]
fn signature_and_checksum_cover_the_file() {
    let bytes = sample_bytes(WriterConfig::default());

    let digest = Sha1::digest(&bytes[SIGNATURE_OFFSET + SIGNATURE_SIZE..]);
    assert_eq!(
        &bytes[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE_SIZE],
        digest.as_slice()
    );

    let checksum = adler32::adler32(&bytes[SIGNATURE_OFFSET..]).unwrap();
    let stored = u32::from_le_bytes(
        bytes[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4]
            .try_into()
            .unwrap(),
    );
    assert_eq!(stored, checksum);
}

#[test]
fn map_agrees_with_header() {
    let bytes = sample_bytes(WriterConfig::default());
    let view = view(&bytes);
    let h = view.header();

    let pairs = [
        (MapItemType::StringIdItem, h.string_ids),
        (MapItemType::TypeIdItem, h.type_ids),
        (MapItemType::ProtoIdItem, h.proto_ids),
        (MapItemType::FieldIdItem, h.field_ids),
        (MapItemType::MethodIdItem, h.method_ids),
        (MapItemType::ClassDefItem, h.class_defs),
    ];
    for (kind, section) in pairs {
        let item = view.section(kind).unwrap();
        assert_eq!((item.count, item.offset), (section.size, section.off), "{kind:?}");
    }

    let map = view.map();
    for pair in map.windows(2) {
        assert!(pair[0].offset < pair[1].offset, "{pair:?}");
    }
    for item in map {
        assert_eq!(item.offset as usize % item.kind.alignment(), 0, "{item:?}");
    }

    let first_data = map.iter().find(|item| item.kind.is_data()).unwrap();
    assert_eq!(h.data.off, first_data.offset);
    assert_eq!(h.data.off + h.data.size, h.file_size);
    assert_eq!(view.section(MapItemType::MapList).unwrap().offset, h.map_off);
}

#[test]
fn supertypes_are_defined_first() {
    let bytes = sample_bytes(WriterConfig::default());
    let view = view(&bytes);
    let defs = view.header().class_defs;
    assert_eq!(defs.size, 2);

    let names: Vec<String> = (0..defs.size)
        .map(|i| {
            let class_idx = view
                .u32_at(defs.off as usize + 32 * i as usize, "class_idx")
                .unwrap();
            view.type_descriptor(class_idx).unwrap()
        })
        .collect();
    assert_eq!(names, ["LGreeter;", "LHello;"]);
}

#[test]
fn sample_sections() {
    let bytes = sample_bytes(WriterConfig::default());
    let view = view(&bytes);
    let count = |kind| view.section(kind).map_or(0, |item| item.count);

    // <init> and main; greet is abstract
    assert_eq!(count(MapItemType::CodeItem), 2);
    assert_eq!(count(MapItemType::DebugInfoItem), 1);
    // Hello and Greeter both have members
    assert_eq!(count(MapItemType::ClassDataItem), 2);
    assert_eq!(count(MapItemType::EncodedArrayItem), 1);
    assert_eq!(count(MapItemType::AnnotationsDirectoryItem), 1);
    assert_eq!(count(MapItemType::AnnotationItem), 1);
}

#[test]
fn static_values_follow_field_order() {
    let bytes = sample_bytes(WriterConfig::default());
    let view = view(&bytes);
    let array = view.section(MapItemType::EncodedArrayItem).unwrap().offset as usize;

    // COUNT = 3, then GREETING = "hi" with a one-byte string index
    assert_eq!(bytes[array..array + 4], [2, 0x04, 0x03, 0x17]);
}

#[test]
fn debug_info_can_be_disabled() {
    let bytes = sample_bytes(WriterConfig::new().with_debug_info(false));
    let view = view(&bytes);

    assert!(view.section(MapItemType::DebugInfoItem).is_none());
    assert!(view.section(MapItemType::CodeItem).is_some());
}

#[test]
fn sample_tables() {
    let bytes = sample_bytes(WriterConfig::default());
    let text = dump(&view(&bytes)).unwrap();

    assert!(text.ends_with(indoc! {r#"
        [strings]
        S00 "<init>"
        S01 "COUNT"
        S02 "GREETING"
        S03 "Hello.java"
        S04 "I"
        S05 "LGreeter;"
        S06 "LHello;"
        S07 "LMarker;"
        S08 "Ljava/lang/Exception;"
        S09 "Ljava/lang/Object;"
        S10 "Ljava/lang/String;"
        S11 "V"
        S12 "VL"
        S13 "[Ljava/lang/String;"
        S14 "args"
        S15 "greet"
        S16 "hi"
        S17 "main"
        S18 "name"
        S19 "value"

        [types]
        T0 S4 I
        T1 S5 LGreeter;
        T2 S6 LHello;
        T3 S7 LMarker;
        T4 S8 Ljava/lang/Exception;
        T5 S9 Ljava/lang/Object;
        T6 S10 Ljava/lang/String;
        T7 S11 V
        T8 S13 [Ljava/lang/String;
    "#}), "{text}");
}
