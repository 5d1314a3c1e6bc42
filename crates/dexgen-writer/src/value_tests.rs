use std::collections::BTreeSet;

use dexgen_format::encoding::{ValueType, read_signed, split_tag};
use dexgen_format::{AnnotationValue, MemberRef, Value};

use super::pool::ConstantPool;
use super::value::EncodedValue;

fn encode_closed(pool: &mut ConstantPool, value: &EncodedValue) -> Vec<u8> {
    if !pool.is_closed() {
        pool.close().unwrap();
    }
    let mut out = Vec::new();
    value.encode(&pool.resolver().unwrap(), &mut out);
    out
}

fn encode(value: EncodedValue) -> Vec<u8> {
    encode_closed(&mut ConstantPool::new(), &value)
}

#[test]
fn boolean_payload_lives_in_the_tag() {
    assert_eq!(encode(EncodedValue::Boolean(true)), [0x3f]);
    assert_eq!(encode(EncodedValue::Boolean(false)), [0x1f]);
    assert_eq!(encode(EncodedValue::Null), [0x1e]);
}

#[test]
fn integers_are_minimal() {
    assert_eq!(encode(EncodedValue::Byte(-1)), [0x00, 0xff]);
    assert_eq!(encode(EncodedValue::Short(-1)), [0x02, 0xff]);
    assert_eq!(encode(EncodedValue::Int(0)), [0x04, 0x00]);
    assert_eq!(encode(EncodedValue::Int(128)), [0x24, 0x80, 0x00]);
    assert_eq!(encode(EncodedValue::Int(-129)), [0x24, 0x7f, 0xff]);
    assert_eq!(encode(EncodedValue::Long(1 << 40)), [0xa6, 0, 0, 0, 0, 0, 0x01]);
    assert_eq!(encode(EncodedValue::Char(0x80)), [0x03, 0x80]);
}

#[test]
fn integers_round_trip() {
    for v in [i32::MIN, -32769, -1, 0, 1, 255, 256, 65535, i32::MAX] {
        let bytes = encode(EncodedValue::Int(v));
        let (ty, arg) = split_tag(bytes[0]).unwrap();
        assert_eq!(ty, ValueType::Int);
        assert_eq!(bytes.len(), arg as usize + 2);
        assert_eq!(read_signed(&bytes[1..], arg as usize + 1), i64::from(v));
    }
}

#[test]
fn floats_keep_high_bytes() {
    assert_eq!(encode(EncodedValue::Float(1.0)), [0x30, 0x80, 0x3f]);
    assert_eq!(encode(EncodedValue::Double(2.0)), [0x11, 0x40]);
    assert_eq!(encode(EncodedValue::Double(-0.0)), [0x11, 0x80]);
}

#[test]
fn references_use_final_indices() {
    let mut pool = ConstantPool::new();
    let value = EncodedValue::from_value(&mut pool, &Value::String("b")).unwrap();
    pool.string("a").unwrap();

    // "a" sorts first, so "b" lands at index 1
    assert_eq!(encode_closed(&mut pool, &value), [0x17, 0x01]);
}

#[test]
fn arrays_and_annotations() {
    let mut pool = ConstantPool::new();
    let annotation = AnnotationValue::new("LAnno;")
        .with("z", Value::Int(1))
        .with("a", Value::Array(vec![Value::Boolean(true), Value::Null]));
    let value = EncodedValue::from_value(&mut pool, &Value::Annotation(annotation)).unwrap();

    // strings: LAnno; a z -> type 0, names 1 and 2; elements sorted by name
    assert_eq!(
        encode_closed(&mut pool, &value),
        [0x1d, 0x00, 0x02, 0x01, 0x1c, 0x02, 0x3f, 0x1e, 0x02, 0x04, 0x01]
    );
}

#[test]
fn nested_annotation_names_each_element_once() {
    let mut pool = ConstantPool::new();
    let annotation = AnnotationValue::new("LAnno;")
        .with("a", Value::Int(1))
        .with("a", Value::Int(2));
    let err = EncodedValue::from_value(&mut pool, &Value::Annotation(annotation)).unwrap_err();

    insta::assert_snapshot!(err, @"annotation LAnno; sets element a twice");
}

#[test]
fn enum_values_reference_fields() {
    let mut pool = ConstantPool::new();
    let value = EncodedValue::from_value(
        &mut pool,
        &Value::Enum(MemberRef::new("LColor;", "RED", "LColor;")),
    )
    .unwrap();

    assert_eq!(value.value_type(), ValueType::Enum);
    assert_eq!(encode_closed(&mut pool, &value), [0x1b, 0x00]);
}

#[test]
fn defaults_per_field_type() {
    assert_eq!(EncodedValue::default_for("Z"), EncodedValue::Boolean(false));
    assert_eq!(EncodedValue::default_for("J"), EncodedValue::Long(0));
    assert_eq!(EncodedValue::default_for("D"), EncodedValue::Double(0.0));
    assert_eq!(EncodedValue::default_for("[I"), EncodedValue::Null);
    assert_eq!(EncodedValue::default_for("Ljava/lang/String;"), EncodedValue::Null);
    assert!(EncodedValue::default_for("F").is_default());
    assert!(!EncodedValue::Double(-0.0).is_default());
}

#[test]
fn ordering_dedups_values() {
    let set: BTreeSet<EncodedValue> = [
        EncodedValue::Int(2),
        EncodedValue::Boolean(true),
        EncodedValue::Int(1),
        EncodedValue::Int(2),
        EncodedValue::Boolean(false),
        EncodedValue::Double(f64::NAN),
        EncodedValue::Double(f64::NAN),
    ]
    .into_iter()
    .collect();

    assert_eq!(set.len(), 5);
    assert_eq!(
        EncodedValue::Boolean(false).compare_value(&EncodedValue::Boolean(true)),
        std::cmp::Ordering::Less
    );
}

#[test]
#[should_panic(expected = "cannot compare")]
fn mixed_kind_compare_panics() {
    EncodedValue::Int(1).compare_value(&EncodedValue::Long(1));
}
