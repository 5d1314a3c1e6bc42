use super::encoding::{
    ValueType, read_right_zero_extended, read_signed, read_unsigned, right_zero_extended_size,
    signed_size, split_tag, unsigned_size, value_tag, write_right_zero_extended, write_signed,
    write_unsigned,
};

#[test]
fn tag_layout() {
    assert_eq!(value_tag(ValueType::Boolean, 1), 0x3f);
    assert_eq!(value_tag(ValueType::Boolean, 0), 0x1f);
    assert_eq!(value_tag(ValueType::Null, 0), 0x1e);
    assert_eq!(value_tag(ValueType::Int, 3), 0x64);
    assert_eq!(split_tag(0x64), Some((ValueType::Int, 3)));
    assert_eq!(split_tag(0x01), None);
}

#[test]
fn signed_sizes() {
    let cases: [(i64, usize); 10] = [
        (0, 1),
        (-1, 1),
        (127, 1),
        (128, 2),
        (-128, 1),
        (-129, 2),
        (32767, 2),
        (0x7fff_ffff, 4),
        (i64::MIN, 8),
        (i64::MAX, 8),
    ];
    for (value, size) in cases {
        assert_eq!(signed_size(value), size, "{value}");
    }
}

#[test]
fn unsigned_sizes() {
    assert_eq!(unsigned_size(0), 1);
    assert_eq!(unsigned_size(0xff), 1);
    assert_eq!(unsigned_size(0x100), 2);
    assert_eq!(unsigned_size(0xffff_ffff), 4);
}

#[test]
fn signed_payloads_are_minimal_and_exact() {
    for value in [0i64, 1, -1, 200, -200, 70_000, -70_000, i32::MIN as i64, i64::MAX] {
        let mut out = Vec::new();
        write_signed(&mut out, ValueType::Long, value);

        let (ty, arg) = split_tag(out[0]).unwrap();
        let size = arg as usize + 1;
        assert_eq!(ty, ValueType::Long);
        assert_eq!(out.len(), size + 1);
        assert_eq!(read_signed(&out[1..], size), value);
        if size > 1 {
            assert_ne!(read_signed(&out[1..], size - 1), value, "{value} not minimal");
        }
    }
}

#[test]
fn char_is_zero_extended() {
    let mut out = Vec::new();
    write_unsigned(&mut out, ValueType::Char, 0xffff);
    assert_eq!(out, [0x23, 0xff, 0xff]);
    assert_eq!(read_unsigned(&out[1..], 2), 0xffff);
}

#[test]
fn floats_drop_low_zero_bytes() {
    let mut out = Vec::new();
    write_right_zero_extended(&mut out, ValueType::Double, 1.0f64.to_bits(), 8);
    assert_eq!(out, [0x31, 0xf0, 0x3f]);
    assert_eq!(read_right_zero_extended(&out[1..], 2, 8), 1.0f64.to_bits());

    let mut out = Vec::new();
    write_right_zero_extended(&mut out, ValueType::Float, 0.0f32.to_bits().into(), 4);
    assert_eq!(out, [0x10, 0x00]);

    assert_eq!(right_zero_extended_size(0x3f80_0001, 4), 4);
}
