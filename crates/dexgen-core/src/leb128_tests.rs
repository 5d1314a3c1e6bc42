use crate::leb128::{
    read_sleb128, read_uleb128, uleb128_len, write_sleb128, write_uleb128, write_uleb128p1,
};

fn uleb(value: u32) -> Vec<u8> {
    let mut out = Vec::new();
    write_uleb128(&mut out, value);
    out
}

fn sleb(value: i32) -> Vec<u8> {
    let mut out = Vec::new();
    write_sleb128(&mut out, value);
    out
}

#[test]
fn uleb128_known_encodings() {
    assert_eq!(uleb(0), [0x00]);
    assert_eq!(uleb(1), [0x01]);
    assert_eq!(uleb(127), [0x7f]);
    assert_eq!(uleb(128), [0x80, 0x01]);
    assert_eq!(uleb(16256), [0x80, 0x7f]);
    assert_eq!(uleb(u32::MAX), [0xff, 0xff, 0xff, 0xff, 0x0f]);
}

#[test]
fn sleb128_known_encodings() {
    assert_eq!(sleb(0), [0x00]);
    assert_eq!(sleb(1), [0x01]);
    assert_eq!(sleb(-1), [0x7f]);
    assert_eq!(sleb(-128), [0x80, 0x7f]);
    assert_eq!(sleb(63), [0x3f]);
    assert_eq!(sleb(64), [0xc0, 0x00]);
}

#[test]
fn uleb128p1_encodes_none_as_zero() {
    let mut out = Vec::new();
    write_uleb128p1(&mut out, None);
    write_uleb128p1(&mut out, Some(0));
    write_uleb128p1(&mut out, Some(127));
    assert_eq!(out, [0x00, 0x01, 0x80, 0x01]);
}

#[test]
fn uleb128_len_matches_encoding() {
    for value in [0, 1, 127, 128, 16383, 16384, 1 << 21, 1 << 28, u32::MAX] {
        assert_eq!(uleb128_len(value), uleb(value).len(), "value {value}");
    }
}

#[test]
fn readers_decode_what_writers_produce() {
    let mut bytes = Vec::new();
    write_uleb128(&mut bytes, 300);
    write_sleb128(&mut bytes, -300);
    write_sleb128(&mut bytes, i32::MIN);

    let mut pos = 0;
    assert_eq!(read_uleb128(&bytes, &mut pos), Some(300));
    assert_eq!(read_sleb128(&bytes, &mut pos), Some(-300));
    assert_eq!(read_sleb128(&bytes, &mut pos), Some(i32::MIN));
    assert_eq!(pos, bytes.len());
}

#[test]
fn read_uleb128_rejects_truncated_input() {
    let mut pos = 0;
    assert_eq!(read_uleb128(&[0x80, 0x80], &mut pos), None);
}
