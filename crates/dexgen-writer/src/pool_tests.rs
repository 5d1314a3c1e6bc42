use dexgen_core::DescriptorError;
use dexgen_format::MemberRef;

use super::error::PoolError;
use super::pool::{ConstantPool, Handle, PoolEntry, PoolKind};

#[test]
fn same_string_twice_is_one_entry() {
    let mut pool = ConstantPool::new();
    let a = pool.string("hello").unwrap();
    let b = pool.string("hello").unwrap();
    pool.close().unwrap();

    assert_eq!(a, b);
    assert_eq!(pool.len(PoolKind::String), 1);
    let r = pool.resolver().unwrap();
    assert_eq!(r.string(a), r.string(b));
    assert_eq!(r.string(a), 0);
}

#[test]
fn handles_equal_iff_structurally_equal() {
    let mut pool = ConstantPool::new();
    let entries = [
        PoolEntry::String("x"),
        PoolEntry::Type("LA;"),
        PoolEntry::Proto("(I)V"),
        PoolEntry::Proto("(J)V"),
        PoolEntry::Field(MemberRef::new("LA;", "x", "I")),
        PoolEntry::Field(MemberRef::new("LA;", "x", "J")),
        PoolEntry::Method(MemberRef::new("LA;", "x", "(I)V")),
        PoolEntry::Method(MemberRef::new("LB;", "x", "(I)V")),
    ];

    let first: Vec<Handle> = entries
        .iter()
        .map(|e| pool.resolve_or_insert(*e).unwrap())
        .collect();
    let second: Vec<Handle> = entries
        .iter()
        .map(|e| pool.resolve_or_insert(*e).unwrap())
        .collect();

    assert_eq!(first, second);
    for (i, a) in first.iter().enumerate() {
        for (j, b) in first.iter().enumerate() {
            assert_eq!(a == b, i == j, "{:?} vs {:?}", entries[i], entries[j]);
        }
    }
}

#[test]
fn references_insert_their_parts() {
    let mut pool = ConstantPool::new();
    pool.method(MemberRef::new("LA;", "run", "(ILjava/lang/String;)J"))
        .unwrap();

    // JIL J I Ljava/lang/String; LA; run
    assert_eq!(pool.len(PoolKind::String), 6);
    assert_eq!(pool.len(PoolKind::Type), 4);
    assert_eq!(pool.len(PoolKind::Proto), 1);
    assert_eq!(pool.len(PoolKind::Method), 1);
}

#[test]
fn strings_sort_by_utf16_units() {
    let mut pool = ConstantPool::new();
    for s in ["b", "\u{10000}", "a", "\u{ffff}", "", "B"] {
        pool.string(s).unwrap();
    }
    pool.close().unwrap();

    let r = pool.resolver().unwrap();
    let sorted: Vec<&str> = r.strings().collect();
    assert_eq!(sorted, ["", "B", "a", "b", "\u{10000}", "\u{ffff}"]);
    assert_eq!(r.string_at(4), "\u{10000}");
    assert_eq!(r.string_at(5), "\u{ffff}");
}

#[test]
fn categories_sort_by_final_indices() {
    let mut pool = ConstantPool::new();
    let m_b = pool.method(MemberRef::new("LB;", "m", "()V")).unwrap();
    let m_a2 = pool.method(MemberRef::new("LA;", "z", "()V")).unwrap();
    let m_a1 = pool.method(MemberRef::new("LA;", "m", "(I)V")).unwrap();
    let m_a0 = pool.method(MemberRef::new("LA;", "m", "()V")).unwrap();
    let f_b = pool.field(MemberRef::new("LB;", "f", "I")).unwrap();
    let f_a = pool.field(MemberRef::new("LA;", "f", "LB;")).unwrap();
    let types = ["V", "LB;", "I", "LA;"].map(|desc| pool.type_ref(desc).unwrap());
    pool.close().unwrap();

    let r = pool.resolver().unwrap();
    assert_eq!(r.method(m_a0), 0);
    assert_eq!(r.method(m_a1), 1);
    assert_eq!(r.method(m_a2), 2);
    assert_eq!(r.method(m_b), 3);
    assert_eq!(r.field(f_a), 0);
    assert_eq!(r.field(f_b), 1);

    assert_eq!(types.map(|ty| r.type_index(ty)), [3, 2, 0, 1]);
    let by_index: Vec<&str> = (0..r.len(PoolKind::Type) as u32)
        .map(|i| r.type_at(i))
        .collect();
    assert_eq!(by_index, ["I", "LA;", "LB;", "V"]);

    // ()V before (I)V: same return type, shorter parameter list first
    let protos: Vec<_> = r.proto_ids().collect();
    assert_eq!(protos[0].params, Vec::<u32>::new());
    assert_eq!(protos[1].params, [0]);
}

#[test]
fn protos_sort_by_return_type_first() {
    let mut pool = ConstantPool::new();
    let v = pool.proto("(I)V").unwrap();
    let i = pool.proto("(J)I").unwrap();
    pool.close().unwrap();

    let r = pool.resolver().unwrap();
    assert_eq!(r.proto(i), 0);
    assert_eq!(r.proto(v), 1);
}

#[test]
fn closed_pool_rejects_inserts() {
    let mut pool = ConstantPool::new();
    assert_eq!(pool.resolver().err(), Some(PoolError::NotClosed));
    pool.close().unwrap();

    assert_eq!(pool.string("late"), Err(PoolError::Closed));
    assert_eq!(pool.type_ref("LA;"), Err(PoolError::Closed));
    assert_eq!(pool.close(), Err(PoolError::Closed));
}

#[test]
fn malformed_descriptors() {
    let mut pool = ConstantPool::new();
    assert_eq!(
        pool.type_ref("LA"),
        Err(PoolError::MalformedDescriptor(DescriptorError::Type(
            "LA".to_owned()
        )))
    );
    assert!(pool.proto("(I").is_err());
    assert!(pool.field(MemberRef::new("LA;", "f", "Q")).is_err());
}

#[test]
fn void_field_type_is_rejected() {
    let mut pool = ConstantPool::new();
    assert_eq!(
        pool.field(MemberRef::new("LA;", "f", "V")),
        Err(PoolError::MalformedDescriptor(DescriptorError::Type(
            "V".to_owned()
        )))
    );
    assert_eq!(pool.len(PoolKind::Field), 0);
    // still a valid return type
    assert!(pool.type_ref("V").is_ok());
}

#[test]
fn too_many_types() {
    let mut pool = ConstantPool::new();
    for i in 0..=65536 {
        pool.type_ref(&format!("LT{i};")).unwrap();
    }

    insta::assert_snapshot!(pool.close().unwrap_err(), @"too many types: 65537 (max 65536)");
}

#[test]
fn seeded_pool_keeps_final_order() {
    let mut source = ConstantPool::new();
    source.method(MemberRef::new("LZ;", "b", "(LA;)V")).unwrap();
    source.field(MemberRef::new("LA;", "a", "I")).unwrap();
    source.close().unwrap();

    let mut seeded = ConstantPool::seeded(&source).unwrap();
    assert!(seeded.is_presorted());
    // re-inserting existing entries keeps the pool presorted
    let m = seeded.method(MemberRef::new("LZ;", "b", "(LA;)V")).unwrap();
    assert!(seeded.is_presorted());
    seeded.close().unwrap();

    let (src, dst) = (source.resolver().unwrap(), seeded.resolver().unwrap());
    assert!(src.strings().eq(dst.strings()));
    assert!(src.type_ids().eq(dst.type_ids()));
    assert!(src.proto_ids().eq(dst.proto_ids()));
    assert!(src.field_ids().eq(dst.field_ids()));
    assert!(src.method_ids().eq(dst.method_ids()));
    assert_eq!(dst.method(m), 0);
}

#[test]
fn seeded_pool_sorts_again_after_new_entries() {
    let mut source = ConstantPool::new();
    source.string("m").unwrap();
    source.close().unwrap();

    let mut seeded = ConstantPool::seeded(&source).unwrap();
    let a = seeded.string("a").unwrap();
    assert!(!seeded.is_presorted());
    seeded.close().unwrap();

    let r = seeded.resolver().unwrap();
    assert_eq!(r.string(a), 0);
    assert_eq!(r.strings().collect::<Vec<_>>(), ["a", "m"]);
}

#[test]
fn seeding_needs_closed_source() {
    let open = ConstantPool::new();
    assert_eq!(
        ConstantPool::seeded(&open).err(),
        Some(PoolError::NotClosed)
    );
}

#[test]
fn rollback_forgets_later_entries() {
    let mut pool = ConstantPool::new();
    let kept = pool.type_ref("LKept;").unwrap();
    let checkpoint = pool.checkpoint();
    pool.method(MemberRef::new("LGone;", "run", "()V")).unwrap();
    pool.rollback(checkpoint);

    assert_eq!(pool.len(PoolKind::String), 1);
    assert_eq!(pool.len(PoolKind::Type), 1);
    assert_eq!(pool.len(PoolKind::Proto), 0);
    assert_eq!(pool.len(PoolKind::Method), 0);
    assert_eq!(pool.type_ref("LKept;").unwrap(), kept);
}
