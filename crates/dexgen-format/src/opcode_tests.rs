use super::opcode::{Format, IndexKind, Opcode};

#[test]
fn table_lookup() {
    let info = Opcode::CONST_STRING.info().unwrap();
    assert_eq!(info.name, "const-string");
    assert_eq!(info.format, Format::F21c);
    assert_eq!(info.index, IndexKind::String);

    assert_eq!(Opcode(0x2a), Opcode::GOTO_32);
    assert_eq!(Opcode::INVOKE_STATIC_RANGE.name(), "invoke-static/range");
    assert_eq!(Opcode::RSUB_INT_LIT8.name(), "rsub-int/lit8");
}

#[test]
fn unused_codes() {
    for code in [0x3e, 0x43, 0x73, 0x79, 0x7a, 0xe3, 0xff] {
        assert_eq!(Opcode(code).info(), None, "0x{code:02x}");
    }
    assert_eq!(Opcode(0x73).name(), "<unused>");
}

#[test]
fn widths() {
    assert_eq!(Format::F10t.units(), 1);
    assert_eq!(Format::F20t.units(), 2);
    assert_eq!(Format::F30t.units(), 3);
    assert_eq!(Format::F51l.units(), 5);
    assert_eq!(Opcode::CONST_WIDE.format().map(Format::units), Some(5));
}

#[test]
fn classification() {
    assert!(Opcode::GOTO_16.is_goto());
    assert!(!Opcode::IF_EQ.is_goto());
    assert!(Opcode::IF_LE.is_if_test());
    assert!(!Opcode::IF_EQZ.is_if_test());
    assert!(Opcode::IF_LEZ.is_if_testz());
    assert!(Opcode::INVOKE_INTERFACE.is_invoke());
    assert!(Opcode::INVOKE_DIRECT_RANGE.is_range());
    assert!(!Opcode::FILLED_NEW_ARRAY.is_invoke());
    assert!(Opcode::FILLED_NEW_ARRAY_RANGE.is_range());
    assert!(Opcode::SPARSE_SWITCH.is_switch());
}

#[test]
fn display() {
    insta::assert_snapshot!(format!("{:?}", Opcode::IGET_OBJECT), @"Opcode(0x54 iget-object)");
}
