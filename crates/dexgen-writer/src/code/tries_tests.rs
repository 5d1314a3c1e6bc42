use dexgen_format::{Insn, Label, Opcode};

use super::{CodeBody, CodeItem, MethodShape, TryBlock, TryItem, compile};
use crate::error::EncodeError;
use crate::pool::ConstantPool;

const NOP: Insn<'static> = Insn::Op {
    opcode: Opcode::NOP,
    a: 0,
    b: 0,
    c: 0,
};
const RETURN_VOID: Insn<'static> = Insn::Op {
    opcode: Opcode::RETURN_VOID,
    a: 0,
    b: 0,
    c: 0,
};

/// Blocks are `(start, end, handler, exception)` over labels bound by `build`.
fn compile_tries(
    blocks: &[(u32, u32, u32, Option<&str>)],
    build: impl FnOnce(&mut CodeBody, &mut ConstantPool),
) -> Result<CodeItem, EncodeError> {
    let mut pool = ConstantPool::new();
    let mut body = CodeBody::default();
    build(&mut body, &mut pool);
    for (start, end, handler, exception) in blocks {
        let exception = exception.map(|desc| pool.type_ref(desc).unwrap());
        body.tries.push(TryBlock {
            start: Label(*start),
            end: Label(*end),
            handler: Label(*handler),
            exception,
        });
    }
    pool.close().unwrap();
    let shape = MethodShape {
        ins: 0,
        params: 0,
        param_names: &[],
        emit_debug_info: false,
    };
    compile(&body, shape, &pool.resolver().unwrap())
}

/// `L0 nop L1 nop L2 nop L3 L4 return-void L5 return-void`
fn straight_line(body: &mut CodeBody, pool: &mut ConstantPool) {
    for label in 0..3 {
        body.bind(Label(label));
        body.push(pool, NOP).unwrap();
    }
    body.bind(Label(3));
    body.bind(Label(4));
    body.push(pool, RETURN_VOID).unwrap();
    body.bind(Label(5));
    body.push(pool, RETURN_VOID).unwrap();
}

fn try_item(start_addr: u32, insn_count: u16, handler_off: u16) -> TryItem {
    TryItem {
        start_addr,
        insn_count,
        handler_off,
    }
}

#[test]
fn overlapping_blocks_split_into_disjoint_ranges() {
    let code = compile_tries(
        &[(0, 2, 4, Some("LE1;")), (1, 3, 5, None)],
        straight_line,
    )
    .unwrap();

    assert_eq!(
        code.tries,
        [try_item(0, 1, 1), try_item(1, 1, 4), try_item(2, 1, 8)]
    );
    assert_eq!(
        code.handlers,
        [
            3, // lists
            0x01, 0, 3, // LE1; -> 3
            0x7f, 0, 3, 4, // LE1; -> 3, catch-all -> 4
            0x00, 4, // catch-all -> 4
        ]
    );
}

#[test]
fn adjacent_ranges_with_same_handlers_merge() {
    let code = compile_tries(
        &[(0, 1, 4, Some("LE1;")), (1, 2, 4, Some("LE1;"))],
        straight_line,
    )
    .unwrap();

    assert_eq!(code.tries, [try_item(0, 2, 1)]);
    assert_eq!(code.handlers, [1, 0x01, 0, 3]);
}

#[test]
fn shared_handler_lists_are_written_once() {
    let code = compile_tries(
        &[(0, 1, 4, Some("LE1;")), (2, 3, 4, Some("LE1;"))],
        straight_line,
    )
    .unwrap();

    assert_eq!(code.tries, [try_item(0, 1, 1), try_item(2, 1, 1)]);
    assert_eq!(code.handlers, [1, 0x01, 0, 3]);
}

#[test]
fn first_catch_wins() {
    let code = compile_tries(
        &[
            (0, 3, 4, Some("LE1;")),
            (0, 3, 5, Some("LE1;")),
            (0, 3, 5, None),
            (0, 3, 4, None),
            (0, 3, 4, Some("LE2;")),
        ],
        straight_line,
    )
    .unwrap();

    assert_eq!(code.tries, [try_item(0, 3, 1)]);
    assert_eq!(code.handlers, [1, 0x7f, 0, 3, 4]);
}

#[test]
fn empty_blocks_are_dropped() {
    let code = compile_tries(&[(3, 4, 5, None)], straight_line).unwrap();

    assert!(code.tries.is_empty());
    assert!(code.handlers.is_empty());
}

#[test]
fn odd_code_is_padded_before_tries() {
    let code = compile_tries(&[(0, 3, 4, None)], straight_line).unwrap();
    assert_eq!(code.insns.len(), 5);

    let mut out = Vec::new();
    code.write(0, &mut out);
    assert_eq!(out.len(), code.size());
    assert_eq!(out.len(), 16 + 10 + 2 + 8 + 3);
    assert_eq!(&out[26..28], [0, 0]);
}

#[test]
fn range_longer_than_u16_is_rejected() {
    let result = compile_tries(&[(0, 1, 1, None)], |body, pool| {
        body.bind(Label(0));
        for _ in 0..0x1_0000 {
            body.push(pool, NOP).unwrap();
        }
        body.bind(Label(1));
        body.push(pool, RETURN_VOID).unwrap();
    });

    assert_eq!(result, Err(EncodeError::TryRangeTooLong(0x1_0000)));
}
