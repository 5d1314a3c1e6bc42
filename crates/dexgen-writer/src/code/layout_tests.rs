use dexgen_format::{Insn, Label, Opcode};

use super::CodeBody;
use super::layout::{Layout, layout};
use crate::pool::ConstantPool;

fn op(opcode: Opcode) -> Insn<'static> {
    Insn::Op {
        opcode,
        a: 0,
        b: 0,
        c: 0,
    }
}

fn goto(target: u32) -> Insn<'static> {
    Insn::Jump {
        opcode: Opcode::GOTO,
        target: Label(target),
        a: 0,
        b: 0,
    }
}

fn lay_out(build: impl FnOnce(&mut CodeBody, &mut ConstantPool)) -> (CodeBody, Layout) {
    let mut pool = ConstantPool::new();
    let mut body = CodeBody::default();
    build(&mut body, &mut pool);
    pool.close().unwrap();
    let layout = layout(&body.items, &pool.resolver().unwrap());
    (body, layout)
}

#[test]
fn short_forward_goto_narrows_to_one_unit() {
    let (_, layout) = lay_out(|body, pool| {
        body.push(pool, goto(0)).unwrap();
        body.push(pool, op(Opcode::NOP)).unwrap();
        body.bind(Label(0));
        body.push(pool, op(Opcode::RETURN_VOID)).unwrap();
    });

    assert_eq!(layout.width(0), 1);
    assert_eq!(layout.label(Label(0)), 2);
    assert_eq!(layout.units(), 3);
}

#[test]
fn self_loop_keeps_goto_32() {
    let (_, layout) = lay_out(|body, pool| {
        body.bind(Label(0));
        body.push(pool, goto(0)).unwrap();
    });

    assert_eq!(layout.width(1), 3);
    assert_eq!(layout.code_end(), 3);
}

#[test]
fn long_goto_uses_goto_16() {
    let (_, layout) = lay_out(|body, pool| {
        body.push(pool, goto(0)).unwrap();
        for _ in 0..300 {
            body.push(pool, op(Opcode::NOP)).unwrap();
        }
        body.bind(Label(0));
        body.push(pool, op(Opcode::RETURN_VOID)).unwrap();
    });

    assert_eq!(layout.width(0), 2);
    assert_eq!(layout.label(Label(0)), 302);
}

#[test]
fn narrowing_one_goto_lets_another_narrow() {
    // the backward goto only reaches back in one unit once the forward
    // goto has shrunk to goto/16
    let (_, layout) = lay_out(|body, pool| {
        body.bind(Label(1));
        body.push(pool, goto(0)).unwrap();
        for _ in 0..126 {
            body.push(pool, op(Opcode::NOP)).unwrap();
        }
        body.bind(Label(0));
        body.push(pool, goto(1)).unwrap();
    });

    let last = 1 + 1 + 126 + 1;
    assert_eq!(layout.width(1), 2);
    assert_eq!(layout.width(last), 1);
    assert_eq!(layout.addr(last), 128);
}

#[test]
fn payloads_follow_code_on_even_addresses() {
    let targets = [Label(0)];
    let (_, layout) = lay_out(|body, pool| {
        body.push(
            pool,
            Insn::PackedSwitch {
                reg: 0,
                first_key: 0,
                targets: &targets,
            },
        )
        .unwrap();
        body.bind(Label(0));
        body.push(
            pool,
            Insn::FillArrayData {
                reg: 0,
                element_width: 1,
                data: &[1, 2, 3],
            },
        )
        .unwrap();
        body.push(pool, op(Opcode::RETURN_VOID)).unwrap();
    });

    assert_eq!(layout.code_end(), 7);
    // packed: 4 + 2 units at 8, fill: 4 + 2 units at 14
    assert_eq!(layout.payload(0), Some(8));
    assert_eq!(layout.payload(2), Some(14));
    assert_eq!(layout.payload(3), None);
    assert_eq!(layout.units(), 20);
}
