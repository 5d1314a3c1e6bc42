//! Producer-side instruction model.
//!
//! Instructions refer to branch targets through [`Label`]s and to pool
//! entries through descriptors and names. The writer resolves both: labels
//! become code-unit offsets, names become final pool indices.

use super::opcode::Opcode;

/// Branch target, bound to a position with `visit_label`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

/// Argument registers of an invoke-kind instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registers<'a> {
    /// Up to five explicit registers (`35c`).
    List(&'a [u16]),
    /// A contiguous run of registers (`3rc`).
    Range { first: u16, count: u16 },
}

/// Symbolic field or method reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemberRef<'a> {
    /// Descriptor of the declaring type.
    pub owner: &'a str,
    pub name: &'a str,
    /// Field type descriptor, or method descriptor.
    pub desc: &'a str,
}

impl<'a> MemberRef<'a> {
    pub fn new(owner: &'a str, name: &'a str, desc: &'a str) -> Self {
        Self { owner, name, desc }
    }
}

/// One instruction as handed to `MethodVisitor::visit_insn`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Insn<'a> {
    /// Register-only formats (`10x`, `12x`, `11x`, `22x`, `32x`, `23x`).
    /// Unused operands are ignored.
    Op { opcode: Opcode, a: u16, b: u16, c: u16 },
    /// `const` family. The value is checked against the opcode's literal width;
    /// `/high16` forms take the full value whose low bits must be zero.
    Const { opcode: Opcode, dest: u16, value: i64 },
    /// `binop/lit16` and `binop/lit8`.
    Literal { opcode: Opcode, dest: u16, src: u16, value: i32 },
    /// `const-string`; the jumbo form is chosen from the final string index.
    String { dest: u16, value: &'a str },
    /// Type-index instructions: `const-class`, `check-cast`, `new-instance`
    /// use `a`; `instance-of` and `new-array` use `a` and `b`.
    Type { opcode: Opcode, a: u16, b: u16, desc: &'a str },
    /// Instance and static field access. `object` is ignored for `sget`/`sput`.
    Field { opcode: Opcode, value: u16, object: u16, field: MemberRef<'a> },
    /// Method invocation; `/range` opcodes take [`Registers::Range`].
    Invoke { opcode: Opcode, args: Registers<'a>, method: MemberRef<'a> },
    /// `filled-new-array`, range form chosen from the argument kind.
    FilledNewArray { args: Registers<'a>, desc: &'a str },
    /// `goto` (any width; narrowed at layout), `if-test` and `if-testz`.
    Jump { opcode: Opcode, target: Label, a: u16, b: u16 },
    /// `packed-switch` with consecutive keys starting at `first_key`.
    PackedSwitch { reg: u16, first_key: i32, targets: &'a [Label] },
    /// `sparse-switch`; keys must be sorted ascending.
    SparseSwitch { reg: u16, keys: &'a [i32], targets: &'a [Label] },
    /// `fill-array-data`; `data` holds the little-endian elements.
    FillArrayData { reg: u16, element_width: u16, data: &'a [u8] },
}
