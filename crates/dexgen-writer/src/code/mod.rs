//! Method bodies.
//!
//! Instructions are lowered into pool handles as they are visited. Once the
//! pool is closed a body is compiled into a [`CodeItem`]:
//! - layout assigns addresses, narrowing `goto`s to their smallest form
//! - encode writes the code units and trailing payloads
//! - tries splits try/catch blocks into disjoint ranges
//! - debug writes the line-number program

mod debug;
mod encode;
mod layout;
mod tries;

#[cfg(test)]
mod layout_tests;
#[cfg(test)]
mod tries_tests;

use std::collections::HashSet;

use dexgen_format::{Format, Insn, Label, Opcode, Registers};

use crate::error::{EncodeError, PoolError};
use crate::pool::{ConstantPool, FieldId, MethodId, Resolver, StringId, TypeId};

pub(crate) use layout::Layout;
pub(crate) use tries::TryItem;

/// Argument registers, owned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Args {
    List(Vec<u16>),
    Range { first: u16, count: u16 },
}

impl Args {
    fn from_registers(regs: Registers<'_>) -> Self {
        match regs {
            Registers::List(regs) => Self::List(regs.to_vec()),
            Registers::Range { first, count } => Self::Range { first, count },
        }
    }

    fn words(&self) -> u16 {
        match self {
            Self::List(regs) => regs.len() as u16,
            Self::Range { count, .. } => *count,
        }
    }

    fn registers(&self) -> Vec<u16> {
        match self {
            Self::List(regs) => regs.clone(),
            Self::Range { first, count } => (0..*count).map(|i| first + i).collect(),
        }
    }
}

/// Instruction with pool references resolved to handles.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Instr {
    Op { opcode: Opcode, a: u16, b: u16, c: u16 },
    Const { opcode: Opcode, dest: u16, value: i64 },
    Literal { opcode: Opcode, dest: u16, src: u16, value: i32 },
    String { dest: u16, string: StringId },
    Type { opcode: Opcode, a: u16, b: u16, ty: TypeId },
    Field { opcode: Opcode, value: u16, object: u16, field: FieldId },
    Invoke { opcode: Opcode, args: Args, method: MethodId },
    FilledNewArray { args: Args, ty: TypeId },
    Jump { opcode: Opcode, target: Label, a: u16, b: u16 },
    PackedSwitch { reg: u16, first_key: i32, targets: Vec<Label> },
    SparseSwitch { reg: u16, keys: Vec<i32>, targets: Vec<Label> },
    FillArrayData { reg: u16, element_width: u16, data: Vec<u8> },
}

impl Instr {
    fn lower(pool: &mut ConstantPool, insn: Insn<'_>) -> Result<Self, PoolError> {
        Ok(match insn {
            Insn::Op { opcode, a, b, c } => Self::Op { opcode, a, b, c },
            Insn::Const {
                opcode,
                dest,
                value,
            } => Self::Const {
                opcode,
                dest,
                value,
            },
            Insn::Literal {
                opcode,
                dest,
                src,
                value,
            } => Self::Literal {
                opcode,
                dest,
                src,
                value,
            },
            Insn::String { dest, value } => Self::String {
                dest,
                string: pool.string(value)?,
            },
            Insn::Type { opcode, a, b, desc } => Self::Type {
                opcode,
                a,
                b,
                ty: pool.type_ref(desc)?,
            },
            Insn::Field {
                opcode,
                value,
                object,
                field,
            } => Self::Field {
                opcode,
                value,
                object,
                field: pool.field(field)?,
            },
            Insn::Invoke {
                opcode,
                args,
                method,
            } => Self::Invoke {
                opcode,
                args: Args::from_registers(args),
                method: pool.method(method)?,
            },
            Insn::FilledNewArray { args, desc } => Self::FilledNewArray {
                args: Args::from_registers(args),
                ty: pool.type_ref(desc)?,
            },
            Insn::Jump {
                opcode,
                target,
                a,
                b,
            } => Self::Jump {
                opcode,
                target,
                a,
                b,
            },
            Insn::PackedSwitch {
                reg,
                first_key,
                targets,
            } => Self::PackedSwitch {
                reg,
                first_key,
                targets: targets.to_vec(),
            },
            Insn::SparseSwitch { reg, keys, targets } => Self::SparseSwitch {
                reg,
                keys: keys.to_vec(),
                targets: targets.to_vec(),
            },
            Insn::FillArrayData {
                reg,
                element_width,
                data,
            } => Self::FillArrayData {
                reg,
                element_width,
                data: data.to_vec(),
            },
        })
    }

    /// Labels this instruction branches to.
    fn targets(&self) -> &[Label] {
        match self {
            Self::Jump { target, .. } => std::slice::from_ref(target),
            Self::PackedSwitch { targets, .. } | Self::SparseSwitch { targets, .. } => targets,
            _ => &[],
        }
    }

    /// Registers one past the highest this instruction touches.
    fn registers_needed(&self) -> u32 {
        let (opcode, regs): (Option<Opcode>, Vec<u16>) = match self {
            Self::Op { opcode, a, b, c } => {
                let regs = match opcode.format() {
                    Some(Format::F10x) => vec![],
                    Some(Format::F11x) => vec![*a],
                    Some(Format::F23x) => vec![*a, *b, *c],
                    _ => vec![*a, *b],
                };
                (Some(*opcode), regs)
            }
            Self::Const { opcode, dest, .. } => (Some(*opcode), vec![*dest]),
            Self::Literal { dest, src, .. } => (None, vec![*dest, *src]),
            Self::String { dest, .. } => (None, vec![*dest]),
            Self::Type { opcode, a, b, .. } => {
                let regs = if opcode.format() == Some(Format::F22c) {
                    vec![*a, *b]
                } else {
                    vec![*a]
                };
                (None, regs)
            }
            Self::Field {
                opcode,
                value,
                object,
                ..
            } => {
                let mut regs = vec![*value];
                if opcode.format() == Some(Format::F22c) {
                    regs.push(*object);
                }
                (Some(*opcode), regs)
            }
            Self::Invoke { args, .. } | Self::FilledNewArray { args, .. } => {
                (None, args.registers())
            }
            Self::Jump { opcode, a, b, .. } => {
                let regs = if opcode.is_if_test() {
                    vec![*a, *b]
                } else if opcode.is_if_testz() {
                    vec![*a]
                } else {
                    vec![]
                };
                (None, regs)
            }
            Self::PackedSwitch { reg, .. }
            | Self::SparseSwitch { reg, .. }
            | Self::FillArrayData { reg, .. } => (None, vec![*reg]),
        };
        let width = if opcode.is_some_and(is_wide) { 2 } else { 1 };
        regs.into_iter()
            .map(|r| u32::from(r) + width)
            .max()
            .unwrap_or(0)
    }
}

/// Whether register operands of `opcode` may be register pairs.
fn is_wide(opcode: Opcode) -> bool {
    let name = opcode.name();
    name.contains("wide") || name.contains("long") || name.contains("double")
}

/// Instruction or label binding, in visit order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Item {
    Instr(Instr),
    Label(Label),
}

#[derive(Clone, Debug)]
pub(crate) struct TryBlock {
    pub start: Label,
    pub end: Label,
    pub handler: Label,
    pub exception: Option<TypeId>,
}

#[derive(Clone, Debug)]
pub(crate) struct LineEntry {
    pub line: u32,
    pub start: Label,
}

#[derive(Clone, Debug)]
pub(crate) struct LocalVar {
    pub name: StringId,
    pub ty: TypeId,
    pub signature: Option<StringId>,
    pub start: Label,
    pub end: Label,
    pub register: u16,
}

/// Accumulated body of one method.
#[derive(Clone, Debug, Default)]
pub(crate) struct CodeBody {
    pub items: Vec<Item>,
    pub tries: Vec<TryBlock>,
    pub lines: Vec<LineEntry>,
    pub locals: Vec<LocalVar>,
    pub registers: Option<u16>,
}

impl CodeBody {
    pub fn push(&mut self, pool: &mut ConstantPool, insn: Insn<'_>) -> Result<(), PoolError> {
        self.items.push(Item::Instr(Instr::lower(pool, insn)?));
        Ok(())
    }

    pub fn bind(&mut self, label: Label) {
        self.items.push(Item::Label(label));
    }

    fn instrs(&self) -> impl Iterator<Item = &Instr> {
        self.items.iter().filter_map(|item| match item {
            Item::Instr(instr) => Some(instr),
            Item::Label(_) => None,
        })
    }

    /// Every label must be bound exactly once and every referenced label bound.
    fn check_labels(&self) -> Result<(), EncodeError> {
        let mut bound = HashSet::new();
        for item in &self.items {
            if let Item::Label(label) = item
                && !bound.insert(*label)
            {
                return Err(EncodeError::DuplicateLabel(label.0));
            }
        }

        let referenced = self
            .instrs()
            .flat_map(|i| i.targets().iter().copied())
            .chain(
                self.tries
                    .iter()
                    .flat_map(|t| [t.start, t.end, t.handler]),
            )
            .chain(self.lines.iter().map(|l| l.start))
            .chain(self.locals.iter().flat_map(|l| [l.start, l.end]));
        for label in referenced {
            if !bound.contains(&label) {
                return Err(EncodeError::UnknownLabel(label.0));
            }
        }
        Ok(())
    }
}

/// What the body needs to know about its method.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MethodShape<'a> {
    /// Incoming argument words, receiver included.
    pub ins: u16,
    /// Declared parameter count (receiver excluded).
    pub params: usize,
    pub param_names: &'a [Option<StringId>],
    pub emit_debug_info: bool,
}

/// A compiled `code_item` plus its debug program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CodeItem {
    pub registers: u16,
    pub ins: u16,
    pub outs: u16,
    pub insns: Vec<u16>,
    pub tries: Vec<TryItem>,
    pub handlers: Vec<u8>,
    pub debug_info: Option<Vec<u8>>,
}

impl CodeItem {
    fn padding(&self) -> usize {
        if !self.tries.is_empty() && self.insns.len() % 2 == 1 {
            2
        } else {
            0
        }
    }

    /// Size of the `code_item` in bytes.
    pub fn size(&self) -> usize {
        16 + self.insns.len() * 2 + self.padding() + self.tries.len() * 8 + self.handlers.len()
    }

    pub fn write(&self, debug_info_off: u32, out: &mut Vec<u8>) {
        let start = out.len();
        out.extend_from_slice(&self.registers.to_le_bytes());
        out.extend_from_slice(&self.ins.to_le_bytes());
        out.extend_from_slice(&self.outs.to_le_bytes());
        out.extend_from_slice(&(self.tries.len() as u16).to_le_bytes());
        out.extend_from_slice(&debug_info_off.to_le_bytes());
        out.extend_from_slice(&(self.insns.len() as u32).to_le_bytes());
        for unit in &self.insns {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out.resize(out.len() + self.padding(), 0);
        for t in &self.tries {
            out.extend_from_slice(&t.start_addr.to_le_bytes());
            out.extend_from_slice(&t.insn_count.to_le_bytes());
            out.extend_from_slice(&t.handler_off.to_le_bytes());
        }
        out.extend_from_slice(&self.handlers);
        debug_assert_eq!(out.len() - start, self.size());
    }
}

/// Compile a body against the closed pool.
pub(crate) fn compile(
    body: &CodeBody,
    shape: MethodShape<'_>,
    resolver: &Resolver<'_>,
) -> Result<CodeItem, EncodeError> {
    body.check_labels()?;

    let layout = layout::layout(&body.items, resolver);
    let insns = encode::encode(&body.items, &layout, resolver)?;
    let (tries, handlers) = tries::build(&body.tries, &layout, resolver)?;

    let needed = body
        .instrs()
        .map(Instr::registers_needed)
        .max()
        .unwrap_or(0)
        .max(u32::from(shape.ins));
    let registers = match body.registers {
        Some(declared) if u32::from(declared) < needed => {
            return Err(EncodeError::FrameTooSmall { needed, declared });
        }
        Some(declared) => declared,
        None => u16::try_from(needed).map_err(|_| EncodeError::FrameTooSmall {
            needed,
            declared: u16::MAX,
        })?,
    };
    let outs = body
        .instrs()
        .filter_map(|i| match i {
            Instr::Invoke { args, .. } => Some(args.words()),
            _ => None,
        })
        .max()
        .unwrap_or(0);

    let debug_info = if shape.emit_debug_info {
        debug::encode(
            &debug::DebugInput {
                lines: &body.lines,
                locals: &body.locals,
                param_names: shape.param_names,
                params: shape.params,
            },
            &layout,
            resolver,
        )
    } else {
        None
    };

    Ok(CodeItem {
        registers,
        ins: shape.ins,
        outs,
        insns,
        tries,
        handlers,
        debug_info,
    })
}
