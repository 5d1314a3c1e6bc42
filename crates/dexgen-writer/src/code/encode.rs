//! Instruction encoding into 16-bit code units.

use dexgen_format::constants::{FILL_ARRAY_DATA_IDENT, PACKED_SWITCH_IDENT, SPARSE_SWITCH_IDENT};
use dexgen_format::{Format, IndexKind, Opcode};

use super::layout::Layout;
use super::{Args, Instr, Item};
use crate::error::EncodeError;
use crate::pool::Resolver;

type Result<T> = std::result::Result<T, EncodeError>;

/// Encode every instruction, then the payloads in instruction order.
pub(crate) fn encode(items: &[Item], layout: &Layout, resolver: &Resolver<'_>) -> Result<Vec<u16>> {
    let mut out = Vec::with_capacity(layout.units() as usize);

    for (i, item) in items.iter().enumerate() {
        let Item::Instr(instr) = item else { continue };
        let before = out.len();
        Encoder {
            out: &mut out,
            layout,
            resolver,
            index: i,
        }
        .instr(instr)?;
        debug_assert_eq!((out.len() - before) as u32, layout.width(i), "{instr:?}");
    }
    debug_assert_eq!(out.len() as u32, layout.code_end());

    for (i, item) in items.iter().enumerate() {
        let Item::Instr(instr) = item else { continue };
        let Some(at) = layout.payload(i) else {
            continue;
        };
        if out.len() as u32 != at {
            out.push(u16::from(Opcode::NOP.0));
        }
        payload(&mut out, instr, layout.addr(i), layout)?;
    }
    debug_assert_eq!(out.len() as u32, layout.units());

    Ok(out)
}

struct Encoder<'a, 'r> {
    out: &'a mut Vec<u16>,
    layout: &'a Layout,
    resolver: &'a Resolver<'r>,
    index: usize,
}

impl Encoder<'_, '_> {
    fn instr(&mut self, instr: &Instr) -> Result<()> {
        match instr {
            Instr::Op { opcode, a, b, c } => self.op(*opcode, *a, *b, *c),
            Instr::Const {
                opcode,
                dest,
                value,
            } => self.constant(*opcode, *dest, *value),
            Instr::Literal {
                opcode,
                dest,
                src,
                value,
            } => self.literal(*opcode, *dest, *src, *value),
            Instr::String { dest, string } => {
                let index = self.resolver.string(*string);
                if self.layout.width(self.index) == 2 {
                    let op = Opcode::CONST_STRING;
                    let d = reg8(op, *dest)?;
                    self.emit(&[unit(op, d), index as u16]);
                } else {
                    let op = Opcode::CONST_STRING_JUMBO;
                    let d = reg8(op, *dest)?;
                    self.emit(&[unit(op, d), index as u16, (index >> 16) as u16]);
                }
                Ok(())
            }
            Instr::Type { opcode, a, b, ty } => {
                expect_index(*opcode, IndexKind::Type)?;
                let index = index16(*opcode, self.resolver.type_index(*ty))?;
                self.indexed(*opcode, *a, *b, index)
            }
            Instr::Field {
                opcode,
                value,
                object,
                field,
            } => {
                expect_index(*opcode, IndexKind::Field)?;
                let index = index16(*opcode, self.resolver.field(*field))?;
                self.indexed(*opcode, *value, *object, index)
            }
            Instr::Invoke {
                opcode,
                args,
                method,
            } => {
                if !opcode.is_invoke() {
                    return Err(mismatch(*opcode));
                }
                let index = index16(*opcode, self.resolver.method(*method))?;
                self.call(*opcode, args, index)
            }
            Instr::FilledNewArray { args, ty } => {
                let opcode = match args {
                    Args::List(_) => Opcode::FILLED_NEW_ARRAY,
                    Args::Range { .. } => Opcode::FILLED_NEW_ARRAY_RANGE,
                };
                let index = index16(opcode, self.resolver.type_index(*ty))?;
                self.call(opcode, args, index)
            }
            Instr::Jump {
                opcode,
                target,
                a,
                b,
            } => {
                let target = self.layout.label(*target);
                self.jump(*opcode, target, *a, *b)
            }
            Instr::PackedSwitch { reg, .. } => self.payload_ref(Opcode::PACKED_SWITCH, *reg),
            Instr::SparseSwitch { reg, .. } => self.payload_ref(Opcode::SPARSE_SWITCH, *reg),
            Instr::FillArrayData { reg, .. } => self.payload_ref(Opcode::FILL_ARRAY_DATA, *reg),
        }
    }

    fn emit(&mut self, units: &[u16]) {
        self.out.extend_from_slice(units);
    }

    fn op(&mut self, op: Opcode, a: u16, b: u16, c: u16) -> Result<()> {
        match format(op)? {
            Format::F10x => self.emit(&[u16::from(op.0)]),
            Format::F12x => {
                let (a, b) = (reg4(op, a)?, reg4(op, b)?);
                self.emit(&[unit(op, a | (b << 4))]);
            }
            Format::F11x => {
                let a = reg8(op, a)?;
                self.emit(&[unit(op, a)]);
            }
            Format::F22x => {
                let a = reg8(op, a)?;
                self.emit(&[unit(op, a), b]);
            }
            Format::F32x => self.emit(&[u16::from(op.0), a, b]),
            Format::F23x => {
                let (a, b, c) = (reg8(op, a)?, reg8(op, b)?, reg8(op, c)?);
                self.emit(&[unit(op, a), b | (c << 8)]);
            }
            _ => return Err(mismatch(op)),
        }
        Ok(())
    }

    fn constant(&mut self, op: Opcode, dest: u16, value: i64) -> Result<()> {
        let literal = |ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(EncodeError::LiteralOutOfRange {
                    opcode: op.name(),
                    value,
                })
            }
        };
        match format(op)? {
            Format::F11n => {
                let d = reg4(op, dest)?;
                literal((-8..=7).contains(&value))?;
                self.emit(&[unit(op, d | (((value as u16) & 0xf) << 4))]);
            }
            Format::F21s => {
                let d = reg8(op, dest)?;
                literal(i16::try_from(value).is_ok())?;
                self.emit(&[unit(op, d), value as u16]);
            }
            Format::F31i => {
                let d = reg8(op, dest)?;
                literal(i32::try_from(value).is_ok())?;
                self.emit(&[unit(op, d), value as u16, (value >> 16) as u16]);
            }
            Format::F21h if op == Opcode::CONST_HIGH16 => {
                let d = reg8(op, dest)?;
                literal(i32::try_from(value).is_ok() && value & 0xffff == 0)?;
                self.emit(&[unit(op, d), (value >> 16) as u16]);
            }
            Format::F21h => {
                let d = reg8(op, dest)?;
                literal(value & 0xffff_ffff_ffff == 0)?;
                self.emit(&[unit(op, d), (value >> 48) as u16]);
            }
            Format::F51l => {
                let d = reg8(op, dest)?;
                self.emit(&[
                    unit(op, d),
                    value as u16,
                    (value >> 16) as u16,
                    (value >> 32) as u16,
                    (value >> 48) as u16,
                ]);
            }
            _ => return Err(mismatch(op)),
        }
        Ok(())
    }

    fn literal(&mut self, op: Opcode, dest: u16, src: u16, value: i32) -> Result<()> {
        let out_of_range = || EncodeError::LiteralOutOfRange {
            opcode: op.name(),
            value: i64::from(value),
        };
        match format(op)? {
            Format::F22s => {
                let (d, s) = (reg4(op, dest)?, reg4(op, src)?);
                let lit = i16::try_from(value).map_err(|_| out_of_range())?;
                self.emit(&[unit(op, d | (s << 4)), lit as u16]);
            }
            Format::F22b => {
                let (d, s) = (reg8(op, dest)?, reg8(op, src)?);
                let lit = i8::try_from(value).map_err(|_| out_of_range())?;
                self.emit(&[unit(op, d), s | (u16::from(lit as u8) << 8)]);
            }
            _ => return Err(mismatch(op)),
        }
        Ok(())
    }

    /// `21c` or `22c` with a 16-bit pool index.
    fn indexed(&mut self, op: Opcode, a: u16, b: u16, index: u16) -> Result<()> {
        match format(op)? {
            Format::F21c => {
                let a = reg8(op, a)?;
                self.emit(&[unit(op, a), index]);
            }
            Format::F22c => {
                let (a, b) = (reg4(op, a)?, reg4(op, b)?);
                self.emit(&[unit(op, a | (b << 4)), index]);
            }
            _ => return Err(mismatch(op)),
        }
        Ok(())
    }

    /// `35c` or `3rc` argument lists.
    fn call(&mut self, op: Opcode, args: &Args, index: u16) -> Result<()> {
        match (format(op)?, args) {
            (Format::F35c, Args::List(regs)) if regs.len() <= 5 => {
                let mut packed = [0u16; 5];
                for (slot, r) in packed.iter_mut().zip(regs) {
                    *slot = reg4(op, *r)?;
                }
                let [c, d, e, f, g] = packed;
                let count = regs.len() as u16;
                self.emit(&[
                    unit(op, g | (count << 4)),
                    index,
                    c | (d << 4) | (e << 8) | (f << 12),
                ]);
            }
            (Format::F3rc, Args::Range { first, count }) => {
                let count = reg8(op, *count).map_err(|_| mismatch(op))?;
                if u32::from(*first) + u32::from(count) > 0x1_0000 {
                    return Err(EncodeError::RegisterOutOfRange {
                        opcode: op.name(),
                        register: u32::from(*first) + u32::from(count) - 1,
                    });
                }
                self.emit(&[unit(op, count), index, *first]);
            }
            _ => return Err(mismatch(op)),
        }
        Ok(())
    }

    fn jump(&mut self, op: Opcode, target: u32, a: u16, b: u16) -> Result<()> {
        let offset = i64::from(target) - i64::from(self.layout.addr(self.index));
        if op.is_goto() {
            match self.layout.width(self.index) {
                1 => self.emit(&[unit(Opcode::GOTO, u16::from(offset as i8 as u8))]),
                2 => self.emit(&[u16::from(Opcode::GOTO_16.0), offset as u16]),
                _ => self.emit(&[
                    u16::from(Opcode::GOTO_32.0),
                    offset as u16,
                    (offset >> 16) as u16,
                ]),
            }
            return Ok(());
        }

        // a conditional branch to itself has no encoding
        let branch = i16::try_from(offset)
            .ok()
            .filter(|&b| b != 0)
            .ok_or(EncodeError::BranchOutOfRange {
                opcode: op.name(),
                offset,
            })?;
        if op.is_if_test() {
            let (a, b) = (reg4(op, a)?, reg4(op, b)?);
            self.emit(&[unit(op, a | (b << 4)), branch as u16]);
        } else if op.is_if_testz() {
            let a = reg8(op, a)?;
            self.emit(&[unit(op, a), branch as u16]);
        } else {
            return Err(mismatch(op));
        }
        Ok(())
    }

    /// `31t` pointing at this instruction's payload.
    fn payload_ref(&mut self, op: Opcode, reg: u16) -> Result<()> {
        let r = reg8(op, reg)?;
        let at = self.layout.payload(self.index).unwrap_or(0);
        let offset = at as i32 - self.layout.addr(self.index) as i32;
        self.emit(&[unit(op, r), offset as u16, (offset >> 16) as u16]);
        Ok(())
    }
}

fn payload(out: &mut Vec<u16>, instr: &Instr, base: u32, layout: &Layout) -> Result<()> {
    let rel = |label| layout.label(label) as i32 - base as i32;
    let push_i32 = |out: &mut Vec<u16>, v: i32| {
        out.push(v as u16);
        out.push((v >> 16) as u16);
    };
    match instr {
        Instr::PackedSwitch {
            first_key, targets, ..
        } => {
            let size = u16::try_from(targets.len()).map_err(|_| mismatch(Opcode::PACKED_SWITCH))?;
            out.extend([PACKED_SWITCH_IDENT, size]);
            push_i32(out, *first_key);
            for target in targets {
                push_i32(out, rel(*target));
            }
        }
        Instr::SparseSwitch { keys, targets, .. } => {
            if keys.len() != targets.len() {
                return Err(EncodeError::SwitchArity {
                    keys: keys.len(),
                    targets: targets.len(),
                });
            }
            if keys.windows(2).any(|w| w[0] >= w[1]) {
                return Err(EncodeError::UnsortedSwitchKeys);
            }
            let size = u16::try_from(keys.len()).map_err(|_| mismatch(Opcode::SPARSE_SWITCH))?;
            out.extend([SPARSE_SWITCH_IDENT, size]);
            for key in keys {
                push_i32(out, *key);
            }
            for target in targets {
                push_i32(out, rel(*target));
            }
        }
        Instr::FillArrayData {
            element_width,
            data,
            ..
        } => {
            let width = *element_width;
            if !matches!(width, 1 | 2 | 4 | 8) || data.len() % usize::from(width) != 0 {
                return Err(EncodeError::BadArrayData {
                    len: data.len(),
                    width,
                });
            }
            out.extend([FILL_ARRAY_DATA_IDENT, width]);
            push_i32(out, (data.len() / usize::from(width)) as i32);
            for pair in data.chunks(2) {
                let hi = pair.get(1).copied().unwrap_or(0);
                out.push(u16::from_le_bytes([pair[0], hi]));
            }
        }
        _ => {}
    }
    Ok(())
}

/// First code unit: opcode in the low byte, `high` above it.
fn unit(op: Opcode, high: u16) -> u16 {
    u16::from(op.0) | (high << 8)
}

fn format(op: Opcode) -> Result<Format> {
    op.format().ok_or(EncodeError::UnsupportedOpcode(op.0))
}

fn mismatch(op: Opcode) -> EncodeError {
    EncodeError::OperandMismatch { opcode: op.name() }
}

fn expect_index(op: Opcode, kind: IndexKind) -> Result<()> {
    if op.index_kind() == kind {
        Ok(())
    } else {
        Err(mismatch(op))
    }
}

fn reg4(op: Opcode, reg: u16) -> Result<u16> {
    register(op, reg, 0xf)
}

fn reg8(op: Opcode, reg: u16) -> Result<u16> {
    register(op, reg, 0xff)
}

fn register(op: Opcode, reg: u16, max: u16) -> Result<u16> {
    if reg <= max {
        Ok(reg)
    } else {
        Err(EncodeError::RegisterOutOfRange {
            opcode: op.name(),
            register: u32::from(reg),
        })
    }
}

fn index16(op: Opcode, index: u32) -> Result<u16> {
    u16::try_from(index).map_err(|_| EncodeError::IndexOutOfRange {
        opcode: op.name(),
        index,
    })
}
