//! Code-unit addresses for a method body.
//!
//! Every `goto` starts in its widest form (`goto/32`). Each pass recomputes
//! addresses and narrows gotos whose offset fits a smaller form; a width never
//! grows again, so the loop terminates once a pass changes nothing. Switch and
//! array payloads follow the last instruction, each on an even address.

use std::collections::HashMap;

use dexgen_format::{Label, Opcode};

use super::{Instr, Item};
use crate::invariants::ensure_label;
use crate::pool::Resolver;

/// Final addresses of a body, in 16-bit code units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Layout {
    addrs: Vec<u32>,
    widths: Vec<u32>,
    labels: HashMap<Label, u32>,
    payloads: HashMap<usize, u32>,
    code_end: u32,
    units: u32,
}

impl Layout {
    /// Address of the item at `index`.
    pub fn addr(&self, index: usize) -> u32 {
        self.addrs[index]
    }

    /// Width of the item at `index`; zero for labels.
    pub fn width(&self, index: usize) -> u32 {
        self.widths[index]
    }

    pub fn label(&self, label: Label) -> u32 {
        ensure_label(self.labels.get(&label).copied(), label.0)
    }

    /// Payload address of the switch or `fill-array-data` at `index`.
    pub fn payload(&self, index: usize) -> Option<u32> {
        self.payloads.get(&index).copied()
    }

    /// Address just past the last instruction, before any payload.
    pub fn code_end(&self) -> u32 {
        self.code_end
    }

    /// Total length including payloads.
    pub fn units(&self) -> u32 {
        self.units
    }
}

pub(crate) fn layout(items: &[Item], resolver: &Resolver<'_>) -> Layout {
    let mut widths: Vec<u32> = items
        .iter()
        .map(|item| match item {
            Item::Label(_) => 0,
            Item::Instr(instr) => initial_width(instr, resolver),
        })
        .collect();

    let mut passes = 0;
    let (addrs, labels) = loop {
        passes += 1;
        let (addrs, labels) = assign(items, &widths);
        let mut changed = false;
        for (i, item) in items.iter().enumerate() {
            let Item::Instr(Instr::Jump { opcode, target, .. }) = item else {
                continue;
            };
            if !opcode.is_goto() {
                continue;
            }
            let offset = i64::from(labels[target]) - i64::from(addrs[i]);
            let narrowed = widths[i].min(goto_width(offset));
            if narrowed != widths[i] {
                widths[i] = narrowed;
                changed = true;
            }
        }
        if !changed {
            break (addrs, labels);
        }
    };
    tracing::trace!(passes, "goto narrowing settled");

    let code_end = items
        .len()
        .checked_sub(1)
        .map_or(0, |last| addrs[last] + widths[last]);

    let mut payloads = HashMap::new();
    let mut units = code_end;
    for (i, item) in items.iter().enumerate() {
        let Item::Instr(instr) = item else { continue };
        let Some(size) = payload_units(instr) else {
            continue;
        };
        units += units % 2;
        payloads.insert(i, units);
        units += size;
    }

    Layout {
        addrs,
        widths,
        labels,
        payloads,
        code_end,
        units,
    }
}

fn assign(items: &[Item], widths: &[u32]) -> (Vec<u32>, HashMap<Label, u32>) {
    let mut addrs = Vec::with_capacity(items.len());
    let mut labels = HashMap::new();
    let mut addr = 0;
    for (item, width) in items.iter().zip(widths) {
        addrs.push(addr);
        if let Item::Label(label) = item {
            labels.insert(*label, addr);
        }
        addr += width;
    }
    (addrs, labels)
}

/// Smallest `goto` form that reaches `offset`. A zero offset only fits `goto/32`.
fn goto_width(offset: i64) -> u32 {
    if offset == 0 {
        3
    } else if i8::try_from(offset).is_ok() {
        1
    } else if i16::try_from(offset).is_ok() {
        2
    } else {
        3
    }
}

fn initial_width(instr: &Instr, resolver: &Resolver<'_>) -> u32 {
    match instr {
        Instr::Op { opcode, .. } | Instr::Const { opcode, .. } | Instr::Literal { opcode, .. } => {
            opcode.format().map_or(1, |f| f.units())
        }
        Instr::String { string, .. } => {
            if resolver.string(*string) <= 0xffff {
                2
            } else {
                3
            }
        }
        Instr::Type { .. } | Instr::Field { .. } => 2,
        Instr::Invoke { .. } | Instr::FilledNewArray { .. } => 3,
        Instr::Jump { opcode, .. } if opcode.is_goto() => 3,
        Instr::Jump { .. } => 2,
        Instr::PackedSwitch { .. } | Instr::SparseSwitch { .. } | Instr::FillArrayData { .. } => {
            Opcode::FILL_ARRAY_DATA.format().map_or(3, |f| f.units())
        }
    }
}

/// Size of the trailing payload an instruction needs, if any.
pub(super) fn payload_units(instr: &Instr) -> Option<u32> {
    match instr {
        Instr::PackedSwitch { targets, .. } => Some(4 + 2 * targets.len() as u32),
        Instr::SparseSwitch { keys, .. } => Some(2 + 4 * keys.len() as u32),
        Instr::FillArrayData { data, .. } => Some(4 + (data.len() as u32).div_ceil(2)),
        _ => None,
    }
}
