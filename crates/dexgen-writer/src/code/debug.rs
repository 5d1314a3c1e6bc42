//! Line-number and local-variable program (`debug_info_item`).

use dexgen_core::leb128::{write_sleb128, write_uleb128, write_uleb128p1};
use dexgen_format::constants::{
    DBG_ADVANCE_LINE, DBG_ADVANCE_PC, DBG_END_LOCAL, DBG_END_SEQUENCE, DBG_FIRST_SPECIAL,
    DBG_LINE_BASE, DBG_LINE_RANGE, DBG_START_LOCAL, DBG_START_LOCAL_EXTENDED,
};

use super::layout::Layout;
use super::{LineEntry, LocalVar};
use crate::pool::{Resolver, StringId};

pub(crate) struct DebugInput<'a> {
    pub lines: &'a [LineEntry],
    pub locals: &'a [LocalVar],
    pub param_names: &'a [Option<StringId>],
    pub params: usize,
}

/// Events at the same address: locals end before they start, lines last.
#[derive(Clone, Copy, Debug)]
enum Event<'a> {
    EndLocal(u16),
    StartLocal(&'a LocalVar),
    Line(u32),
}

impl Event<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::EndLocal(_) => 0,
            Self::StartLocal(_) => 1,
            Self::Line(_) => 2,
        }
    }
}

/// Encode the program, or `None` when there is nothing to describe.
pub(crate) fn encode(
    input: &DebugInput<'_>,
    layout: &Layout,
    resolver: &Resolver<'_>,
) -> Option<Vec<u8>> {
    let mut events: Vec<(u32, Event<'_>)> = Vec::new();
    for line in input.lines {
        events.push((layout.label(line.start), Event::Line(line.line)));
    }
    for local in input.locals {
        let (start, end) = (layout.label(local.start), layout.label(local.end));
        // an empty range describes nothing
        if end <= start {
            continue;
        }
        events.push((start, Event::StartLocal(local)));
        if end < layout.code_end() {
            events.push((end, Event::EndLocal(local.register)));
        }
    }

    let has_names = input.param_names.iter().any(Option::is_some);
    if events.is_empty() && !has_names {
        return None;
    }
    events.sort_by_key(|(addr, event)| (*addr, event.rank()));

    let line_start = events
        .iter()
        .find_map(|(_, event)| match event {
            Event::Line(line) => Some(*line),
            _ => None,
        })
        .unwrap_or(0);

    let mut out = Vec::new();
    write_uleb128(&mut out, line_start);
    write_uleb128(&mut out, input.params as u32);
    for i in 0..input.params {
        let name = input.param_names.get(i).copied().flatten();
        write_uleb128p1(&mut out, name.map(|n| resolver.string(n)));
    }

    let mut state = State {
        out: &mut out,
        addr: 0,
        line: i64::from(line_start),
    };
    for (addr, event) in events {
        match event {
            Event::Line(line) => state.line(addr, i64::from(line)),
            Event::StartLocal(local) => {
                state.advance_to(addr);
                let name = Some(resolver.string(local.name));
                let ty = Some(resolver.type_index(local.ty));
                match local.signature {
                    Some(sig) => {
                        state.out.push(DBG_START_LOCAL_EXTENDED);
                        write_uleb128(state.out, u32::from(local.register));
                        write_uleb128p1(state.out, name);
                        write_uleb128p1(state.out, ty);
                        write_uleb128p1(state.out, Some(resolver.string(sig)));
                    }
                    None => {
                        state.out.push(DBG_START_LOCAL);
                        write_uleb128(state.out, u32::from(local.register));
                        write_uleb128p1(state.out, name);
                        write_uleb128p1(state.out, ty);
                    }
                }
            }
            Event::EndLocal(register) => {
                state.advance_to(addr);
                state.out.push(DBG_END_LOCAL);
                write_uleb128(state.out, u32::from(register));
            }
        }
    }
    out.push(DBG_END_SEQUENCE);
    Some(out)
}

struct State<'a> {
    out: &'a mut Vec<u8>,
    addr: u32,
    line: i64,
}

impl State<'_> {
    fn advance_to(&mut self, addr: u32) {
        if addr > self.addr {
            self.out.push(DBG_ADVANCE_PC);
            write_uleb128(self.out, addr - self.addr);
            self.addr = addr;
        }
    }

    fn line(&mut self, addr: u32, line: i64) {
        let max_diff = i64::from(DBG_LINE_BASE + DBG_LINE_RANGE - 1);
        let mut line_diff = line - self.line;
        if line_diff < i64::from(DBG_LINE_BASE) || line_diff > max_diff {
            self.out.push(DBG_ADVANCE_LINE);
            write_sleb128(self.out, line_diff as i32);
            line_diff = 0;
        }

        let special = |addr_diff: u32| {
            (line_diff - i64::from(DBG_LINE_BASE))
                + i64::from(addr_diff) * i64::from(DBG_LINE_RANGE)
                + i64::from(DBG_FIRST_SPECIAL)
        };
        let mut opcode = special(addr - self.addr);
        if opcode > 0xff {
            self.advance_to(addr);
            opcode = special(0);
        }
        self.out.push(opcode as u8);
        self.addr = addr;
        self.line = line;
    }
}
