//! Try/catch tables.
//!
//! Visited blocks may overlap. The covered code is cut at every block boundary
//! and each piece gets the handlers of all blocks covering it, in visit order.
//! Adjacent pieces with the same handlers are merged again.

use std::collections::BTreeSet;

use dexgen_core::leb128::{write_sleb128, write_uleb128};
use indexmap::IndexSet;

use super::TryBlock;
use super::layout::Layout;
use crate::error::EncodeError;
use crate::pool::Resolver;

/// One `try_item`: a code range and the byte offset of its handler list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TryItem {
    pub start_addr: u32,
    pub insn_count: u16,
    pub handler_off: u16,
}

/// Handlers of one range: typed catches, then an optional catch-all.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
struct Handlers {
    typed: Vec<(u32, u32)>,
    catch_all: Option<u32>,
}

impl Handlers {
    fn add(&mut self, exception: Option<u32>, addr: u32) {
        // nothing after a catch-all is reachable
        if self.catch_all.is_some() {
            return;
        }
        match exception {
            None => self.catch_all = Some(addr),
            Some(ty) if self.typed.iter().all(|(t, _)| *t != ty) => self.typed.push((ty, addr)),
            Some(_) => {}
        }
    }

    fn is_empty(&self) -> bool {
        self.typed.is_empty() && self.catch_all.is_none()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let size = self.typed.len() as i32;
        write_sleb128(out, if self.catch_all.is_some() { -size } else { size });
        for (ty, addr) in &self.typed {
            write_uleb128(out, *ty);
            write_uleb128(out, *addr);
        }
        if let Some(addr) = self.catch_all {
            write_uleb128(out, addr);
        }
    }
}

struct Range {
    start: u32,
    end: u32,
    handlers: Handlers,
}

/// Build the `try_item`s and the encoded handler list blob.
pub(crate) fn build(
    blocks: &[TryBlock],
    layout: &Layout,
    resolver: &Resolver<'_>,
) -> Result<(Vec<TryItem>, Vec<u8>), EncodeError> {
    let blocks: Vec<(u32, u32, u32, Option<u32>)> = blocks
        .iter()
        .map(|b| {
            (
                layout.label(b.start),
                layout.label(b.end),
                layout.label(b.handler),
                b.exception.map(|ty| resolver.type_index(ty)),
            )
        })
        .filter(|(start, end, _, _)| start < end)
        .collect();
    if blocks.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let bounds: Vec<u32> = blocks
        .iter()
        .flat_map(|(start, end, _, _)| [*start, *end])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut ranges: Vec<Range> = Vec::new();
    for piece in bounds.windows(2) {
        let (start, end) = (piece[0], piece[1]);
        let mut handlers = Handlers::default();
        for (_, _, addr, exception) in blocks
            .iter()
            .filter(|(s, e, _, _)| *s <= start && end <= *e)
        {
            handlers.add(*exception, *addr);
        }
        if handlers.is_empty() {
            continue;
        }
        match ranges.last_mut() {
            Some(last) if last.end == start && last.handlers == handlers => last.end = end,
            _ => ranges.push(Range {
                start,
                end,
                handlers,
            }),
        }
    }

    let lists: IndexSet<&Handlers> = ranges.iter().map(|r| &r.handlers).collect();
    let mut blob = Vec::new();
    write_uleb128(&mut blob, lists.len() as u32);
    let mut offsets = Vec::with_capacity(lists.len());
    for list in &lists {
        offsets.push(blob.len() as u16);
        list.encode(&mut blob);
    }

    let items = ranges
        .iter()
        .map(|r| {
            let len = r.end - r.start;
            let insn_count = u16::try_from(len).map_err(|_| EncodeError::TryRangeTooLong(len))?;
            let list = lists.get_index_of(&r.handlers).unwrap_or_default();
            Ok(TryItem {
                start_addr: r.start,
                insn_count,
                handler_off: offsets[list],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::trace!(tries = items.len(), lists = lists.len(), "try table built");
    Ok((items, blob))
}
