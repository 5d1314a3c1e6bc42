//! Human-readable container listing for debugging and tests.
//!
//! The checksum and signature are left out so listings stay stable across
//! unrelated byte changes.

use std::fmt::Write as _;

use super::view::{ContainerView, ViewError};

/// Render header, map, string and type tables.
pub fn dump(view: &ContainerView<'_>) -> Result<String, ViewError> {
    let mut out = String::new();
    dump_header(&mut out, view);
    dump_map(&mut out, view);
    dump_strings(&mut out, view)?;
    dump_types(&mut out, view)?;
    Ok(out)
}

fn dump_header(out: &mut String, view: &ContainerView<'_>) {
    let h = view.header();
    out.push_str("[header]\n");
    if let Some(version) = h.version() {
        writeln!(out, "version = {version:03}").unwrap();
    }
    writeln!(out, "file_size = 0x{:x}", h.file_size).unwrap();
    writeln!(out, "map_off = 0x{:x}", h.map_off).unwrap();
    let sections = [
        ("string_ids", h.string_ids),
        ("type_ids", h.type_ids),
        ("proto_ids", h.proto_ids),
        ("field_ids", h.field_ids),
        ("method_ids", h.method_ids),
        ("class_defs", h.class_defs),
        ("data", h.data),
    ];
    for (name, section) in sections {
        if section.size != 0 {
            writeln!(out, "{name} = {} @ 0x{:x}", section.size, section.off).unwrap();
        }
    }
    out.push('\n');
}

fn dump_map(out: &mut String, view: &ContainerView<'_>) {
    out.push_str("[map]\n");
    for item in view.map() {
        writeln!(
            out,
            "0x{:04x} {:<26} {:>4} @ 0x{:x}",
            item.kind.code(),
            item.kind.name(),
            item.count,
            item.offset
        )
        .unwrap();
    }
}

fn dump_strings(out: &mut String, view: &ContainerView<'_>) -> Result<(), ViewError> {
    let strings = view.strings()?;
    if strings.is_empty() {
        return Ok(());
    }
    out.push_str("\n[strings]\n");
    let width = width_for_count(strings.len());
    for (i, s) in strings.iter().enumerate() {
        writeln!(out, "S{i:0width$} {s:?}").unwrap();
    }
    Ok(())
}

fn dump_types(out: &mut String, view: &ContainerView<'_>) -> Result<(), ViewError> {
    let count = view.type_count();
    if count == 0 {
        return Ok(());
    }
    out.push_str("\n[types]\n");
    let width = width_for_count(count as usize);
    for i in 0..count {
        let string_idx = view.type_string_index(i)?;
        let desc = view.string(string_idx)?;
        writeln!(out, "T{i:0width$} S{string_idx} {desc}").unwrap();
    }
    Ok(())
}

/// Digits needed to print indices up to `count - 1`.
fn width_for_count(count: usize) -> usize {
    let mut width = 1;
    let mut max = count.saturating_sub(1);
    while max >= 10 {
        max /= 10;
        width += 1;
    }
    width
}
