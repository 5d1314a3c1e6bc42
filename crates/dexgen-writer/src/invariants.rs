//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use dexgen_format::ValueType;

/// Encoded values of different kinds have no common order.
pub(crate) fn mixed_kind_comparison(lhs: ValueType, rhs: ValueType) -> ! {
    panic!("EncodedValue: cannot compare {lhs:?} with {rhs:?}")
}

/// Labels are checked before layout reads their addresses.
pub(crate) fn ensure_label<T: Copy>(addr: Option<T>, label: u32) -> T {
    addr.unwrap_or_else(|| panic!("layout: label {label} has no address after validation"))
}
