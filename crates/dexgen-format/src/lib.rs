#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Container format vocabulary for dexgen.
//!
//! This crate contains:
//! - Format definitions (header, map items, encoded value tags, opcodes)
//! - The producer-side model (`Insn`, `Label`, `Value`) and visitor traits
//! - A read-only [`ContainerView`] and text [`dump`] for inspecting output

pub mod constants;
pub mod dump;
pub mod encoding;
pub mod header;
pub mod insn;
pub mod map;
pub mod opcode;
pub mod value;
pub mod view;
pub mod visitor;

#[cfg(test)]
mod encoding_tests;
#[cfg(test)]
mod opcode_tests;

pub use constants::{DEFAULT_VERSION, HEADER_SIZE, NO_INDEX, SUPPORTED_VERSIONS};
pub use dump::dump;
pub use encoding::ValueType;
pub use header::{Header, SectionRef};
pub use insn::{Insn, Label, MemberRef, Registers};
pub use map::{MAP_ITEM_SIZE, MapItem, MapItemType};
pub use opcode::{Format, IndexKind, OpInfo, Opcode};
pub use value::{AnnotationValue, Value, Visibility};
pub use view::{ContainerView, ViewError};
pub use visitor::{
    AnnotationVisitor, ApplicationVisitor, ClassVisitor, FieldVisitor, MethodVisitor,
};
