#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core utilities shared by the dexgen crates.
//!
//! - [`leb128`]: variable-length integer codecs used throughout the data section
//! - [`mutf8`]: Modified UTF-8 codec and the UTF-16 ordering used for string ids
//! - [`descriptor`]: type and method descriptor parsing (shorty, register words)
//! - [`AccessFlags`]: class, field and method access flags

pub mod access;
pub mod descriptor;
pub mod leb128;
pub mod mutf8;

#[cfg(test)]
mod descriptor_tests;
#[cfg(test)]
mod leb128_tests;

pub use access::AccessFlags;
pub use descriptor::{DescriptorError, MethodDescriptor, register_words};
pub use mutf8::Mutf8Error;
