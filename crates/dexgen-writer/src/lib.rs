#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Container writer for dexgen.
//!
//! An [`ApplicationWriter`] receives classes through the visitor protocol of
//! `dexgen-format`, interns every referenced constant into a
//! [`ConstantPool`], and on `visit_end` assembles a signed container.
//!
//! ```ignore
//! let mut writer = ApplicationWriter::new();
//! if let Some(class) = writer.visit_class(AccessFlags::PUBLIC, "LHello;", None, Some("Ljava/lang/Object;"), &[])? {
//!     class.visit_end();
//! }
//! writer.visit_end()?;
//! let bytes = writer.into_bytes();
//! ```

mod annotation;
mod assemble;
mod class;
mod code;
pub mod config;
pub mod error;
mod field;
mod invariants;
mod method;
pub mod pool;
pub mod value;
mod writer;

#[cfg(test)]
mod pool_tests;
#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod value_tests;

pub use annotation::AnnotationWriter;
pub use class::ClassWriter;
pub use config::WriterConfig;
pub use error::{EncodeError, PoolError, WriteError};
pub use field::FieldWriter;
pub use method::MethodWriter;
pub use pool::{
    ConstantPool, FieldId, Handle, MethodId, PoolEntry, PoolKind, ProtoId, Resolver, StringId,
    TypeId,
};
pub use value::{EncodedAnnotation, EncodedValue};
pub use writer::{ApplicationWriter, SourceReader};
