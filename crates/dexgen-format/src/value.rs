//! Producer-side constant values for static fields and annotation elements.

use super::insn::MemberRef;

/// A constant as supplied by the producer. Names and descriptors are resolved
/// against the constant pool by the writer.
#[derive(Clone, Debug, PartialEq)]
pub enum Value<'a> {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(&'a str),
    /// Type descriptor.
    Type(&'a str),
    Field(MemberRef<'a>),
    Method(MemberRef<'a>),
    /// Enum constant: a static field of the enum type.
    Enum(MemberRef<'a>),
    Array(Vec<Value<'a>>),
    Annotation(AnnotationValue<'a>),
}

/// Nested annotation value.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationValue<'a> {
    pub desc: &'a str,
    pub elements: Vec<(&'a str, Value<'a>)>,
}

impl<'a> AnnotationValue<'a> {
    pub fn new(desc: &'a str) -> Self {
        Self {
            desc,
            elements: Vec::new(),
        }
    }

    pub fn with(mut self, name: &'a str, value: Value<'a>) -> Self {
        self.elements.push((name, value));
        self
    }
}

/// Retention of an annotation in the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Visibility {
    Build = 0x00,
    Runtime = 0x01,
    System = 0x02,
}
