//! Encoded values: typed constants for static fields and annotations.
//!
//! References are held as pool handles and written as final indices, so
//! values can only be encoded once the pool is closed.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use dexgen_core::leb128::write_uleb128;
use dexgen_format::encoding::{
    ValueType, value_tag, write_right_zero_extended, write_signed, write_unsigned,
};
use dexgen_format::{AnnotationValue, Value};

use crate::error::PoolError;
use crate::invariants::mixed_kind_comparison;
use crate::pool::{ConstantPool, FieldId, MethodId, Resolver, StringId, TypeId};

/// Annotation body: type plus named elements.
#[derive(Clone, Debug)]
pub struct EncodedAnnotation {
    pub ty: TypeId,
    pub elements: Vec<(StringId, EncodedValue)>,
}

impl EncodedAnnotation {
    pub fn new(ty: TypeId) -> Self {
        Self {
            ty,
            elements: Vec::new(),
        }
    }

    pub fn has_element(&self, name: StringId) -> bool {
        self.elements.iter().any(|(n, _)| *n == name)
    }

    /// Type index, element count, then elements ordered by name string index.
    pub fn encode(&self, resolver: &Resolver<'_>, out: &mut Vec<u8>) {
        write_uleb128(out, resolver.type_index(self.ty));
        write_uleb128(out, self.elements.len() as u32);

        let mut elements: Vec<(u32, &EncodedValue)> = self
            .elements
            .iter()
            .map(|(name, value)| (resolver.string(*name), value))
            .collect();
        elements.sort_by_key(|(name, _)| *name);
        for (name, value) in elements {
            write_uleb128(out, name);
            value.encode(resolver, out);
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.ty
            .cmp(&other.ty)
            .then_with(|| self.elements.iter().cmp(other.elements.iter()))
    }
}

/// A typed constant.
#[derive(Clone, Debug)]
pub enum EncodedValue {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(StringId),
    Type(TypeId),
    Field(FieldId),
    Method(MethodId),
    Enum(FieldId),
    Array(Vec<EncodedValue>),
    Annotation(EncodedAnnotation),
}

impl EncodedValue {
    /// Resolve a producer value against the pool.
    pub fn from_value(pool: &mut ConstantPool, value: &Value<'_>) -> Result<Self, PoolError> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Boolean(v) => Self::Boolean(*v),
            Value::Byte(v) => Self::Byte(*v),
            Value::Short(v) => Self::Short(*v),
            Value::Char(v) => Self::Char(*v),
            Value::Int(v) => Self::Int(*v),
            Value::Long(v) => Self::Long(*v),
            Value::Float(v) => Self::Float(*v),
            Value::Double(v) => Self::Double(*v),
            Value::String(s) => Self::String(pool.string(s)?),
            Value::Type(desc) => Self::Type(pool.type_ref(desc)?),
            Value::Field(f) => Self::Field(pool.field(*f)?),
            Value::Method(m) => Self::Method(pool.method(*m)?),
            Value::Enum(f) => Self::Enum(pool.field(*f)?),
            Value::Array(items) => Self::Array(
                items
                    .iter()
                    .map(|item| Self::from_value(pool, item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Annotation(a) => Self::Annotation(Self::annotation(pool, a)?),
        })
    }

    pub(crate) fn annotation(
        pool: &mut ConstantPool,
        value: &AnnotationValue<'_>,
    ) -> Result<EncodedAnnotation, PoolError> {
        let mut annotation = EncodedAnnotation::new(pool.type_ref(value.desc)?);
        for (name, element) in &value.elements {
            let id = pool.string(name)?;
            if annotation.has_element(id) {
                return Err(PoolError::DuplicateElement {
                    annotation: value.desc.to_owned(),
                    name: (*name).to_owned(),
                });
            }
            annotation
                .elements
                .push((id, Self::from_value(pool, element)?));
        }
        Ok(annotation)
    }

    /// Zero value of a field type: `false`, `0`, `0.0` or `null`.
    pub fn default_for(desc: &str) -> Self {
        match desc.as_bytes().first() {
            Some(b'Z') => Self::Boolean(false),
            Some(b'B') => Self::Byte(0),
            Some(b'S') => Self::Short(0),
            Some(b'C') => Self::Char(0),
            Some(b'I') => Self::Int(0),
            Some(b'J') => Self::Long(0),
            Some(b'F') => Self::Float(0.0),
            Some(b'D') => Self::Double(0.0),
            _ => Self::Null,
        }
    }

    /// Whether this is the zero value of its kind.
    pub fn is_default(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Boolean(v) => !v,
            Self::Byte(v) => *v == 0,
            Self::Short(v) => *v == 0,
            Self::Char(v) => *v == 0,
            Self::Int(v) => *v == 0,
            Self::Long(v) => *v == 0,
            Self::Float(v) => v.to_bits() == 0,
            Self::Double(v) => v.to_bits() == 0,
            _ => false,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Byte(_) => ValueType::Byte,
            Self::Short(_) => ValueType::Short,
            Self::Char(_) => ValueType::Char,
            Self::Int(_) => ValueType::Int,
            Self::Long(_) => ValueType::Long,
            Self::Float(_) => ValueType::Float,
            Self::Double(_) => ValueType::Double,
            Self::String(_) => ValueType::String,
            Self::Type(_) => ValueType::Type,
            Self::Field(_) => ValueType::Field,
            Self::Method(_) => ValueType::Method,
            Self::Enum(_) => ValueType::Enum,
            Self::Array(_) => ValueType::Array,
            Self::Annotation(_) => ValueType::Annotation,
        }
    }

    /// Append the tagged, minimal-width encoding.
    pub fn encode(&self, resolver: &Resolver<'_>, out: &mut Vec<u8>) {
        let ty = self.value_type();
        match self {
            Self::Null => out.push(value_tag(ty, 0)),
            Self::Boolean(v) => out.push(value_tag(ty, u8::from(*v))),
            Self::Byte(v) => {
                out.push(value_tag(ty, 0));
                out.push(*v as u8);
            }
            Self::Short(v) => write_signed(out, ty, i64::from(*v)),
            Self::Char(v) => write_unsigned(out, ty, u64::from(*v)),
            Self::Int(v) => write_signed(out, ty, i64::from(*v)),
            Self::Long(v) => write_signed(out, ty, *v),
            Self::Float(v) => write_right_zero_extended(out, ty, u64::from(v.to_bits()), 4),
            Self::Double(v) => write_right_zero_extended(out, ty, v.to_bits(), 8),
            Self::String(id) => write_unsigned(out, ty, u64::from(resolver.string(*id))),
            Self::Type(id) => write_unsigned(out, ty, u64::from(resolver.type_index(*id))),
            Self::Field(id) | Self::Enum(id) => {
                write_unsigned(out, ty, u64::from(resolver.field(*id)))
            }
            Self::Method(id) => write_unsigned(out, ty, u64::from(resolver.method(*id))),
            Self::Array(items) => {
                out.push(value_tag(ty, 0));
                write_uleb128(out, items.len() as u32);
                for item in items {
                    item.encode(resolver, out);
                }
            }
            Self::Annotation(annotation) => {
                out.push(value_tag(ty, 0));
                annotation.encode(resolver, out);
            }
        }
    }

    /// Total order against a value of the same kind.
    ///
    /// # Panics
    /// When the kinds differ.
    pub fn compare_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Byte(a), Self::Byte(b)) => a.cmp(b),
            (Self::Short(a), Self::Short(b)) => a.cmp(b),
            (Self::Char(a), Self::Char(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Long(a), Self::Long(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Type(a), Self::Type(b)) => a.cmp(b),
            (Self::Field(a), Self::Field(b)) | (Self::Enum(a), Self::Enum(b)) => a.cmp(b),
            (Self::Method(a), Self::Method(b)) => a.cmp(b),
            (Self::Array(a), Self::Array(b)) => a.cmp(b),
            (Self::Annotation(a), Self::Annotation(b)) => a.compare(b),
            _ => mixed_kind_comparison(self.value_type(), other.value_type()),
        }
    }
}

impl Ord for EncodedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.value_type() as u8)
            .cmp(&(other.value_type() as u8))
            .then_with(|| self.compare_value(other))
    }
}

impl PartialOrd for EncodedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EncodedValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EncodedValue {}

impl Hash for EncodedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.value_type() as u8).hash(state);
        match self {
            Self::Null => {}
            Self::Boolean(v) => v.hash(state),
            Self::Byte(v) => v.hash(state),
            Self::Short(v) => v.hash(state),
            Self::Char(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Long(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Double(v) => v.to_bits().hash(state),
            Self::String(id) => id.hash(state),
            Self::Type(id) => id.hash(state),
            Self::Field(id) | Self::Enum(id) => id.hash(state),
            Self::Method(id) => id.hash(state),
            Self::Array(items) => items.hash(state),
            Self::Annotation(a) => {
                a.ty.hash(state);
                a.elements.hash(state);
            }
        }
    }
}
