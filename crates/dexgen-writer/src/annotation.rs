//! Annotation writer and the system annotations derived from signatures and
//! declared exceptions.

use dexgen_format::constants::{SIGNATURE_ANNOTATION, THROWS_ANNOTATION};
use dexgen_format::{AnnotationVisitor, Value, Visibility};

use crate::error::{PoolError, WriteError};
use crate::pool::{ConstantPool, FieldId, MethodId, Resolver, TypeId};
use crate::value::{EncodedAnnotation, EncodedValue};
use crate::writer::BuildState;

/// A committed annotation.
#[derive(Clone, Debug)]
pub(crate) struct AnnotationRecord {
    pub visibility: Visibility,
    pub annotation: EncodedAnnotation,
}

impl AnnotationRecord {
    /// `annotation_item` bytes: visibility, then the encoded annotation.
    pub fn to_bytes(&self, resolver: &Resolver<'_>) -> Vec<u8> {
        let mut out = vec![self.visibility as u8];
        self.annotation.encode(resolver, &mut out);
        out
    }
}

/// What an annotation is attached to.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Target {
    Class(TypeId),
    Field(FieldId),
    Method(MethodId),
    Parameter(MethodId, usize),
}

impl Target {
    fn describe(self, pool: &ConstantPool) -> String {
        match self {
            Self::Class(ty) => pool.type_descriptor(ty).to_owned(),
            Self::Field(field) => pool.field_label(field),
            Self::Method(method) => pool.method_label(method),
            Self::Parameter(method, index) => {
                format!("{} parameter {index}", pool.method_label(method))
            }
        }
    }
}

/// Collects the elements of one annotation; committed by `visit_end`.
///
/// A target holds at most one annotation of each type, and an annotation
/// names each element once. Violations are deferred like pool errors.
pub struct AnnotationWriter<'a> {
    state: &'a mut BuildState,
    target: Target,
    annotations: &'a mut Vec<AnnotationRecord>,
    record: AnnotationRecord,
}

impl<'a> AnnotationWriter<'a> {
    /// `None` when the descriptor cannot enter the pool; the error is kept
    /// for `visit_end`.
    pub(crate) fn open(
        state: &'a mut BuildState,
        target: Target,
        annotations: &'a mut Vec<AnnotationRecord>,
        desc: &str,
        visibility: Visibility,
    ) -> Option<Self> {
        let ty = state.attempt(|pool| pool.type_ref(desc))?;
        Some(Self {
            state,
            target,
            annotations,
            record: AnnotationRecord {
                visibility,
                annotation: EncodedAnnotation::new(ty),
            },
        })
    }
}

impl AnnotationVisitor for AnnotationWriter<'_> {
    fn visit(&mut self, name: &str, value: Value<'_>) {
        let annotation = &self.record.annotation;
        let element = self.state.attempt(|pool| {
            let id = pool.string(name)?;
            if annotation.has_element(id) {
                return Err(PoolError::DuplicateElement {
                    annotation: pool.type_descriptor(annotation.ty).to_owned(),
                    name: name.to_owned(),
                });
            }
            Ok((id, EncodedValue::from_value(pool, &value)?))
        });
        if let Some(element) = element {
            self.record.annotation.elements.push(element);
        }
    }

    fn visit_end(self) {
        let ty = self.record.annotation.ty;
        if self.annotations.iter().any(|r| r.annotation.ty == ty) {
            let pool = &self.state.pool;
            let error = WriteError::DuplicateAnnotation {
                target: self.target.describe(pool),
                ty: pool.type_descriptor(ty).to_owned(),
            };
            self.state.defer(error);
            return;
        }
        self.annotations.push(self.record);
    }
}

/// `dalvik.annotation.Signature`: the generic signature cut after every `;`.
pub(crate) fn signature(
    pool: &mut ConstantPool,
    signature: &str,
) -> Result<AnnotationRecord, PoolError> {
    let parts = signature
        .split_inclusive(';')
        .map(|part| EncodedValue::from_value(pool, &Value::String(part)))
        .collect::<Result<Vec<_>, _>>()?;
    system(pool, SIGNATURE_ANNOTATION, EncodedValue::Array(parts))
}

/// `dalvik.annotation.Throws`: the declared exception types.
pub(crate) fn throws(
    pool: &mut ConstantPool,
    exceptions: &[&str],
) -> Result<AnnotationRecord, PoolError> {
    let types = exceptions
        .iter()
        .map(|desc| Ok(EncodedValue::Type(pool.type_ref(desc)?)))
        .collect::<Result<Vec<_>, PoolError>>()?;
    system(pool, THROWS_ANNOTATION, EncodedValue::Array(types))
}

fn system(
    pool: &mut ConstantPool,
    desc: &str,
    value: EncodedValue,
) -> Result<AnnotationRecord, PoolError> {
    let mut annotation = EncodedAnnotation::new(pool.type_ref(desc)?);
    annotation.elements.push((pool.string("value")?, value));
    Ok(AnnotationRecord {
        visibility: Visibility::System,
        annotation,
    })
}
