//! Class writer: members, class annotations and system annotations.

use dexgen_core::{AccessFlags, MethodDescriptor};
use dexgen_format::{ClassVisitor, MemberRef, Value, Visibility};

use crate::annotation::{self, AnnotationRecord, AnnotationWriter, Target};
use crate::error::WriteError;
use crate::field::{FieldRecord, FieldWriter};
use crate::method::{MethodRecord, MethodWriter};
use crate::pool::{StringId, TypeId};
use crate::value::EncodedValue;
use crate::writer::BuildState;

#[derive(Clone, Debug)]
pub(crate) struct ClassRecord {
    pub name: String,
    pub ty: TypeId,
    pub access: AccessFlags,
    pub super_ty: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub source_file: Option<StringId>,
    pub annotations: Vec<AnnotationRecord>,
    pub fields: Vec<FieldRecord>,
    pub methods: Vec<MethodRecord>,
}

impl ClassRecord {
    pub fn has_members(&self) -> bool {
        !self.fields.is_empty() || !self.methods.is_empty()
    }
}

/// Receives one class. The class is part of the output only once
/// `visit_end` has run; a writer dropped before that leaves no trace, not
/// even its pool entries.
pub struct ClassWriter<'w> {
    state: &'w mut BuildState,
    record: ClassRecord,
}

impl<'w> ClassWriter<'w> {
    pub(crate) fn new(state: &'w mut BuildState, record: ClassRecord) -> Self {
        Self { state, record }
    }

    fn duplicate(&mut self, name: &str) {
        self.state.defer(WriteError::DuplicateMember {
            class: self.record.name.clone(),
            name: name.to_owned(),
        });
    }
}

impl ClassVisitor for ClassWriter<'_> {
    type Field<'a>
        = FieldWriter<'a>
    where
        Self: 'a;
    type Method<'a>
        = MethodWriter<'a>
    where
        Self: 'a;
    type Annotation<'a>
        = AnnotationWriter<'a>
    where
        Self: 'a;

    fn visit_source(&mut self, file: &str) {
        self.record.source_file = self.state.attempt(|pool| pool.string(file));
    }

    fn visit_annotation(
        &mut self,
        desc: &str,
        visibility: Visibility,
    ) -> Option<AnnotationWriter<'_>> {
        let target = Target::Class(self.record.ty);
        AnnotationWriter::open(
            self.state,
            target,
            &mut self.record.annotations,
            desc,
            visibility,
        )
    }

    fn visit_field(
        &mut self,
        access: AccessFlags,
        name: &str,
        desc: &str,
        signature: Option<&str>,
        value: Option<Value<'_>>,
    ) -> Option<FieldWriter<'_>> {
        let owner = self.record.name.as_str();
        let (field, value, annotations) = self.state.attempt(|pool| {
            let field = pool.field(MemberRef::new(owner, name, desc))?;
            let value = match value.as_ref() {
                Some(value) if access.is_static() => Some(EncodedValue::from_value(pool, value)?),
                _ => None,
            };
            let annotations = match signature {
                Some(sig) => vec![annotation::signature(pool, sig)?],
                None => Vec::new(),
            };
            Ok((field, value, annotations))
        })?;

        if self.record.fields.iter().any(|f| f.field == field) {
            self.duplicate(name);
            return None;
        }

        let record = FieldRecord {
            field,
            access,
            desc: desc.to_owned(),
            value,
            annotations,
        };
        Some(FieldWriter::new(
            self.state,
            &mut self.record.fields,
            record,
        ))
    }

    fn visit_method(
        &mut self,
        mut access: AccessFlags,
        name: &str,
        desc: &str,
        signature: Option<&str>,
        exceptions: &[&str],
    ) -> Option<MethodWriter<'_>> {
        let owner = self.record.name.as_str();
        let (method, parsed, annotations) = self.state.attempt(|pool| {
            let method = pool.method(MemberRef::new(owner, name, desc))?;
            let parsed = MethodDescriptor::parse(desc)?;
            let mut annotations = Vec::new();
            if let Some(sig) = signature {
                annotations.push(annotation::signature(pool, sig)?);
            }
            if !exceptions.is_empty() {
                annotations.push(annotation::throws(pool, exceptions)?);
            }
            Ok((method, parsed, annotations))
        })?;

        if self.record.methods.iter().any(|m| m.method == method) {
            self.duplicate(name);
            return None;
        }

        if name == "<init>" || name == "<clinit>" {
            access |= AccessFlags::CONSTRUCTOR;
        }
        let receiver = u16::from(!access.is_static());
        let params = parsed.params.len();
        let record = MethodRecord {
            method,
            name: name.to_owned(),
            access,
            ins: parsed.param_words() + receiver,
            params,
            param_names: Vec::new(),
            annotations,
            param_annotations: vec![Vec::new(); params],
            code: None,
        };
        Some(MethodWriter::new(
            self.state,
            &mut self.record.methods,
            record,
        ))
    }

    fn visit_end(self) {
        tracing::trace!(
            class = %self.record.name,
            fields = self.record.fields.len(),
            methods = self.record.methods.len(),
            "class committed"
        );
        self.state.commit_class(self.record);
    }
}
