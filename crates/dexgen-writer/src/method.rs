//! Method writer: annotations, parameter names and the code body.

use dexgen_core::AccessFlags;
use dexgen_format::{Insn, Label, MethodVisitor, Visibility};

use crate::annotation::{AnnotationRecord, AnnotationWriter, Target};
use crate::code::{CodeBody, LineEntry, LocalVar, TryBlock};
use crate::pool::{MethodId, StringId};
use crate::writer::BuildState;

#[derive(Clone, Debug)]
pub(crate) struct MethodRecord {
    pub method: MethodId,
    pub name: String,
    pub access: AccessFlags,
    /// Incoming argument words, receiver included.
    pub ins: u16,
    /// Declared parameters, receiver excluded.
    pub params: usize,
    pub param_names: Vec<Option<StringId>>,
    pub annotations: Vec<AnnotationRecord>,
    /// One list per declared parameter.
    pub param_annotations: Vec<Vec<AnnotationRecord>>,
    pub code: Option<CodeBody>,
}

impl MethodRecord {
    pub fn has_param_annotations(&self) -> bool {
        self.param_annotations.iter().any(|a| !a.is_empty())
    }
}

/// Receives one method; committed by `visit_end`.
pub struct MethodWriter<'c> {
    state: &'c mut BuildState,
    methods: &'c mut Vec<MethodRecord>,
    record: MethodRecord,
}

impl<'c> MethodWriter<'c> {
    pub(crate) fn new(
        state: &'c mut BuildState,
        methods: &'c mut Vec<MethodRecord>,
        record: MethodRecord,
    ) -> Self {
        Self {
            state,
            methods,
            record,
        }
    }

    fn body(&mut self) -> &mut CodeBody {
        self.record.code.get_or_insert_with(CodeBody::default)
    }
}

impl MethodVisitor for MethodWriter<'_> {
    type Annotation<'a>
        = AnnotationWriter<'a>
    where
        Self: 'a;

    fn visit_parameters(&mut self, names: &[Option<&str>]) {
        let names = self.state.attempt(|pool| {
            names
                .iter()
                .map(|name| name.map(|n| pool.string(n)).transpose())
                .collect::<Result<Vec<_>, _>>()
        });
        if let Some(names) = names {
            self.record.param_names = names;
        }
    }

    fn visit_annotation(
        &mut self,
        desc: &str,
        visibility: Visibility,
    ) -> Option<AnnotationWriter<'_>> {
        let target = Target::Method(self.record.method);
        AnnotationWriter::open(
            self.state,
            target,
            &mut self.record.annotations,
            desc,
            visibility,
        )
    }

    fn visit_parameter_annotation(
        &mut self,
        parameter: usize,
        desc: &str,
        visibility: Visibility,
    ) -> Option<AnnotationWriter<'_>> {
        let Some(annotations) = self.record.param_annotations.get_mut(parameter) else {
            tracing::debug!(
                method = %self.record.name,
                parameter,
                "annotation on undeclared parameter skipped"
            );
            return None;
        };
        let target = Target::Parameter(self.record.method, parameter);
        AnnotationWriter::open(self.state, target, annotations, desc, visibility)
    }

    fn visit_code(&mut self) {
        self.body();
    }

    fn visit_maxs(&mut self, registers: u16) {
        self.body().registers = Some(registers);
    }

    fn visit_insn(&mut self, insn: Insn<'_>) {
        let body = self.record.code.get_or_insert_with(CodeBody::default);
        self.state.attempt(|pool| body.push(pool, insn));
    }

    fn visit_label(&mut self, label: Label) {
        self.body().bind(label);
    }

    fn visit_try_catch_block(
        &mut self,
        start: Label,
        end: Label,
        handler: Label,
        exception: Option<&str>,
    ) {
        let exception = match exception {
            Some(desc) => match self.state.attempt(|pool| pool.type_ref(desc)) {
                Some(ty) => Some(ty),
                None => return,
            },
            None => None,
        };
        self.body().tries.push(TryBlock {
            start,
            end,
            handler,
            exception,
        });
    }

    fn visit_line_number(&mut self, line: u32, start: Label) {
        self.body().lines.push(LineEntry { line, start });
    }

    fn visit_local_variable(
        &mut self,
        name: &str,
        desc: &str,
        signature: Option<&str>,
        start: Label,
        end: Label,
        register: u16,
    ) {
        let local = self.state.attempt(|pool| {
            Ok(LocalVar {
                name: pool.string(name)?,
                ty: pool.type_ref(desc)?,
                signature: signature.map(|s| pool.string(s)).transpose()?,
                start,
                end,
                register,
            })
        });
        if let Some(local) = local {
            self.body().locals.push(local);
        }
    }

    fn visit_end(self) {
        self.methods.push(self.record);
    }
}
