//! Field writer.

use dexgen_core::AccessFlags;
use dexgen_format::{FieldVisitor, Visibility};

use crate::annotation::{AnnotationRecord, AnnotationWriter, Target};
use crate::pool::FieldId;
use crate::value::EncodedValue;
use crate::writer::BuildState;

#[derive(Clone, Debug)]
pub(crate) struct FieldRecord {
    pub field: FieldId,
    pub access: AccessFlags,
    /// Type descriptor, for the zero value of static fields without one.
    pub desc: String,
    /// Initial value; only kept for static fields.
    pub value: Option<EncodedValue>,
    pub annotations: Vec<AnnotationRecord>,
}

/// Receives the annotations of one field; committed by `visit_end`.
pub struct FieldWriter<'c> {
    state: &'c mut BuildState,
    fields: &'c mut Vec<FieldRecord>,
    record: FieldRecord,
}

impl<'c> FieldWriter<'c> {
    pub(crate) fn new(
        state: &'c mut BuildState,
        fields: &'c mut Vec<FieldRecord>,
        record: FieldRecord,
    ) -> Self {
        Self {
            state,
            fields,
            record,
        }
    }
}

impl FieldVisitor for FieldWriter<'_> {
    type Annotation<'a>
        = AnnotationWriter<'a>
    where
        Self: 'a;

    fn visit_annotation(
        &mut self,
        desc: &str,
        visibility: Visibility,
    ) -> Option<AnnotationWriter<'_>> {
        let target = Target::Field(self.record.field);
        AnnotationWriter::open(
            self.state,
            target,
            &mut self.record.annotations,
            desc,
            visibility,
        )
    }

    fn visit_end(self) {
        self.fields.push(self.record);
    }
}
