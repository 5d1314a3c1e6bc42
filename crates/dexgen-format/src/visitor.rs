//! Visitor protocol between a class-model producer and a container sink.
//!
//! One trait per structural level. Sub-visitors are generic associated types
//! borrowing their parent, so a class visitor cannot outlive the application
//! visitor that created it and at most one is open at a time. Returning `None`
//! from a `visit_*` method tells the producer to skip that element.
//!
//! Member-level calls are infallible; sinks that can fail collect the problem
//! and report it from [`ApplicationVisitor::visit_end`].

use dexgen_core::AccessFlags;

use super::insn::{Insn, Label};
use super::value::{Value, Visibility};

pub trait ApplicationVisitor {
    type Error;
    type Class<'a>: ClassVisitor
    where
        Self: 'a;

    /// Start of the container.
    fn visit(&mut self) {}

    /// `name`, `super_name` and `interfaces` are type descriptors.
    fn visit_class(
        &mut self,
        access: AccessFlags,
        name: &str,
        signature: Option<&str>,
        super_name: Option<&str>,
        interfaces: &[&str],
    ) -> Result<Option<Self::Class<'_>>, Self::Error>;

    /// End of the container.
    fn visit_end(&mut self) -> Result<(), Self::Error>;
}

pub trait ClassVisitor {
    type Field<'a>: FieldVisitor
    where
        Self: 'a;
    type Method<'a>: MethodVisitor
    where
        Self: 'a;
    type Annotation<'a>: AnnotationVisitor
    where
        Self: 'a;

    fn visit_source(&mut self, _file: &str) {}

    fn visit_annotation(
        &mut self,
        desc: &str,
        visibility: Visibility,
    ) -> Option<Self::Annotation<'_>>;

    /// `value` is the initial value of a static field.
    fn visit_field(
        &mut self,
        access: AccessFlags,
        name: &str,
        desc: &str,
        signature: Option<&str>,
        value: Option<Value<'_>>,
    ) -> Option<Self::Field<'_>>;

    /// `exceptions` lists the declared exception type descriptors.
    fn visit_method(
        &mut self,
        access: AccessFlags,
        name: &str,
        desc: &str,
        signature: Option<&str>,
        exceptions: &[&str],
    ) -> Option<Self::Method<'_>>;

    fn visit_end(self);
}

pub trait FieldVisitor {
    type Annotation<'a>: AnnotationVisitor
    where
        Self: 'a;

    fn visit_annotation(
        &mut self,
        desc: &str,
        visibility: Visibility,
    ) -> Option<Self::Annotation<'_>>;

    fn visit_end(self);
}

pub trait MethodVisitor {
    type Annotation<'a>: AnnotationVisitor
    where
        Self: 'a;

    /// Parameter names in declaration order, `None` where unknown.
    fn visit_parameters(&mut self, _names: &[Option<&str>]) {}

    fn visit_annotation(
        &mut self,
        desc: &str,
        visibility: Visibility,
    ) -> Option<Self::Annotation<'_>>;

    fn visit_parameter_annotation(
        &mut self,
        parameter: usize,
        desc: &str,
        visibility: Visibility,
    ) -> Option<Self::Annotation<'_>>;

    /// Start of the method body.
    fn visit_code(&mut self) {}

    /// Total register count of the frame.
    fn visit_maxs(&mut self, _registers: u16) {}

    fn visit_insn(&mut self, insn: Insn<'_>);

    /// Bind `label` to the current position.
    fn visit_label(&mut self, label: Label);

    /// `exception` is `None` for a catch-all handler.
    fn visit_try_catch_block(
        &mut self,
        start: Label,
        end: Label,
        handler: Label,
        exception: Option<&str>,
    );

    fn visit_line_number(&mut self, line: u32, start: Label);

    fn visit_local_variable(
        &mut self,
        name: &str,
        desc: &str,
        signature: Option<&str>,
        start: Label,
        end: Label,
        register: u16,
    );

    fn visit_end(self);
}

pub trait AnnotationVisitor {
    fn visit(&mut self, name: &str, value: Value<'_>);

    fn visit_end(self);
}
