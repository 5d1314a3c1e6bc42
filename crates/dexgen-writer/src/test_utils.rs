//! Test fixtures shared by the writer tests.

use dexgen_core::AccessFlags;
use dexgen_format::{
    AnnotationVisitor, ApplicationVisitor, ClassVisitor, ContainerView, FieldVisitor, Insn, Label,
    MemberRef, MethodVisitor, Opcode, Registers, Value, Visibility,
};

use crate::config::WriterConfig;
use crate::writer::ApplicationWriter;

pub const OBJECT: &str = "Ljava/lang/Object;";
pub const STRING: &str = "Ljava/lang/String;";

fn op(opcode: Opcode, a: u16) -> Insn<'static> {
    Insn::Op { opcode, a, b: 0, c: 0 }
}

/// Two classes: `LHello;` implements `LGreeter;` and is visited first.
pub fn write_sample<V: ApplicationVisitor>(app: &mut V) -> Result<(), V::Error> {
    app.visit();

    if let Some(mut class) =
        app.visit_class(AccessFlags::PUBLIC, "LHello;", None, Some(OBJECT), &["LGreeter;"])?
    {
        class.visit_source("Hello.java");
        if let Some(mut a) = class.visit_annotation("LMarker;", Visibility::Runtime) {
            a.visit("value", Value::Int(7));
            a.visit_end();
        }

        let constant = AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL;
        if let Some(f) =
            class.visit_field(constant, "GREETING", STRING, None, Some(Value::String("hi")))
        {
            f.visit_end();
        }
        if let Some(f) = class.visit_field(
            AccessFlags::STATIC,
            "COUNT",
            "I",
            None,
            Some(Value::Int(3)),
        ) {
            f.visit_end();
        }
        if let Some(f) = class.visit_field(AccessFlags::PRIVATE, "name", STRING, None, None) {
            f.visit_end();
        }

        if let Some(mut m) = class.visit_method(AccessFlags::PUBLIC, "<init>", "()V", None, &[]) {
            m.visit_code();
            m.visit_maxs(1);
            m.visit_insn(Insn::Invoke {
                opcode: Opcode::INVOKE_DIRECT,
                args: Registers::List(&[0]),
                method: MemberRef::new(OBJECT, "<init>", "()V"),
            });
            m.visit_insn(op(Opcode::RETURN_VOID, 0));
            m.visit_end();
        }

        let main = AccessFlags::PUBLIC | AccessFlags::STATIC;
        if let Some(mut m) = class.visit_method(main, "main", "([Ljava/lang/String;)V", None, &[])
        {
            let (start, end, handler) = (Label(0), Label(1), Label(2));
            m.visit_parameters(&[Some("args")]);
            m.visit_code();
            m.visit_maxs(2);
            m.visit_label(start);
            m.visit_line_number(3, start);
            m.visit_insn(Insn::Field {
                opcode: Opcode::SGET_OBJECT,
                value: 0,
                object: 0,
                field: MemberRef::new("LHello;", "GREETING", STRING),
            });
            m.visit_label(end);
            m.visit_insn(op(Opcode::RETURN_VOID, 0));
            m.visit_label(handler);
            m.visit_line_number(4, handler);
            m.visit_insn(op(Opcode::MOVE_EXCEPTION, 0));
            m.visit_insn(op(Opcode::THROW, 0));
            m.visit_try_catch_block(start, end, handler, Some("Ljava/lang/Exception;"));
            m.visit_end();
        }
        class.visit_end();
    }

    let iface = AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT;
    if let Some(mut class) = app.visit_class(iface, "LGreeter;", None, Some(OBJECT), &[])? {
        let abstract_method = AccessFlags::PUBLIC | AccessFlags::ABSTRACT;
        if let Some(m) = class.visit_method(abstract_method, "greet", "()V", None, &[]) {
            m.visit_end();
        }
        class.visit_end();
    }

    app.visit_end()
}

/// Write the sample with `config` and return the container bytes.
pub fn sample_bytes(config: WriterConfig) -> Vec<u8> {
    let mut writer = ApplicationWriter::with_config(config);
    write_sample(&mut writer).unwrap();
    writer.into_bytes().unwrap()
}

/// Parse `bytes`, panicking with the view error.
pub fn view(bytes: &[u8]) -> ContainerView<'_> {
    ContainerView::parse(bytes).unwrap()
}
