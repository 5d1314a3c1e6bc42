use crate::descriptor::{
    DescriptorError, MethodDescriptor, register_words, validate_field_type, validate_type,
};

#[test]
fn parses_mixed_parameters() {
    let desc = MethodDescriptor::parse("(I[JLjava/lang/String;D)Z").unwrap();

    assert_eq!(desc.params, ["I", "[J", "Ljava/lang/String;", "D"]);
    assert_eq!(desc.ret, "Z");
}

#[test]
fn shorty_collapses_references() {
    let desc = MethodDescriptor::parse("(I[JLjava/lang/String;D)Ljava/lang/Object;").unwrap();
    assert_eq!(desc.shorty(), "LILLD");

    let void = MethodDescriptor::parse("()V").unwrap();
    assert_eq!(void.shorty(), "V");
}

#[test]
fn param_words_counts_wide_types_twice() {
    let desc = MethodDescriptor::parse("(JIDLjava/lang/Object;)V").unwrap();
    assert_eq!(desc.param_words(), 6);
}

#[test]
fn register_words_per_type() {
    assert_eq!(register_words("V"), 0);
    assert_eq!(register_words("I"), 1);
    assert_eq!(register_words("J"), 2);
    assert_eq!(register_words("D"), 2);
    assert_eq!(register_words("[J"), 1);
    assert_eq!(register_words("Ljava/lang/Object;"), 1);
}

#[test]
fn rejects_malformed_method_descriptors() {
    for bad in ["", "V", "(", "(I", "(I)", "(Q)V", "(L;)V", "(I)VV", "(Ljava/lang/Object)V"] {
        assert_eq!(
            MethodDescriptor::parse(bad),
            Err(DescriptorError::Method(bad.to_owned())),
            "{bad}"
        );
    }
}

#[test]
fn validates_field_types() {
    assert!(validate_type("I").is_ok());
    assert!(validate_type("[[Ljava/lang/String;").is_ok());
    assert!(validate_type("Lfoo;").is_ok());
    assert_eq!(
        validate_type("Lfoo"),
        Err(DescriptorError::Type("Lfoo".to_owned()))
    );
    assert!(validate_type("II").is_err());
}

#[test]
fn void_is_a_type_but_not_a_field_type() {
    assert!(validate_type("V").is_ok());
    assert_eq!(
        validate_field_type("V"),
        Err(DescriptorError::Type("V".to_owned()))
    );
    assert_eq!(
        validate_field_type("[V"),
        Err(DescriptorError::Type("[V".to_owned()))
    );
    assert!(validate_field_type("J").is_ok());
}

#[test]
fn error_messages() {
    insta::assert_snapshot!(
        DescriptorError::Method("(I".to_owned()),
        @"malformed method descriptor `(I`"
    );
}
