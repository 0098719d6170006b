use assert_matches::assert_matches;
use jszero_core::{error::TypecheckError, typ::TypeF};

use crate::{assert_type, check, type_error};

#[test]
fn incongruent_array_literal() {
    let err = type_error(r#" [10, 20, "nope"] "#);

    assert_matches!(
        err,
        TypecheckError::ArrayLiteral { elem_typings, cause, .. } => {
            assert_eq!(elem_typings.len(), 3, "all the element typings should be included");
            assert_matches!(elem_typings[0].typ.typ, TypeF::Num);
            assert_matches!(elem_typings[1].typ.typ, TypeF::Num);
            assert_matches!(elem_typings[2].typ.typ, TypeF::Str);
            assert_matches!(*cause, TypecheckError::TypeMismatch { .. });
        }
    );
}

#[test]
fn incompatible_objects() {
    let err = type_error(
        r#"
        let o1 = { x: 1 }
        let o2 = { x: "2" }
        let arr = [o1, o2]
        "#,
    );

    assert_matches!(
        err,
        TypecheckError::ArrayLiteral { elem_typings, .. } => {
            assert_eq!(elem_typings.len(), 2);
            assert_type(&elem_typings[0].typ, "{ x: Num }");
            assert_type(&elem_typings[1].typ, "{ x: String }");
        }
    );
}

#[test]
fn parameter_mismatch() {
    let src = r#" let f = (x) => x + 1; f("hi"); "#;
    let err = type_error(src);

    assert_matches!(
        err,
        TypecheckError::CallArgument {
            callee,
            callee_typing,
            arg_typings,
            bad_arg_index,
            ..
        } => {
            let callee_start = src.find(r#"f("hi")"#).unwrap();
            assert_eq!(
                callee.pos.into_opt().map(|span| span.to_range()),
                Some(callee_start..callee_start + 1)
            );
            assert_type(&callee_typing.typ, "(Num) => Num");
            assert_eq!(arg_typings.len(), 1);
            assert_matches!(arg_typings[0].typ.typ, TypeF::Str);
            assert_eq!(bad_arg_index, Some(0));
        }
    );
}

#[test]
fn template_string_parameter() {
    let err = type_error(
        r#"
        let inc = (x) => x + 1
        let exclaim = (x) => `${inc(x)}!`
        exclaim('nope')
        "#,
    );

    assert_matches!(
        err,
        TypecheckError::CallArgument { callee_typing, arg_typings, bad_arg_index, .. } => {
            assert_type(&callee_typing.typ, "(Num) => String");
            assert_matches!(arg_typings[0].typ.typ, TypeF::Str);
            assert_eq!(bad_arg_index, Some(0));
        }
    );
}

#[test]
fn second_argument_mismatch() {
    let err = type_error(
        r#"
        let add = (x, y) => x + y
        add(1, "2")
        "#,
    );

    assert_matches!(
        err,
        TypecheckError::CallArgument { bad_arg_index: Some(1), .. }
    );
}

#[test]
fn arity_mismatch() {
    let err = type_error(
        r#"
        let add = (x, y) => x + y
        add(1)
        "#,
    );

    assert_matches!(err, TypecheckError::CallArgument { .. });
}

#[test]
fn calling_a_non_function() {
    assert_matches!(
        type_error("let n = 1\nn(2)"),
        TypecheckError::CallArgument { arg_typings, .. } if arg_typings.len() == 1
    );
}

#[test]
fn no_such_property() {
    assert_matches!(
        type_error("let o = { x: 1 }\no.y"),
        TypecheckError::NoSuchProperty { label, .. } if label.label() == "y"
    );
}

#[test]
fn not_an_object() {
    assert_matches!(
        type_error("let s = \"hi\"\ns.x"),
        TypecheckError::NotAnObject { label, typ, .. } => {
            assert_eq!(label.label(), "x");
            assert_matches!(typ.typ, TypeF::Str);
        }
    );
}

#[test]
fn mismatched_branches() {
    assert_matches!(
        type_error("let r = true ? 0 : 'one'"),
        TypecheckError::TypeMismatch { .. }
    );
}

#[test]
fn non_boolean_condition() {
    assert_matches!(
        type_error("let r = 1 ? 0 : 1"),
        TypecheckError::TypeMismatch { left, right } => {
            assert_matches!(
                (&left.typ, &right.typ),
                (TypeF::Num, TypeF::Bool) | (TypeF::Bool, TypeF::Num)
            );
        }
    );
}

#[test]
fn arithmetic_on_strings() {
    assert_matches!(
        type_error("let s = 'a' * 2"),
        TypecheckError::TypeMismatch { .. }
    );
}

#[test]
fn conflicting_parameter_uses() {
    // `x` is used both as a boolean and as a number.
    assert_matches!(
        type_error("let f = (x) => x ? x + 1 : 0"),
        TypecheckError::TypeMismatch { .. }
    );
}

#[test]
fn closed_record_argument() {
    let err = type_error(
        r#"
        $assume`getX: ({ x: Num }) => Num`
        getX({ x: 1, y: 2 })
        "#,
    );

    assert_matches!(err, TypecheckError::CallArgument { .. });
}

#[test]
fn partial_environment() {
    let result = check(
        r#"
        let before = 1
        let broken = before + "s"
        let after = 2
        "#,
    );

    assert!(result.type_error.is_some());
    assert!(result.env.get("before").is_some());
    assert!(result.env.get("broken").is_none());
    assert!(result.env.get("after").is_none());
}
