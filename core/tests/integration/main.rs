use codespan::Files;
use jszero_core::{
    error::{Error, ScopeError, TypecheckError},
    parser::{self, annotation::Annotation},
    typ::Type,
    typecheck::{self, InferResult},
};

mod inference;
mod pretty;
mod scope_errors;
mod type_errors;

/// Parse and check a program. Panic on parse errors and fatal errors.
#[track_caller]
pub fn check(src: &str) -> InferResult {
    try_check(src).unwrap_or_else(|err| panic!("unexpected fatal error: {err:?}"))
}

/// Parse and check a program, returning fatal errors.
pub fn try_check(src: &str) -> Result<InferResult, Error> {
    let id = Files::new().add("<test>", String::from(src));
    let program = parser::parse(id, src)?;
    Ok(typecheck::type_check(&program)?)
}

/// Check a program and return its first type error. Panic if the program is well-typed.
#[track_caller]
pub fn type_error(src: &str) -> TypecheckError {
    check(src)
        .type_error
        .unwrap_or_else(|| panic!("expected a type error in:\n{src}"))
}

/// Check a program and return the fatal error it raises.
#[track_caller]
pub fn scope_error(src: &str) -> ScopeError {
    match try_check(src) {
        Err(Error::ScopeError(err)) => err,
        Err(err) => panic!("expected a scope error, got {err:?}"),
        Ok(_) => panic!("expected a scope error in:\n{src}"),
    }
}

/// Assert that a type is an instance of an annotation, up to variable renaming.
#[track_caller]
pub fn assert_type(typ: &Type, expected: &str) {
    let annotation = Annotation::compile(expected).unwrap();
    assert!(
        annotation.matches(typ),
        "expected a type matching `{expected}`, got `{typ}`"
    );
}

/// Check a well-typed program and compare the types of the given bindings with annotations.
#[track_caller]
pub fn assert_inferred(src: &str, expected: &[(&str, &str)]) {
    let result = check(src);

    if let Some(err) = &result.type_error {
        panic!("unexpected type error: {err:?}");
    }

    for (name, expected) in expected {
        let typing = result
            .env
            .get(*name)
            .unwrap_or_else(|| panic!("`{name}` isn't bound"));
        assert_type(&typing.typ, expected);
    }
}

#[test]
fn empty_program() {
    let result = check("");
    assert!(result.type_error.is_none());
    assert_eq!(result.env.iter().count(), 0);
}

#[test]
fn runs_are_independent() {
    // Variable ids aren't shared across runs: checking the same program twice gives the same
    // rendered types.
    let src = "let pair = (x, y) => [x, y]";
    let first = check(src).env.get("pair").unwrap().typ.to_string();
    let second = check(src).env.get("pair").unwrap().typ.to_string();

    assert_eq!(first, "(a, a) => Array(a)");
    assert_eq!(first, second);
}
