use assert_matches::assert_matches;
use jszero_core::error::{Error, ParseError, ScopeError};

use crate::{scope_error, try_check};

#[test]
fn unbound_identifier() {
    assert_matches!(
        scope_error("let point = 1\nlet f = (x) => poitn + x"),
        ScopeError::UnboundIdentifier { id, in_scope } => {
            assert_eq!(id.label(), "poitn");
            assert!(in_scope.iter().any(|name| name.label() == "point"));
            assert!(in_scope.iter().any(|name| name.label() == "x"));
        }
    );
}

#[test]
fn parameters_dont_escape() {
    assert_matches!(
        scope_error("let f = (x) => x\nlet y = x"),
        ScopeError::UnboundIdentifier { id, .. } if id.label() == "x"
    );
}

#[test]
fn block_scoping() {
    assert_matches!(
        scope_error("let f = () => {\n  { let y = 1 }\n  return y\n}"),
        ScopeError::UnboundIdentifier { id, .. } if id.label() == "y"
    );
}

#[test]
fn already_defined() {
    assert_matches!(
        scope_error("let a = 1\nlet a = 2"),
        ScopeError::AlreadyDefined { id, previous } => {
            assert_eq!(id.label(), "a");
            assert_eq!(previous.into_opt().map(|span| span.to_range()), Some(4..5));
        }
    );
}

#[test]
fn shadowing_in_nested_scope() {
    let result = try_check("let a = 1\nlet f = (a) => a").unwrap();
    assert!(result.type_error.is_none());
}

#[test]
fn unsupported_syntax() {
    let cases = [
        "const a = 1",
        "var a = 1",
        "let a = 1, b = 2",
        "let { x } = { x: 1 }",
        "let a",
        "let f = ({ x }) => x",
        "if (true) { 1 }",
        "while (true) {}",
        "return 1",
        "let a = -(1)",
        "let a = !true",
        "let a = 1\na = 2",
        "let o = { x: 1 }\nlet a = o['x']",
        "let tag = (s) => s\ntag`text`",
    ];

    for src in cases {
        assert_matches!(
            scope_error(src),
            ScopeError::UnsupportedSyntax { .. },
            "while checking `{src}`"
        );
    }
}

#[test]
fn computed_object_keys() {
    assert_matches!(
        scope_error("let k = 'x'\nlet o = { [k]: 1 }"),
        ScopeError::InvalidObjectKey { .. }
    );
}

#[test]
fn duplicate_labels() {
    assert_matches!(
        scope_error("let o = { x: 1, 'x': 2 }"),
        ScopeError::DuplicateLabel { label, .. } if label.label() == "x"
    );
}

#[test]
fn invalid_assumptions() {
    let cases = [
        "$assume`f (Num) => Num`",
        "$assume`1f: Num`",
        "$assume`f: (Num`",
        "let t = 1\n$assume`f: ${t}`",
    ];

    for src in cases {
        assert_matches!(
            scope_error(src),
            ScopeError::InvalidAssumption { .. },
            "while checking `{src}`"
        );
    }
}

#[test]
fn parse_errors_are_reported_first() {
    assert_matches!(
        try_check("let a = 1 ==\nlet b = unbound"),
        Err(Error::ParseError(ParseError::UnexpectedToken { .. }))
    );
}
