use codespan::Files;
use jszero_core::{
    error::report::report_as_string,
    parser::annotation::Annotation,
    pretty::Allocator,
    program::Program,
    typ::{Row, Type, TypeF, VarSupply},
};
use pretty_assertions::assert_eq;

use crate::check;

fn rendered(src: &str, name: &str) -> String {
    check(src).env.get(name).unwrap().typ.to_string()
}

#[test]
fn inferred_types() {
    let cases = [
        ("let id = (x) => x", "id", "(a) => a"),
        ("let k = (x, y) => x", "k", "(a, b) => a"),
        ("let choose = (i, a, b) => i > 0 ? a : b", "choose", "(Num, a, a) => a"),
        ("let wrap = (x) => [x]", "wrap", "(a) => Array(a)"),
        ("let Point = (x, y) => ({ x: x, y: y })", "Point", "(a, b) => { x: a, y: b }"),
        ("let get = (f) => f({})", "get", "(({}) => a) => a"),
        ("let f = () => {}", "f", "() => Undefined"),
    ];

    for (src, name, expected) in cases {
        assert_eq!(rendered(src, name), expected, "while rendering `{name}`");
    }
}

#[test]
fn row_variables() {
    let src = r#"
        $assume`Object: { let: ({ ...r }, { x: Num }) => { ...r, x: Num } }`
        let extend = (obj) => Object.let(obj, { x: 10 })
    "#;

    assert_eq!(rendered(src, "extend"), "({ ...r }) => { ...r, x: Num }");
}

#[test]
fn variable_names_ignore_ids() {
    // Irrelevant variables first.
    let mut vars = VarSupply::new();
    for _ in 0..3 {
        vars.fresh_type_var(None);
    }
    let a = vars.fresh_type_var(None);
    let b = vars.fresh_type_var(None);

    let typ = Type::arrow(vec![a.clone(), b], a);
    assert_eq!(typ.to_string(), "(a, b) => a");
}

#[test]
fn shared_allocator_keeps_names() {
    let mut vars = VarSupply::new();
    let a = vars.fresh_type_var(None);
    let b = vars.fresh_type_var(None);
    let r = vars.fresh_row_var(None);

    let alloc = Allocator::default();
    assert_eq!(alloc.render(&b), "a");
    assert_eq!(alloc.render(&Type::arrow(vec![a], b.clone())), "(b) => a");
    assert_eq!(
        alloc.render(&Type::record(vec![Row::Var(r)])),
        "{ ...r }"
    );
}

#[test]
fn annotations_render_like_inferred_types() {
    for src in [
        "(a, b) => a",
        "(Array(Num)) => Num",
        "({ ...r }) => { ...r, x: Num }",
        "{ x: Num, y: (Bool) => String }",
        "Map(String, a)",
    ] {
        let annotation = Annotation::compile(src).unwrap();
        assert_eq!(annotation.to_string(), src);
    }
}

#[test]
fn object_annotations() {
    let annotations = [
        Annotation::compile("({ obj }) => { ...obj, x: Num }").unwrap(),
        Annotation::compile("({ ...obj }) => { ...obj, x: Num }").unwrap(),
    ];

    let mut vars = VarSupply::new();
    let row = vars.fresh_row_var(None);
    let x_num = || [(jszero_core::identifier::Ident::from("x"), Type::from(TypeF::Num))];

    let expected = Type::arrow(
        vec![Type::record(vec![Row::Var(row.clone())])],
        Type::record_of(x_num().into_iter().collect(), Some(row)),
    );

    for annotation in &annotations {
        assert!(annotation.matches(&expected));
    }

    // Distinct row variables on both sides.
    let invalid = Type::arrow(
        vec![Type::record(vec![Row::Var(vars.fresh_row_var(None))])],
        Type::record_of(x_num().into_iter().collect(), Some(vars.fresh_row_var(None))),
    );

    for annotation in &annotations {
        assert!(
            !annotation.matches(&invalid),
            "does not match against separate row variables"
        );
    }
}

#[test]
fn type_error_report() {
    let mut program = Program::new_from_source("let f = (x) => x + 1\nf('hi')", "test.js");
    let result = program.check().unwrap();
    let err = result.inferred.type_error.unwrap();
    let report = program.report_as_string(err);

    assert!(report.contains("test.js:2:"), "{report}");
    assert!(report.contains("(Num) => Num"), "{report}");
    assert!(report.contains("String"), "{report}");
}

#[test]
fn parse_error_report() {
    let src = "let a = f(1, 2";
    let mut files = Files::new();
    let id = files.add("broken.js", String::from(src));
    let err = jszero_core::parser::parse(id, src).unwrap_err();

    let report = report_as_string(&mut files, err);
    assert!(report.contains("unexpected end of input"), "{report}");
    assert!(report.contains("broken.js"), "{report}");
}
