use crate::{assert_inferred, check};

#[test]
fn literals() {
    assert_inferred(
        "let n = 1.5\nlet s = 'str'\nlet b = false\nlet t = `x`",
        &[("n", "Num"), ("s", "String"), ("b", "Bool"), ("t", "String")],
    );
}

#[test]
fn operators() {
    assert_inferred(
        r#"
        let sum = 1 + 2 * 3 ** 2
        let cmp = 1 < 2
        let same = "a" === "b"
        let both = cmp && same
        let add = (x, y) => x + y
        let eq = (x, y) => x === y
        "#,
        &[
            ("sum", "Num"),
            ("cmp", "Bool"),
            ("same", "Bool"),
            ("both", "Bool"),
            ("add", "(Num, Num) => Num"),
            ("eq", "(a, a) => Bool"),
        ],
    );
}

#[test]
fn let_polymorphism() {
    assert_inferred(
        r#"
        let id = (x) => x
        let a = id(1)
        let b = id("s")
        "#,
        &[("id", "(t) => t"), ("a", "Num"), ("b", "String")],
    );
}

#[test]
fn higher_order_functions() {
    assert_inferred(
        r#"
        let apply = (f, x) => f(x)
        let compose = (f, g) => (x) => f(g(x))
        let inc = (n) => n + 1
        let two = apply(inc, 1)
        let incTwice = compose(inc, inc)
        "#,
        &[
            ("apply", "((a) => b, a) => b"),
            ("compose", "((b) => c, (a) => b) => (a) => c"),
            ("two", "Num"),
            ("incTwice", "(Num) => Num"),
        ],
    );
}

#[test]
fn params_are_monomorphic() {
    // `f` is a parameter, so both uses must agree.
    assert_inferred(
        "let twice = (f, x) => f(f(x))",
        &[("twice", "((a) => a, a) => a")],
    );
}

#[test]
fn self_reference() {
    assert_inferred(
        "let loop = (x) => loop(x)\nlet countdown = (n) => n > 0 ? countdown(n - 1) : n",
        &[("loop", "(a) => b"), ("countdown", "(Num) => Num")],
    );
}

#[test]
fn parameters_shadowing_the_function_name() {
    assert_inferred(
        r#"
        let f = (f) => f
        let n = f(1)
        let g = (g, y) => g + y
        "#,
        &[("f", "(a) => a"), ("n", "Num"), ("g", "(Num, Num) => Num")],
    );
}

#[test]
fn parameters_shadowing_outer_bindings() {
    assert_inferred(
        r#"
        let x = "outer"
        let inc = (x) => x + 1
        let s = x
        "#,
        &[("inc", "(Num) => Num"), ("s", "String")],
    );
}

#[test]
fn nested_scopes() {
    assert_inferred(
        r#"
        let outer = (x) => {
          let inner = (y) => x + y
          return inner
        }
        "#,
        &[("outer", "(Num) => (Num) => Num")],
    );
}

#[test]
fn arrays() {
    assert_inferred(
        r#"
        let wrapNum = (x) => [x, 1]
        let wrapPoly = (x) => [x]
        let empty = []
        let nested = [[1], []]
        "#,
        &[
            ("wrapNum", "(Num) => Array(Num)"),
            ("wrapPoly", "(a) => Array(a)"),
            ("empty", "Array(a)"),
            ("nested", "Array(Array(Num))"),
        ],
    );
}

#[test]
fn ternary() {
    assert_inferred(
        r#"
        let result = true ? 0 : 1
        let choose = (i, a, b) => i > 0 ? a : b
        "#,
        &[("result", "Num"), ("choose", "(Num, a, a) => a")],
    );
}

#[test]
fn objects() {
    assert_inferred(
        r#"
        let Point = (x, y) => ({ x: x, y: y })
        let p = Point(10, 20)
        let px = p.x
        "#,
        &[
            ("Point", "(a, b) => { x: a, y: b }"),
            ("p", "{ x: Num, y: Num }"),
            ("px", "Num"),
        ],
    );
}

#[test]
fn shorthand_and_literal_keys() {
    assert_inferred(
        r#"
        let name = "n"
        let obj = { "full name": name, 1: true, name }
        let n = obj.name
        "#,
        &[("obj", r#"{ "full name": String, "1": Bool, name: String }"#), ("n", "String")],
    );
}

#[test]
fn row_splitting() {
    assert_inferred(
        r#"
        $assume`Object: { let: ({ ...r }, { x: Num }) => { ...r, x: Num } }`
        let extend = (obj) => Object.let(obj, { x: 10 })
        let r = extend({ y: "20" })
        let y = r.y
        "#,
        &[
            ("extend", "({ r }) => { ...r, x: Num }"),
            ("r", "{ x: Num, y: String }"),
            ("y", "String"),
        ],
    );
}

#[test]
fn open_records_from_annotations() {
    assert_inferred(
        r#"
        $assume`getX: ({ ...r, x: a }) => a`
        let a = getX({ x: 1, y: "extra" })
        let b = getX({ x: "s" })
        "#,
        &[("a", "Num"), ("b", "String")],
    );
}

#[test]
fn block_bodies() {
    assert_inferred(
        r#"
        let f = (x) => {
          let sub = x + 1
          let result = sub
          return `Result: ${result}`
        }
        "#,
        &[("f", "(Num) => String")],
    );
}

#[test]
fn early_return() {
    // Statements after the first `return` aren't checked, even if they are ill-typed.
    assert_inferred(
        r#"
        let f = (x) => {
          return 5
          let result = x + "one"
          return `Result: ${result}`
        }
        "#,
        &[("f", "(a) => Num")],
    );
}

#[test]
fn early_empty_return() {
    assert_inferred(
        r#"
        let f = (x) => {
          return
          let result = x + 1
          return `Result: ${result}`
        }
        "#,
        &[("f", "(a) => ()")],
    );
}

#[test]
fn implicit_undefined() {
    assert_inferred(
        r#"
        let f = (x) => {
          let result = x + 1
        }
        let g = () => {}
        "#,
        &[("f", "(Num) => ()"), ("g", "() => Undefined")],
    );
}

#[test]
fn nested_blocks() {
    assert_inferred(
        r#"
        let f = (x) => {
          {
            let y = x + 1
            return y
          }
        }
        "#,
        &[("f", "(Num) => Num")],
    );
}

#[test]
fn assumptions() {
    assert_inferred(
        r#"
        $assume`f : (Array(Num)) => Num`
        let f = (x) => "assumed!"
        let fnum = f([20])
        "#,
        &[("f", "(Array(Num)) => Num"), ("fnum", "Num")],
    );
}

#[test]
fn polymorphic_assumptions() {
    assert_inferred(
        r#"
        $assume`map: ((a) => b, Array(a)) => Array(b)`
        let strs = map((n) => `${n}`, [1, 2])
        let nums = map((s) => 1, ["x"])
        "#,
        &[("strs", "Array(String)"), ("nums", "Array(Num)")],
    );
}

#[test]
fn bindings_are_in_definition_order() {
    let result = check("let b = 1\nlet a = 2\nlet c = 3");
    let names: Vec<_> = result.env.iter().map(|(id, _)| id.label().to_owned()).collect();

    assert_eq!(names, vec!["b", "a", "c"]);
}
