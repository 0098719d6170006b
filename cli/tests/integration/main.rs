use std::{fs, path::PathBuf};

use assert_cmd::Command;
use pretty_assertions::assert_eq;

fn jszero() -> Command {
    Command::cargo_bin("jszero").expect("the jszero binary should be built")
}

fn check_stdin(args: &[&str], input: &str) -> (Option<i32>, String, String) {
    let output = jszero()
        .arg("check")
        .args(args)
        .write_stdin(input)
        .output()
        .expect("jszero should be runnable");

    (
        output.status.code(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("jszero-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn prints_bindings_from_stdin() {
    let (code, stdout, _) = check_stdin(&[], "let id = (x) => x\nlet n = id(1)\n");

    assert_eq!(code, Some(0));
    assert_eq!(stdout, "id: (a) => a\nn: Num\n");
}

#[test]
fn json_output() {
    let (code, stdout, _) = check_stdin(&["--format", "json"], "let s = `hi`");

    assert_eq!(code, Some(0));
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["file"], "<stdin>");
    assert_eq!(value["bindings"][0]["name"], "s");
    assert_eq!(value["bindings"][0]["type"], "String");
}

#[test]
fn type_errors_exit_with_failure() {
    let (code, stdout, stderr) = check_stdin(
        &["--color", "never"],
        "let n = 1\nlet f = (x) => x + 1\nf('one')",
    );

    assert_eq!(code, Some(1));
    assert_eq!(stdout, "n: Num\nf: (Num) => Num\n");
    assert!(stderr.contains("error"), "{stderr}");
    assert!(stderr.contains("<stdin>"), "{stderr}");
}

#[test]
fn parse_errors_print_nothing() {
    let (code, stdout, stderr) = check_stdin(&["--color", "never"], "let a = (");

    assert_eq!(code, Some(1));
    assert_eq!(stdout, "");
    assert!(stderr.contains("unexpected end of input"), "{stderr}");
}

#[test]
fn json_diagnostics() {
    let (code, _, stderr) = check_stdin(&["--format", "json"], "let a = b");

    assert_eq!(code, Some(1));
    let value: serde_json::Value = serde_json::from_str(stderr.trim()).unwrap();
    assert!(value["diagnostics"].is_array());
}

#[test]
fn checks_files() {
    let first = temp_file("first.js", "let a = 1\n");
    let second = temp_file("second.js", "let b = [true]\n");

    let output = jszero()
        .arg("check")
        .arg(&first)
        .arg(&second)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        format!(
            "// {}\na: Num\n// {}\nb: Array(Bool)\n",
            first.display(),
            second.display()
        )
    );
}

#[test]
fn missing_file() {
    let output = jszero()
        .args(["check", "--color", "never", "does/not/exist.js"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does/not/exist.js"), "{stderr}");
}
