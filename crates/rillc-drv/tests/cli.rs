//! CLI surface tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_prints_usage() {
    Command::cargo_bin("rillc")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--output"));
}

#[test]
fn short_and_long_version_flags() {
    for flag in ["-v", "--version"] {
        Command::cargo_bin("rillc")
            .unwrap()
            .arg(flag)
            .assert()
            .success()
            .stdout(predicate::str::contains("rillc"));
    }
}

#[test]
fn missing_source_argument_fails() {
    Command::cargo_bin("rillc").unwrap().assert().failure();
}

#[test]
fn unreadable_source_file_fails_with_its_path() {
    Command::cargo_bin("rillc")
        .unwrap()
        .arg("does-not-exist.rill")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.rill"));
}

#[test]
fn diagnostics_carry_file_line_and_column() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("broken.rill");
    std::fs::write(&source, "fn main() -> i32 {\n  return ;\n}\n").unwrap();

    Command::cargo_bin("rillc")
        .unwrap()
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.rill:2:10"));
}

#[test]
fn type_errors_are_reported_before_any_tool_runs() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("typed.rill");
    std::fs::write(&source, "fn main() -> i32 { return true; }\n").unwrap();

    Command::cargo_bin("rillc")
        .unwrap()
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("type mismatch"));
}
