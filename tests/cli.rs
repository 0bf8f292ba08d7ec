use assert_cmd::Command;
use predicates::prelude::*;

fn pegc() -> Command {
    let mut cmd = Command::cargo_bin("pegc").unwrap();
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd
}

#[test]
fn checks_grammars() {
    pegc()
        .args(["tests/fixtures/lambda.peg", "--emit", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tests/fixtures/lambda.peg: 8 rules, 0 pasta blocks"));
}

#[test]
fn formats_grammars() {
    pegc()
        .args(["tests/fixtures/lambda.peg", "--emit", "grammar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("term = abs\n    | app ;\n"))
        .stdout(predicate::str::contains("--").not());
}

#[test]
fn generates_rust_by_default() {
    pegc()
        .arg("tests/fixtures/calc.peg")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("fn number(text: &str) -> i64 {"))
        .stdout(predicate::str::contains("pub fn parse"));
}

#[test]
fn generated_rust_follows_options() {
    pegc()
        .args(["tests/fixtures/calc.peg", "--emit", "rust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skip_whitespace"));

    pegc()
        .args(["tests/fixtures/calc.peg", "--no-template-whitespace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skip_whitespace").not());
}

#[test]
fn parses_inputs_to_json() {
    pegc()
        .args(["tests/fixtures/lambda.peg", "--input", "tests/fixtures/lambda.txt", "--full"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"app\""))
        .stdout(predicate::str::contains("\"kind\": \"abs\""));
}

#[test]
fn reports_input_failures() {
    pegc()
        .args(["tests/fixtures/lambda.peg", "--input", "tests/fixtures/unknown_rule.peg", "--full"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("list = '[' item* ']' ;\n     ^\n"))
        .stdout(predicate::str::contains("1:6: Expected <eof>"));
}

#[test]
fn reports_compile_errors() {
    pegc()
        .args(["tests/fixtures/unknown_rule.peg", "--emit", "check"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "tests/fixtures/unknown_rule.peg: 1:12: Unknown rule 'item'",
        ));

    pegc()
        .arg("tests/fixtures/missing_equals.peg")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("b 'b' ;\n  ^\n"))
        .stdout(predicate::str::contains("2:3: Expected ="));
}

#[test]
fn host_mappers_cannot_be_interpreted() {
    pegc()
        .args(["tests/fixtures/calc.peg", "--input", "tests/fixtures/lambda.txt"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Invalid mapper"));
}

#[test]
fn missing_files() {
    pegc()
        .arg("tests/fixtures/nothing.peg")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read 'tests/fixtures/nothing.peg'"));
}
