use pegc::runtime::{Failure, Outcome, RuntimeError, RuntimeOptions, Success, Value};
use pegc_generated::{backref, calc, lists, shadowing};
use pretty_assertions::assert_eq;

/// Run a grammar through the interpreter
fn interpret(grammar: &str, entry: Option<&str>, subject: &str) -> Outcome<Value> {
    let parser = pegc::compile(grammar, None).unwrap();

    parser
        .parse_with(subject, entry, RuntimeOptions::new())
        .map_err(|err| match err {
            RuntimeError::Failed(failure) => failure,
            err => panic!("{}", err),
        })
}

#[test]
fn pasta_helpers_and_typed_rules() {
    assert_eq!(calc::parse("1 + 2 + 3"), Ok(Success::new(6, 9)));
    assert_eq!(calc::parse("12+30"), Ok(Success::new(42, 5)));
    assert_eq!(calc::parse("1 + x"), Err(Failure::new("/[0-9]+/", 4)));
}

#[test]
fn rules_named_like_locals() {
    let grammar = include_str!("../grammars/shadowing.peg");

    assert_eq!(shadowing::parse("abcde").map(|success| success.end), Ok(5));

    for subject in ["abcde", "abcdx", "ab", ""] {
        assert_eq!(shadowing::parse(subject), interpret(grammar, None, subject), "{:?}", subject);
    }
}

#[test]
fn back_references_match_captured_text() {
    let grammar = include_str!("../grammars/backref.peg");

    assert_eq!(backref::parse("x x"), Ok(Success::new(Value::from("x x"), 3)));

    for subject in ["x x", "x  x", "xx", "x y"] {
        assert_eq!(backref::parse(subject), interpret(grammar, None, subject), "{:?}", subject);
    }

    for subject in ["ab ab", "ab ac", "ab abc", "a"] {
        assert_eq!(
            backref::rules::twice(subject, 0),
            interpret(grammar, Some("twice"), subject),
            "{:?}",
            subject
        );
    }
}

#[test]
fn both_backends_agree() {
    let grammar = include_str!("../grammars/lists.peg");

    for subject in [
        "[]",
        "[ nil, abc!, 42 , foo, \"hi there\" ]",
        "[abc!x]",
        "[abc ! , 7]",
        "[12",
        "[nil,]",
        "[ab1]",
        "[\"open",
        "",
    ] {
        assert_eq!(lists::parse(subject), interpret(grammar, None, subject), "{:?}", subject);
    }
}
