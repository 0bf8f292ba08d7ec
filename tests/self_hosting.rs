use pegc::compiler::{lower_grammar, meta_grammar, parse_grammar};
use pegc::generators::gen_grammar;
use pegc::runtime::RuntimeOptions;
use pretty_assertions::assert_eq;

#[test]
fn meta_grammar_source_is_a_fixpoint() {
    let source = gen_grammar(&meta_grammar());
    let reparsed = parse_grammar(&source).unwrap();

    assert_eq!(gen_grammar(&reparsed), source);
}

#[test]
fn meta_grammar_parses_itself_once_compiled_from_source() {
    let source = gen_grammar(&meta_grammar());

    // The meta-grammar, compiled from its own source text rather than from data
    let bootstrapped = pegc::compile(&source, Some("meta.peg")).unwrap();

    let tree = bootstrapped
        .parse_with(&source, None, RuntimeOptions::new().with_full_match(true))
        .unwrap_or_else(|err| panic!("{}", bootstrapped.report(&source, &err)));

    let grammar = lower_grammar(&tree.value).unwrap();

    assert_eq!(grammar.rules.len(), meta_grammar().rules.len());
    assert_eq!(gen_grammar(&grammar), source);
}

#[test]
fn user_grammars_survive_formatting() {
    let source = include_str!("fixtures/lambda.peg");

    let formatted = gen_grammar(&parse_grammar(source).unwrap());
    let reformatted = gen_grammar(&parse_grammar(&formatted).unwrap());

    assert_eq!(reformatted, formatted);

    let original = pegc::compile(source, None).unwrap();
    let formatted = pegc::compile(&formatted, None).unwrap();
    let subject = include_str!("fixtures/lambda.txt");

    assert_eq!(formatted.parse(subject), original.parse(subject));
}
