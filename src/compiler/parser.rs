use super::data::{Grammar, Span};
use super::errors::{CompileError, CompileErrorContent};
use super::lower::lower_grammar;
use super::meta::meta_program;
use crate::runtime::{execute, RuntimeContext, RuntimeOptions};
use tracing::debug;

/// Parse a grammar's source code
///
/// The source is matched against the [meta-grammar](super::meta_grammar). Syntax errors are reported at
/// the furthest position the meta-grammar reached, and any text left after the last rule is rejected.
///
/// ## Example usage
///
/// ```rust
/// use pegc::compiler::parse_grammar;
///
/// let grammar = parse_grammar("greeting = 'Hello' ' '+ /[a-z]+/i ;").unwrap();
/// assert_eq!(grammar.rules.len(), 1);
/// ```
pub fn parse_grammar(source: &str) -> Result<Grammar, CompileError> {
    let program = meta_program()?;

    let tree = execute(&RuntimeContext {
        program,
        subject: source,
        entry: None,
        options: RuntimeOptions::new(),
    })
    .map_err(|err| match err.failure() {
        Some(failure) => CompileError::new(
            Span::new(failure.position, failure.position),
            CompileErrorContent::Syntax(failure.clone()),
            None,
        ),
        None => CompileError::new(
            Span::default(),
            CompileErrorContent::MalformedSyntaxTree("entry rule"),
            None,
        ),
    })?;

    if tree.end < source.len() {
        return Err(CompileError::new(
            Span::new(tree.end, source.len()),
            CompileErrorContent::Leftover,
            Some("rules are written as: name = patterns ;"),
        ));
    }

    let grammar = lower_grammar(&tree.value)?;

    debug!(
        rules = grammar.rules.len(),
        pastas = grammar.pastas.len(),
        "parsed grammar"
    );

    Ok(grammar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{GroupItem, PatternValue, Repetition, RuleKind};
    use crate::runtime::Failure;
    use pretty_assertions::assert_eq;

    fn patterns(source: &str) -> Vec<PatternValue> {
        let grammar = parse_grammar(source).unwrap();

        grammar.rules[0].alternatives[0]
            .items
            .iter()
            .map(|rep| rep.pattern.value.clone())
            .collect()
    }

    #[test]
    fn simple_patterns() {
        assert_eq!(
            patterns(r"a = 'it\'s' /[a-z\/]+/is . $0 b ;"),
            vec![
                PatternValue::Literal("it's".into()),
                PatternValue::Regex {
                    source: "[a-z/]+".into(),
                    flags: "is".into()
                },
                PatternValue::Any,
                PatternValue::Variable(0),
                PatternValue::Id("b".into()),
            ]
        );
    }

    #[test]
    fn templates_and_applications() {
        let values = patterns("a = if`if` `(` not('x') look( b ) ;");

        assert_eq!(
            values[0],
            PatternValue::Template {
                func: Some("if".into()),
                body: "if".into()
            }
        );
        assert_eq!(
            values[1],
            PatternValue::Template {
                func: None,
                body: "(".into()
            }
        );
        assert!(matches!(&values[2], PatternValue::Apply { func, .. } if func == "not"));
        assert!(matches!(
            &values[3],
            PatternValue::Apply { func, pattern } if func == "look" && pattern.value == PatternValue::Id("b".into())
        ));
    }

    #[test]
    fn template_name_must_abut_the_backtick() {
        let values = patterns("a = if `if` ;");

        assert_eq!(values[0], PatternValue::Id("if".into()));
        assert!(matches!(&values[1], PatternValue::Template { func: None, .. }));
    }

    #[test]
    fn groups_and_repetitions() {
        let grammar = parse_grammar("a = ( 'x' !b+ )? ;").unwrap();
        let rep = &grammar.rules[0].alternatives[0].items[0];

        assert_eq!(rep.repetition, Some(Repetition::Optional));

        match &rep.pattern.value {
            PatternValue::Group(items) => {
                let flags = items.iter().map(|item: &GroupItem| item.important).collect::<Vec<_>>();
                assert_eq!(flags, vec![false, true]);
                assert_eq!(items[1].rep.repetition, Some(Repetition::OneOrMore));
            }
            other => panic!("expected a group, got {:?}", other),
        }
    }

    #[test]
    fn rules_and_pastas() {
        let grammar = parse_grammar(
            "%{ use std::fmt; }%\n\
             -- A comment\n\
             list: Vec<String> = item* %% $0\n\
             ;\n\
             kw`word` = word ;\n\
             `p` = p | 'x'\n\
               %% text()\n\
             ;",
        )
        .unwrap();

        assert_eq!(grammar.pastas.len(), 1);
        assert_eq!(grammar.pastas[0].code, " use std::fmt; ");

        assert_eq!(grammar.rules[0].ty.as_deref(), Some("Vec<String>"));
        assert_eq!(
            grammar.rules[1].kind,
            RuleKind::Template {
                name: Some("kw".into()),
                param: "word".into()
            }
        );
        assert_eq!(
            grammar.rules[2].kind,
            RuleKind::Template {
                name: None,
                param: "p".into()
            }
        );

        let alternatives = &grammar.rules[2].alternatives;
        assert_eq!(alternatives.len(), 2);
        assert!(alternatives[0].mapper.is_none());
        assert_eq!(alternatives[1].mapper.as_ref().unwrap().code, "text()");
    }

    #[test]
    fn multi_line_mappers() {
        let grammar = parse_grammar("a = 'x' 'y' %% pair(\n      $0,\n      $1)\n;").unwrap();

        assert_eq!(
            grammar.rules[0].alternatives[0].mapper.as_ref().unwrap().code,
            "pair(\n$0,\n$1)"
        );
    }

    #[test]
    fn syntax_errors() {
        let err = parse_grammar("a = 'x'").unwrap_err();
        assert_eq!(err.content(), &CompileErrorContent::Syntax(Failure::new(";", 7)));
        assert_eq!(err.content().to_string(), "Expected ;");

        let err = parse_grammar("a = 'x' ;\n123").unwrap_err();
        assert_eq!(err.content(), &CompileErrorContent::Leftover);
        assert_eq!(err.span(), Span::new(10, 13));
    }

    #[test]
    fn empty_grammar() {
        assert_eq!(parse_grammar("  -- nothing\n").unwrap(), Grammar::default());
    }
}
