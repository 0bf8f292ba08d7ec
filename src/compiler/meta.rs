//! The meta-grammar: the grammar of grammars, written as plain data
//!
//! It is compiled and interpreted like any other grammar. Its mappers build [`Value::Node`](crate::runtime::Value)
//! trees which are then [lowered](super::lower) to the [data model](super::data).

use super::data::{
    Alternative, Grammar, Mapper, PatternValue, Rep, Repetition, Rule, RuleKind,
    SimplePattern, Span,
};
use super::errors::CompileError;
use super::program::{compile_grammar, CompileOptions, Program};
use lazy_static::lazy_static;

lazy_static! {
    static ref META_PROGRAM: Result<Program, CompileError> =
        compile_grammar(&meta_grammar(), &CompileOptions::new());
}

/// Get the compiled meta-grammar
pub fn meta_program() -> Result<&'static Program, CompileError> {
    META_PROGRAM.as_ref().map_err(Clone::clone)
}

/// Build the meta-grammar
///
/// Its entry rule, `grammar`, produces a `grammar([items...])` node.
pub fn meta_grammar() -> Grammar {
    let rules = vec![
        // Top level
        rule(
            "grammar",
            vec![alt(vec![one(id("ws")), any_of(id("item"))], "grammar($1)")],
        ),
        rule("item", vec![bare(vec![one(id("pasta"))]), bare(vec![one(id("rule"))])]),
        rule(
            "pasta",
            vec![alt(
                vec![one(lit("%{")), one(id("pastaText")), one(lit("}%")), one(id("ws"))],
                "pasta($1)",
            )],
        ),
        rule(
            "pastaText",
            vec![alt(vec![any_of(apply("not", lit("}%")))], "text()")],
        ),
        // Rules
        rule(
            "rule",
            vec![
                alt(
                    vec![
                        one(apply("look", id("tplHead"))),
                        opt(id("id")),
                        one(lit("`")),
                        one(id("id")),
                        one(lit("`")),
                        one(id("ws")),
                        opt(id("typeAnn")),
                        one(lit("=")),
                        one(id("ws")),
                        one(id("alternatives")),
                        one(lit(";")),
                        one(id("ws")),
                    ],
                    "templateRule($1, $3, $6, $9)",
                ),
                alt(
                    vec![
                        one(id("id")),
                        one(id("ws")),
                        opt(id("typeAnn")),
                        one(lit("=")),
                        one(id("ws")),
                        one(id("alternatives")),
                        one(lit(";")),
                        one(id("ws")),
                    ],
                    "rule($0, $2, $5)",
                ),
            ],
        ),
        rule("tplHead", vec![bare(vec![opt(id("id")), one(lit("`"))])]),
        rule(
            "typeAnn",
            vec![alt(vec![one(lit(":")), one(id("ws")), one(rx("[^=;]+"))], "$2")],
        ),
        rule(
            "alternatives",
            vec![alt(
                vec![one(id("alternative")), any_of(id("altTail"))],
                "[$0] + $1",
            )],
        ),
        rule(
            "altTail",
            vec![alt(vec![one(lit("|")), one(id("ws")), one(id("alternative"))], "$2")],
        ),
        rule(
            "alternative",
            vec![alt(
                vec![one_or_more(id("rep")), opt(id("mapper"))],
                "alternative($0, $1)",
            )],
        ),
        rule(
            "mapper",
            vec![alt(
                vec![one(lit("%%")), one(id("mapperText")), one(id("ws"))],
                "mapper($1)",
            )],
        ),
        // Rest of the line, and the following lines as long as they are indented and do not
        // start an alternative, end the rule or hold a comment
        rule(
            "mapperText",
            vec![bare(vec![one(rx(r"[^\n]*(\n[ \t]+[^|;\s-][^\n]*)*"))])],
        ),
        // Patterns
        rule(
            "rep",
            vec![alt(vec![one(id("simple")), opt(id("modifier")), one(id("ws"))], "rep($0, $1)")],
        ),
        rule("modifier", vec![bare(vec![one(rx("[?*+]"))])]),
        rule(
            "simple",
            vec![
                bare(vec![one(id("literal"))]),
                bare(vec![one(id("regex"))]),
                bare(vec![one(id("any"))]),
                bare(vec![one(id("variable"))]),
                bare(vec![one(id("group"))]),
                alt(vec![one(apply("look", id("tplHead"))), one(id("template"))], "$1"),
                alt(vec![one(apply("look", id("applyHead"))), one(id("apply"))], "$1"),
                alt(vec![one(id("id"))], "id($0)"),
            ],
        ),
        rule("applyHead", vec![bare(vec![one(id("id")), one(lit("("))])]),
        rule(
            "literal",
            vec![alt(vec![one(rx(r"'(\\.|[^'\\])*'"))], "literal($0)")],
        ),
        rule(
            "regex",
            vec![alt(vec![one(rx(r"/(\\.|[^/\\\n])*/[is]*"))], "regex($0)")],
        ),
        rule("any", vec![alt(vec![one(lit("."))], "any()")]),
        rule("variable", vec![alt(vec![one(rx(r"\$[0-9]+"))], "variable($0)")]),
        rule(
            "group",
            vec![alt(
                vec![
                    one(lit("(")),
                    one(id("ws")),
                    one_or_more(id("groupItem")),
                    one(lit(")")),
                ],
                "group($2)",
            )],
        ),
        rule(
            "groupItem",
            vec![alt(
                vec![opt(lit("!")), one(id("ws")), one(id("rep"))],
                "groupItem($0, $2)",
            )],
        ),
        rule(
            "template",
            vec![alt(
                vec![opt(id("id")), one(lit("`")), one(rx("[^`]*")), one(lit("`"))],
                "template($0, $2)",
            )],
        ),
        rule(
            "apply",
            vec![alt(
                vec![
                    one(id("id")),
                    one(lit("(")),
                    one(id("ws")),
                    one(id("simple")),
                    one(id("ws")),
                    one(lit(")")),
                ],
                "apply($0, $3)",
            )],
        ),
        // Lexemes
        rule("id", vec![bare(vec![one(rx("[a-zA-Z_][a-zA-Z0-9_]*"))])]),
        rule("ws", vec![bare(vec![one(rx(r"(\s|--[^\n]*)*"))])]),
    ];

    Grammar::new(vec![], rules)
}

fn pattern(value: PatternValue) -> SimplePattern {
    SimplePattern::new(value, Span::default())
}

fn lit(string: &str) -> SimplePattern {
    pattern(PatternValue::Literal(string.to_owned()))
}

fn rx(source: &str) -> SimplePattern {
    pattern(PatternValue::Regex {
        source: source.to_owned(),
        flags: String::new(),
    })
}

fn id(name: &str) -> SimplePattern {
    pattern(PatternValue::Id(name.to_owned()))
}

fn apply(func: &str, inner: SimplePattern) -> SimplePattern {
    pattern(PatternValue::Apply {
        func: func.to_owned(),
        pattern: Box::new(inner),
    })
}

fn repeated(pattern: SimplePattern, repetition: Option<Repetition>) -> Rep {
    Rep {
        pattern,
        repetition,
        span: Span::default(),
    }
}

fn one(pattern: SimplePattern) -> Rep {
    repeated(pattern, None)
}

fn opt(pattern: SimplePattern) -> Rep {
    repeated(pattern, Some(Repetition::Optional))
}

fn any_of(pattern: SimplePattern) -> Rep {
    repeated(pattern, Some(Repetition::Any))
}

fn one_or_more(pattern: SimplePattern) -> Rep {
    repeated(pattern, Some(Repetition::OneOrMore))
}

fn bare(items: Vec<Rep>) -> Alternative {
    Alternative {
        items,
        mapper: None,
        span: Span::default(),
    }
}

fn alt(items: Vec<Rep>, mapper: &str) -> Alternative {
    Alternative {
        mapper: Some(Mapper {
            code: mapper.to_owned(),
            span: Span::default(),
        }),
        ..bare(items)
    }
}

fn rule(name: &str, alternatives: Vec<Alternative>) -> Rule {
    Rule {
        kind: RuleKind::Simple {
            name: name.to_owned(),
        },
        ty: None,
        alternatives,
        span: Span::default(),
    }
}
