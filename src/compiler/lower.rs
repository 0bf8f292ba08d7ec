use super::data::{
    Alternative, Grammar, GroupItem, Mapper, Pasta, PatternValue, Rep, Repetition, Rule, RuleKind,
    SimplePattern, Span,
};
use super::errors::{CompileError, CompileErrorContent};
use super::singles::{normalize_mapper, parse_variable, split_regex, unescape_literal};
use crate::runtime::Value;

/// Convert the syntax tree produced by the [meta-grammar](super::meta_grammar) to a [`Grammar`]
pub fn lower_grammar(tree: &Value) -> Result<Grammar, CompileError> {
    let (children, _) = node(tree, "grammar")?;
    let mut grammar = Grammar::default();

    for item in list(child(children, 0, "grammar")?, "grammar items")? {
        match item.kind() {
            Some("pasta") => grammar.pastas.push(lower_pasta(item)?),
            Some("rule") | Some("templateRule") => grammar.rules.push(lower_rule(item)?),
            _ => return Err(malformed("grammar item")),
        }
    }

    Ok(grammar)
}

fn lower_pasta(item: &Value) -> Result<Pasta, CompileError> {
    let (children, span) = node(item, "pasta")?;

    Ok(Pasta {
        code: string(child(children, 0, "pasta")?, "pasta code")?.to_owned(),
        span,
    })
}

fn lower_rule(item: &Value) -> Result<Rule, CompileError> {
    let (kind, ty, alternatives, span) = match item.kind() {
        Some("templateRule") => {
            let (children, span) = node(item, "templateRule")?;

            let kind = RuleKind::Template {
                name: optional_string(child(children, 0, "template rule")?, "template name")?
                    .map(str::to_owned),
                param: string(child(children, 1, "template rule")?, "template parameter")?
                    .to_owned(),
            };

            (kind, child(children, 2, "template rule")?, child(children, 3, "template rule")?, span)
        }

        _ => {
            let (children, span) = node(item, "rule")?;

            let kind = RuleKind::Simple {
                name: string(child(children, 0, "rule")?, "rule name")?.to_owned(),
            };

            (kind, child(children, 1, "rule")?, child(children, 2, "rule")?, span)
        }
    };

    let ty = optional_string(ty, "rule type")?
        .map(str::trim)
        .filter(|ty| !ty.is_empty())
        .map(str::to_owned);

    let alternatives = list(alternatives, "alternatives")?
        .iter()
        .map(lower_alternative)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Rule {
        kind,
        ty,
        alternatives,
        span,
    })
}

fn lower_alternative(alt: &Value) -> Result<Alternative, CompileError> {
    let (children, span) = node(alt, "alternative")?;

    let items = list(child(children, 0, "alternative")?, "alternative items")?
        .iter()
        .map(lower_rep)
        .collect::<Result<Vec<_>, _>>()?;

    let mapper = match child(children, 1, "alternative")? {
        Value::Absent => None,
        mapper => {
            let (children, span) = node(mapper, "mapper")?;
            let code = normalize_mapper(string(child(children, 0, "mapper")?, "mapper code")?);

            (!code.is_empty()).then_some(Mapper { code, span })
        }
    };

    Ok(Alternative {
        items,
        mapper,
        span,
    })
}

fn lower_rep(rep: &Value) -> Result<Rep, CompileError> {
    let (children, span) = node(rep, "rep")?;

    let repetition = match optional_string(child(children, 1, "rep")?, "repetition")? {
        Some(symbol) => Some(
            symbol
                .chars()
                .next()
                .and_then(Repetition::parse)
                .ok_or_else(|| malformed("repetition"))?,
        ),
        None => None,
    };

    Ok(Rep {
        pattern: lower_pattern(child(children, 0, "rep")?)?,
        repetition,
        span,
    })
}

fn lower_pattern(pattern: &Value) -> Result<SimplePattern, CompileError> {
    let (children, span) = match pattern {
        Value::Node { children, span, .. } => (children.as_slice(), *span),
        _ => return Err(malformed("pattern")),
    };

    let token = || string(child(children, 0, "pattern")?, "pattern token");

    let value = match pattern.kind() {
        Some("literal") => PatternValue::Literal(unescape_literal(token()?)),

        Some("regex") => {
            let (source, flags) = split_regex(token()?);
            PatternValue::Regex { source, flags }
        }

        Some("any") => PatternValue::Any,

        Some("variable") => {
            PatternValue::Variable(parse_variable(token()?).ok_or_else(|| malformed("variable"))?)
        }

        Some("id") => PatternValue::Id(token()?.to_owned()),

        Some("template") => PatternValue::Template {
            func: optional_string(child(children, 0, "template")?, "template name")?
                .map(str::to_owned),
            body: string(child(children, 1, "template")?, "template body")?.to_owned(),
        },

        Some("apply") => PatternValue::Apply {
            func: token()?.to_owned(),
            pattern: Box::new(lower_pattern(child(children, 1, "apply")?)?),
        },

        Some("group") => PatternValue::Group(
            list(child(children, 0, "group")?, "group items")?
                .iter()
                .map(lower_group_item)
                .collect::<Result<Vec<_>, _>>()?,
        ),

        _ => return Err(malformed("pattern")),
    };

    Ok(SimplePattern::new(value, span))
}

fn lower_group_item(item: &Value) -> Result<GroupItem, CompileError> {
    let (children, _) = node(item, "groupItem")?;

    Ok(GroupItem {
        important: !child(children, 0, "group item")?.is_absent(),
        rep: lower_rep(child(children, 1, "group item")?)?,
    })
}

fn malformed(what: &'static str) -> CompileError {
    CompileError::new(
        Span::default(),
        CompileErrorContent::MalformedSyntaxTree(what),
        None,
    )
}

fn node<'v>(value: &'v Value, kind: &'static str) -> Result<(&'v [Value], Span), CompileError> {
    match value {
        Value::Node {
            kind: candidate,
            span,
            children,
        } if candidate == kind => Ok((children, *span)),
        _ => Err(malformed(kind)),
    }
}

fn child<'v>(children: &'v [Value], index: usize, what: &'static str) -> Result<&'v Value, CompileError> {
    children.get(index).ok_or_else(|| malformed(what))
}

fn list<'v>(value: &'v Value, what: &'static str) -> Result<&'v [Value], CompileError> {
    match value {
        Value::List(items) => Ok(items),
        _ => Err(malformed(what)),
    }
}

fn string<'v>(value: &'v Value, what: &'static str) -> Result<&'v str, CompileError> {
    value.as_str().ok_or_else(|| malformed(what))
}

fn optional_string<'v>(value: &'v Value, what: &'static str) -> Result<Option<&'v str>, CompileError> {
    match value {
        Value::Absent => Ok(None),
        value => string(value, what).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: &str, children: Vec<Value>) -> Value {
        Value::Node {
            kind: kind.into(),
            span: Span::new(0, 1),
            children,
        }
    }

    #[test]
    fn lowers_rules() {
        let tree = node(
            "grammar",
            vec![Value::List(vec![node(
                "rule",
                vec![
                    "a".into(),
                    " String ".into(),
                    Value::List(vec![node(
                        "alternative",
                        vec![
                            Value::List(vec![node(
                                "rep",
                                vec![node("literal", vec!["'x\\''".into()]), "*".into()],
                            )]),
                            node("mapper", vec![" $0 \n   ".into()]),
                        ],
                    )]),
                ],
            )])],
        );

        let grammar = lower_grammar(&tree).unwrap();
        let rule = &grammar.rules[0];

        assert_eq!(rule.name(), Some("a"));
        assert_eq!(rule.ty.as_deref(), Some("String"));

        let alt = &rule.alternatives[0];
        assert_eq!(alt.mapper.as_ref().map(|mapper| mapper.code.as_str()), Some("$0"));
        assert_eq!(alt.items[0].repetition, Some(Repetition::Any));
        assert_eq!(alt.items[0].pattern.value, PatternValue::Literal("x'".into()));
    }

    #[test]
    fn rejects_unexpected_shapes() {
        let err = lower_grammar(&node("grammar", vec![Value::List(vec!["oops".into()])])).unwrap_err();
        assert_eq!(err.content(), &CompileErrorContent::MalformedSyntaxTree("grammar item"));

        assert!(lower_grammar(&Value::from("grammar")).is_err());
    }
}
