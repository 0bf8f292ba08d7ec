use crate::compiler::singles::{escape_literal, escape_regex};
use crate::compiler::{Alternative, Grammar, GroupItem, PatternValue, Rep, Rule, RuleKind, SimplePattern};

/// Generate a grammar's source code from its data model
///
/// Useful to get back to the source code after parsing, or to print grammars built by hand.
/// The output parses back to the same grammar.
///
/// Note that blank lines and comments, as well as additional whitespaces, won't be restored.
pub fn gen_grammar(grammar: &Grammar) -> String {
    let mut out = String::new();

    for pasta in &grammar.pastas {
        out.push_str(&format!("%{{{}}}%\n", pasta.code));
    }

    if !grammar.pastas.is_empty() && !grammar.rules.is_empty() {
        out.push('\n');
    }

    for rule in &grammar.rules {
        out.push_str(&gen_rule(rule));
        out.push('\n');
    }

    out
}

/// Generate the source code of a single [`Rule`]
pub fn gen_rule(rule: &Rule) -> String {
    let head = match &rule.kind {
        RuleKind::Simple { name } => name.clone(),
        RuleKind::Template { name, param } => {
            format!("{}`{}`", name.as_deref().unwrap_or_default(), param)
        }
    };

    let head = match &rule.ty {
        Some(ty) => format!("{}: {}", head, ty),
        None => head,
    };

    let alternatives = rule
        .alternatives
        .iter()
        .map(gen_alternative)
        .collect::<Vec<_>>()
        .join("\n    | ");

    // Mappers span up to the end of their line
    let ending = match rule.alternatives.last() {
        Some(Alternative {
            mapper: Some(_), ..
        }) => "\n    ;",
        _ => " ;",
    };

    format!("{} = {}{}", head, alternatives, ending)
}

/// Generate the source code of a single [`Alternative`]
pub fn gen_alternative(alt: &Alternative) -> String {
    let items = alt.items.iter().map(gen_rep).collect::<Vec<_>>().join(" ");

    match &alt.mapper {
        Some(mapper) => format!("{} %% {}", items, mapper.code.replace('\n', "\n        ")),
        None => items,
    }
}

/// Generate the source code of a single [`Rep`]
pub fn gen_rep(rep: &Rep) -> String {
    let pattern = gen_pattern(&rep.pattern);

    match rep.repetition {
        Some(repetition) => format!("{}{}", pattern, repetition.symbol()),
        None => pattern,
    }
}

/// Generate the source code of a single [`SimplePattern`]
pub fn gen_pattern(pattern: &SimplePattern) -> String {
    match &pattern.value {
        PatternValue::Literal(string) => escape_literal(string),
        PatternValue::Regex { source, flags } => escape_regex(source, flags),
        PatternValue::Any => ".".to_owned(),
        PatternValue::Id(name) => name.clone(),
        PatternValue::Variable(index) => format!("${}", index),
        PatternValue::Template { func, body } => {
            format!("{}`{}`", func.as_deref().unwrap_or_default(), body)
        }
        PatternValue::Apply { func, pattern } => format!("{}({})", func, gen_pattern(pattern)),
        PatternValue::Group(items) => format!(
            "({})",
            items
                .iter()
                .map(|GroupItem { important, rep }| {
                    if *important {
                        format!("!{}", gen_rep(rep))
                    } else {
                        gen_rep(rep)
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parse_grammar;
    use pretty_assertions::assert_eq;

    fn reformat(source: &str) -> String {
        gen_grammar(&parse_grammar(source).unwrap())
    }

    #[test]
    fn normalizes_layout() {
        assert_eq!(
            reformat("a   =   'x'  |  b*   ;  -- comment\nb='y'? (!'z' .)+ ;"),
            "a = 'x'\n    | b* ;\nb = 'y'? (!'z' .)+ ;\n"
        );
    }

    #[test]
    fn rules_ending_with_a_mapper() {
        assert_eq!(
            reformat("pair: (String, String) = /[a-z]+/ '=' $0 %% ($0,\n    $2)\n;"),
            "pair: (String, String) = /[a-z]+/ '=' $0 %% ($0,\n        $2)\n    ;\n"
        );
    }

    #[test]
    fn templates_and_pastas() {
        assert_eq!(
            reformat("%{use std::fmt;}%\n`t` = t ;\nkw`k` = k not(/[a-z]/) ;\na = kw`if` `(` try(b) ;\nb = 'it\\'s' ;"),
            "%{use std::fmt;}%\n\n`t` = t ;\nkw`k` = k not(/[a-z]/) ;\na = kw`if` `(` try(b) ;\nb = 'it\\'s' ;\n"
        );
    }

    #[test]
    fn output_parses_back_to_the_same_grammar() {
        let source = "list = '[' (!item ','?)* ']' %% $1\n;\nitem = /[^\\/,\\]]+/i ;";
        let grammar = parse_grammar(source).unwrap();
        let regenerated = parse_grammar(&gen_grammar(&grammar)).unwrap();

        assert_eq!(gen_grammar(&regenerated), gen_grammar(&grammar));
        assert_eq!(
            regenerated.rules[1].alternatives[0].items[0].pattern.value,
            grammar.rules[1].alternatives[0].items[0].pattern.value
        );
    }
}
