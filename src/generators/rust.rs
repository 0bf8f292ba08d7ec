//! Rust backend
//!
//! Every rule becomes a function `fn(input: &str, start: usize) -> Outcome<T>` of the generated `rules` module,
//! built on the [runtime combinators](crate::runtime::combinators) so that generated parsers behave exactly like
//! the interpreter. Template rules take their parameter as an additional first argument.
//!
//! Alternatives live in a private module of their own, next to the grammar's pasta blocks, and always refer to
//! rules through the `rules` module: neither the generated locals nor pasta items can hide a rule.
//!
//! Rules declare their result type with `name: Type = ...`, and [`Value`](crate::runtime::Value) is used
//! when they don't. Mappers are Rust expressions, in which `$N` refers to the N-th capture, `$startN` and `$endN`
//! to the offsets it was matched between, and `text()` to the text matched by the whole alternative.
//! `start` and `end` are in scope as well.

use crate::compiler::utils::{FN_BACKTRACK, FN_LOOK, FN_NOT, FN_TRY};
use crate::compiler::{
    compile_grammar, Alternative, CompileError, CompileErrorContent, CompileOptions, Grammar,
    PatternValue, Rep, Repetition, Rule, RuleKind, SimplePattern, Span,
};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use std::collections::HashMap;
use tracing::debug;

/// Generate a Rust module's content from a grammar, with the [default options](CompileOptions::for_codegen)
///
/// The grammar's pasta blocks are copied verbatim at the top of the output.
pub fn gen_rust_str(grammar: &Grammar) -> Result<String, CompileError> {
    gen_rust_str_with(grammar, &CompileOptions::for_codegen())
}

/// Generate a Rust module's content from a grammar
pub fn gen_rust_str_with(grammar: &Grammar, options: &CompileOptions) -> Result<String, CompileError> {
    let tokens = gen_rust_token_stream_with(grammar, options)?;

    let mut out = String::new();

    for pasta in &grammar.pastas {
        out.push_str(pasta.code.trim());
        out.push_str("\n\n");
    }

    out.push_str(&tokens.to_string());
    out.push('\n');

    Ok(out)
}

/// Generate the Rust code of a grammar's rules, without its pasta blocks
pub fn gen_rust_token_stream(grammar: &Grammar) -> Result<TokenStream, CompileError> {
    gen_rust_token_stream_with(grammar, &CompileOptions::for_codegen())
}

/// Generate the Rust code of a grammar's rules, without its pasta blocks
///
/// The grammar is [compiled](compile_grammar) first, so that generated code only refers to existing rules.
/// Mappers are never interpreted here, whatever `options` say.
pub fn gen_rust_token_stream_with(grammar: &Grammar, options: &CompileOptions) -> Result<TokenStream, CompileError> {
    let options = CompileOptions {
        interpret_mappers: false,
        host_transformers: true,
        transformers: HashMap::new(),
        ..*options
    };

    compile_grammar(grammar, &options)?;

    for pasta in &grammar.pastas {
        syn::parse_file(&pasta.code).map_err(|err| host_code_error(pasta.span, err))?;
    }

    let mut state = InternalState {
        grammar,
        template_whitespace: options.template_whitespace,
        regexes: vec![],
        rule_types: HashMap::new(),
    };

    for rule in &grammar.rules {
        let ty = match &rule.ty {
            Some(ty) => {
                let ty = syn::parse_str::<syn::Type>(ty).map_err(|err| host_code_error(rule.span, err))?;
                quote! { #ty }
            }
            None => quote! { rt::Value },
        };

        state.rule_types.insert(rule_ident(rule), ty);
    }

    let mut rules = vec![];
    let mut alternatives = vec![];

    for rule in &grammar.rules {
        let (rule_fn, alt_fns) = gen_rust_rule(&mut state, rule)?;
        rules.push(rule_fn);
        alternatives.extend(alt_fns);
    }

    let entry = grammar
        .rules
        .iter()
        .find(|rule| !rule.is_template())
        .map(|rule| {
            let ident = rule_ident(rule);
            let ty = &state.rule_types[&ident];

            quote! {
                /// Match the entry rule at the beginning of the input
                pub fn parse(input: &str) -> rt::Outcome<#ty> {
                    rules::#ident(input, 0)
                }
            }
        });

    let regexes = &state.regexes;

    debug!(
        rules = grammar.rules.len(),
        regexes = regexes.len(),
        "generated Rust code"
    );

    Ok(quote! {
        #[allow(unused_imports)]
        use ::pegc::runtime as rt;

        #entry

        #[allow(clippy::all)]
        #[allow(non_snake_case)]
        #[allow(unused)]
        pub mod rules {
            use super::*;

            #(#rules)*
        }

        #[allow(clippy::all)]
        #[allow(non_snake_case)]
        #[allow(unused)]
        mod alternatives {
            use super::*;

            ::pegc::lazy_static::lazy_static! {
                #(#regexes)*
            }

            #(#alternatives)*
        }
    })
}

struct InternalState<'g> {
    grammar: &'g Grammar,
    template_whitespace: bool,

    /// Declarations of the `lazy_static` regular expressions
    regexes: Vec<TokenStream>,

    /// Result type of every rule, by function name
    rule_types: HashMap<Ident, TokenStream>,
}

/// What the patterns of a sequence can refer to
#[derive(Clone, Copy)]
struct Scope<'s> {
    /// Parameter of the enclosing template rule
    param: Option<&'s str>,

    /// Nesting level of groups
    depth: usize,
}

impl<'s> Scope<'s> {
    fn value_ident(self, index: usize) -> Ident {
        match self.depth {
            0 => format_ident!("v{}", index),
            depth => format_ident!("g{}_{}", depth, index),
        }
    }

    fn start_ident(self, index: usize) -> Ident {
        match self.depth {
            0 => format_ident!("s{}", index),
            depth => format_ident!("gs{}_{}", depth, index),
        }
    }

    fn end_ident(self, index: usize) -> Ident {
        match self.depth {
            0 => format_ident!("e{}", index),
            depth => format_ident!("ge{}_{}", depth, index),
        }
    }
}

/// Generate a rule's function, along with the functions of its alternatives
fn gen_rust_rule(state: &mut InternalState, rule: &Rule) -> Result<(TokenStream, Vec<TokenStream>), CompileError> {
    let ident = rule_ident(rule);
    let ty = state.rule_types[&ident].clone();
    let scope = Scope {
        param: rule.param(),
        depth: 0,
    };

    let alt_idents = (0..rule.alternatives.len())
        .map(|i| format_ident!("{}_alt{}", ident, i))
        .collect::<Vec<_>>();

    let alternatives = rule
        .alternatives
        .iter()
        .zip(&alt_idents)
        .map(|(alt, alt_ident)| gen_rust_alternative(state, alt, alt_ident, &ty, rule.ty.is_none(), scope))
        .collect::<Result<Vec<_>, _>>()?;

    let count = rule.alternatives.len();

    let rule_fn = if rule.is_template() {
        let skip_whitespace = state.template_whitespace.then(|| {
            quote! {
                .map(|success| rt::Success::new(success.value, rt::skip_whitespace(input, success.end)))
            }
        });

        quote! {
            pub fn #ident(param: &str, input: &str, start: usize) -> rt::Outcome<#ty> {
                let alternatives: [&dyn Fn(&str, usize) -> rt::Outcome<#ty>; #count] = [
                    #(&|input: &str, start: usize| super::alternatives::#alt_idents(param, input, start)),*
                ];

                rt::choice(alternatives, input, start)#skip_whitespace
            }
        }
    } else {
        quote! {
            pub fn #ident(input: &str, start: usize) -> rt::Outcome<#ty> {
                let alternatives: [fn(&str, usize) -> rt::Outcome<#ty>; #count] = [
                    #(super::alternatives::#alt_idents),*
                ];

                rt::choice(alternatives, input, start)
            }
        }
    };

    Ok((rule_fn, alternatives))
}

fn gen_rust_alternative(
    state: &mut InternalState,
    alt: &Alternative,
    ident: &Ident,
    ty: &TokenStream,
    untyped: bool,
    scope: Scope,
) -> Result<TokenStream, CompileError> {
    let (statements, values) = gen_rust_sequence(state, alt.items.iter(), scope)?;

    let param = scope.param.map(|_| quote! { param: &str, });

    let result = match (&alt.mapper, untyped) {
        (Some(mapper), untyped) => {
            let expr = syn::parse_str::<syn::Expr>(&substitute_mapper(&mapper.code))
                .map_err(|err| host_code_error(mapper.span, err))?;

            if untyped {
                quote! { rt::Value::from(#expr) }
            } else {
                quote! { #expr }
            }
        }

        (None, true) => quote! { rt::Value::tuple(vec![#(#values.into()),*]) },
        (None, false) => tuple(&values),
    };

    Ok(quote! {
        pub(super) fn #ident(#param input: &str, start: usize) -> rt::Outcome<#ty> {
            let end = start;
            #(#statements)*
            Ok(rt::Success::new(#result, end))
        }
    })
}

/// Generate the statements matching a sequence, along with the identifiers of its values
fn gen_rust_sequence<'r>(
    state: &mut InternalState,
    reps: impl Iterator<Item = &'r Rep>,
    scope: Scope,
) -> Result<(Vec<TokenStream>, Vec<Ident>), CompileError> {
    let mut statements = vec![];
    let mut values = vec![];

    for (i, rep) in reps.enumerate() {
        let matcher = gen_rust_rep(state, rep, scope)?;
        let value = scope.value_ident(i);
        let item_start = scope.start_ident(i);
        let item_end = scope.end_ident(i);

        statements.push(quote! {
            let #item_start = end;
            let rt::Success { value: #value, end: next } = (#matcher)(input, end)?;
            let #item_end = next;
            let end = next;
        });

        values.push(value);
    }

    Ok((statements, values))
}

fn gen_rust_rep(state: &mut InternalState, rep: &Rep, scope: Scope) -> Result<TokenStream, CompileError> {
    let matcher = gen_rust_pattern(state, &rep.pattern, scope)?;

    Ok(match rep.repetition {
        None => matcher,
        Some(Repetition::Optional) => {
            quote! { |input: &str, start: usize| rt::optional(#matcher, input, start) }
        }
        Some(Repetition::Any) => {
            quote! { |input: &str, start: usize| rt::many(#matcher, input, start) }
        }
        Some(Repetition::OneOrMore) => {
            quote! { |input: &str, start: usize| rt::many1(#matcher, input, start) }
        }
    })
}

/// Generate an expression callable as `(input, start) -> Outcome<_>`
fn gen_rust_pattern(
    state: &mut InternalState,
    pattern: &SimplePattern,
    scope: Scope,
) -> Result<TokenStream, CompileError> {
    let matcher = match &pattern.value {
        PatternValue::Literal(string) => quote! {
            |input: &str, start: usize| rt::literal(#string, input, start).map(rt::Success::into_owned)
        },

        PatternValue::Regex { source, flags } => {
            let ident = format_ident!("RX_{}", state.regexes.len());
            let description = format!("/{}/{}", source, flags);

            state.regexes.push(quote! {
                static ref #ident: ::pegc::regex::Regex = rt::anchored_regex(#source, #flags)
                    .expect(concat!("invalid regular expression ", #description));
            });

            quote! {
                |input: &str, start: usize| rt::regex(&#ident, #description, input, start).map(rt::Success::into_owned)
            }
        }

        PatternValue::Any => quote! {
            |input: &str, start: usize| rt::any(input, start).map(rt::Success::into_owned)
        },

        PatternValue::Id(name) if scope.param == Some(name.as_str()) => quote! {
            |input: &str, start: usize| rt::literal(param, input, start).map(rt::Success::into_owned)
        },

        PatternValue::Id(name) => {
            let ident = make_safe_ident(name);
            quote! { super::rules::#ident }
        }

        // Matches the text of the capture, not the input it spans (which may include skipped whitespaces)
        PatternValue::Variable(index) => {
            let value = scope.value_ident(*index);
            quote! {
                |input: &str, start: usize| {
                    let text = rt::Value::from(#value.clone()).text();
                    rt::literal(&text, input, start).map(rt::Success::into_owned)
                }
            }
        }

        PatternValue::Template { func, body } => gen_rust_template(state, func.as_deref(), body),

        PatternValue::Apply { func, pattern } => {
            let inner = gen_rust_pattern(state, pattern, scope)?;

            match func.as_str() {
                FN_NOT => quote! {
                    |input: &str, start: usize| rt::not(#inner, input, start).map(rt::Success::into_owned)
                },
                FN_LOOK => quote! { |input: &str, start: usize| rt::look(#inner, input, start) },
                FN_TRY => quote! { |input: &str, start: usize| rt::attempt(#inner, input, start) },
                FN_BACKTRACK => {
                    quote! { |input: &str, start: usize| rt::backtrack(#inner, input, start) }
                }

                _ => match (&pattern.value, state.grammar.template_rule(Some(func))) {
                    (PatternValue::Literal(arg), Some(_)) => gen_rust_template(state, Some(func), arg),

                    // Host transformer, which must be in scope of the generated module
                    _ => {
                        let func = make_safe_ident(func);
                        quote! { |input: &str, start: usize| #func(&(#inner), input, start) }
                    }
                },
            }
        }

        PatternValue::Group(items) => {
            let inner = Scope {
                param: scope.param,
                depth: scope.depth + 1,
            };

            let (statements, values) = gen_rust_sequence(state, items.iter().map(|item| &item.rep), inner)?;

            let important = items
                .iter()
                .zip(&values)
                .filter(|(item, _)| item.important)
                .map(|(_, value)| value.clone())
                .collect::<Vec<_>>();

            let result = if important.is_empty() {
                tuple(&values)
            } else {
                tuple(&important)
            };

            quote! {
                |input: &str, start: usize| -> rt::Outcome<_> {
                    let end = start;
                    #(#statements)*
                    Ok(rt::Success::new(#result, end))
                }
            }
        }
    };

    Ok(quote! { (#matcher) })
}

fn gen_rust_template(state: &InternalState, func: Option<&str>, arg: &str) -> TokenStream {
    let ident = match state.grammar.template_rule(func) {
        Some(rule) => rule_ident(rule),
        None => format_ident!("default_template"),
    };

    quote! { |input: &str, start: usize| super::rules::#ident(#arg, input, start) }
}

/// Rust tuple (or single value) made of some identifiers
fn tuple(values: &[Ident]) -> TokenStream {
    match values {
        [value] => quote! { #value },
        values => quote! { (#(#values),*) },
    }
}

/// Name of the function generated for a rule
fn rule_ident(rule: &Rule) -> Ident {
    match &rule.kind {
        RuleKind::Simple { name }
        | RuleKind::Template {
            name: Some(name), ..
        } => make_safe_ident(name),
        RuleKind::Template { name: None, .. } => format_ident!("default_template"),
    }
}

/// Translate a mapper to a Rust expression
///
/// `$N` becomes the N-th capture's variable, `$startN` and `$endN` its offsets, and `text()` the text matched by
/// the alternative. String and character literals are left untouched.
pub fn substitute_mapper(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut rest = code;

    while let Some(c) = rest.chars().next() {
        let verbatim = match c {
            '"' => quoted_len(rest, '"'),
            '\'' => char_literal_len(rest),

            '$' => match capture_variable(&rest[1..]) {
                Some((ident, len)) => {
                    out.push_str(&ident);
                    rest = &rest[1 + len..];
                    continue;
                }
                None => 1,
            },

            c if c.is_alphabetic() || c == '_' => {
                let len = rest.len() - rest.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_').len();
                let (word, after) = rest.split_at(len);

                match word {
                    "text" if after.starts_with("()") => {
                        out.push_str("rt::matched_text(input, start, end)");
                        rest = &after[2..];
                        continue;
                    }
                    "r" | "br" => len + raw_string_len(after).unwrap_or(0),
                    _ => len,
                }
            }

            c => c.len_utf8(),
        };

        out.push_str(&rest[..verbatim]);
        rest = &rest[verbatim..];
    }

    out
}

/// Translate a capture variable, given the code following its `$`
fn capture_variable(code: &str) -> Option<(String, usize)> {
    let (prefix, index) = match (code.strip_prefix("start"), code.strip_prefix("end")) {
        (Some(index), _) => ("s", index),
        (_, Some(index)) => ("e", index),
        _ => ("v", code),
    };

    let digits = index.len() - index.trim_start_matches(|c: char| c.is_ascii_digit()).len();

    if digits == 0 {
        return None;
    }

    Some((
        format!("{}{}", prefix, &index[..digits]),
        code.len() - index.len() + digits,
    ))
}

/// Length of the quoted literal `code` starts with, escapes included
fn quoted_len(code: &str, quote: char) -> usize {
    let mut chars = code.char_indices().skip(1);

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            c if c == quote => return i + c.len_utf8(),
            _ => {}
        }
    }

    code.len()
}

/// Length of the character literal `code` starts with (1 for a lifetime's quote)
fn char_literal_len(code: &str) -> usize {
    let body = &code[1..];

    if body.starts_with('\\') {
        return quoted_len(code, '\'');
    }

    match body.chars().next() {
        Some(c) if body[c.len_utf8()..].starts_with('\'') => 2 + c.len_utf8(),
        _ => 1,
    }
}

/// Length of a raw string literal, given the code following its `r` prefix
fn raw_string_len(code: &str) -> Option<usize> {
    let hashes = code.len() - code.trim_start_matches('#').len();
    let body = code[hashes..].strip_prefix('"')?;
    let closing = format!("\"{}", "#".repeat(hashes));

    Some(match body.find(&closing) {
        Some(i) => hashes + 1 + i + closing.len(),
        None => code.len(),
    })
}

fn host_code_error(span: Span, err: syn::Error) -> CompileError {
    CompileError::new(
        span,
        CompileErrorContent::InvalidHostCode(err.to_string()),
        Some("mappers, rule types and pasta blocks must be valid Rust code"),
    )
}

/// Make an identifier out of a rule name, escaping Rust keywords
pub fn make_safe_ident(ident: &str) -> Ident {
    match ident {
        // Cannot be raw identifiers
        "self" | "Self" | "super" | "crate" => format_ident!("{}_", ident),
        _ if RUST_RESERVED_KEYWORDS.contains(&ident) => Ident::new_raw(ident, proc_macro2::Span::call_site()),
        _ => format_ident!("{}", ident),
    }
}

/// Reserved Rust keywords
pub static RUST_RESERVED_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where",
    "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "union",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parse_grammar;

    fn gen(source: &str) -> Result<String, CompileError> {
        gen_rust_str(&parse_grammar(source)?)
    }

    #[test]
    fn mapper_substitution() {
        assert_eq!(substitute_mapper("($0, $12)"), "(v0, v12)");
        assert_eq!(substitute_mapper("$start0..$end2"), "s0..e2");
        assert_eq!(
            substitute_mapper("text().len() + context().len()"),
            "rt::matched_text(input, start, end).len() + context().len()"
        );
        assert_eq!(substitute_mapper("$ + é + $start"), "$ + é + $start");
    }

    #[test]
    fn mapper_literals_are_kept() {
        assert_eq!(
            substitute_mapper(r#"format!("$0 \"$1\" {}", $2)"#),
            r#"format!("$0 \"$1\" {}", v2)"#
        );
        assert_eq!(substitute_mapper("('$', '\\'', $0)"), "('$', '\\'', v0)");
        assert_eq!(substitute_mapper("r#\"$0\"# + $1"), "r#\"$0\"# + v1");
        assert_eq!(substitute_mapper("x::<'static>($0)"), "x::<'static>(v0)");
    }

    #[test]
    fn safe_idents() {
        assert_eq!(make_safe_ident("rule").to_string(), "rule");
        assert_eq!(make_safe_ident("if").to_string(), "r#if");
        assert_eq!(make_safe_ident("self").to_string(), "self_");
    }

    #[test]
    fn generates_valid_rust() {
        let code = gen(
            "%{ use std::collections::HashMap; }%\n\
             pairs: HashMap<String, String> = pair* %% $0.into_iter().collect()\n\
             ;\n\
             pair: (String, String) = key '=' /[a-z]*/i ';'? %% ($0, $2)\n\
             ;\n\
             key: String = (!/[a-z]+/ not('='))+ %% text().to_owned()\n\
             ;\n\
             `t` = t ;\n\
             kw`k` = k look(.) ;\n\
             if = kw`if` `{` try(backtrack('x')) $0 ;",
        )
        .unwrap();

        assert!(code.starts_with("use std::collections::HashMap;\n\n"));
        assert!(syn::parse_file(&code).is_ok());

        for expected in [
            "pub fn parse",
            "pub fn pairs",
            "fn pair_alt0",
            "fn default_template",
            "pub fn r#if",
            "static ref RX_0",
            "super :: rules :: key",
        ] {
            assert!(code.contains(expected), "missing '{}' in:\n{}", expected, code);
        }
    }

    #[test]
    fn honours_compile_options() {
        let grammar = parse_grammar("`k` = k ;\na = `x` ;").unwrap();
        assert!(gen_rust_str(&grammar).unwrap().contains("skip_whitespace"));

        let options = CompileOptions {
            template_whitespace: false,
            ..CompileOptions::for_codegen()
        };
        assert!(!gen_rust_str_with(&grammar, &options).unwrap().contains("skip_whitespace"));

        let recursive = parse_grammar("a = a 'x' | 'x' ;").unwrap();
        assert!(matches!(
            gen_rust_str(&recursive).unwrap_err().content(),
            CompileErrorContent::LeftRecursion { .. }
        ));

        let options = CompileOptions {
            reject_left_recursion: false,
            ..CompileOptions::for_codegen()
        };
        assert!(gen_rust_str_with(&recursive, &options).is_ok());
    }

    #[test]
    fn rejects_invalid_host_code() {
        let err = gen("a: Vec< = 'x' ;").unwrap_err();
        assert!(matches!(err.content(), CompileErrorContent::InvalidHostCode(_)));

        let err = gen("a = 'x' %% ($0,\n;").unwrap_err();
        assert!(matches!(err.content(), CompileErrorContent::InvalidHostCode(_)));

        let err = gen("%{ fn }%\na = 'x' ;").unwrap_err();
        assert!(matches!(err.content(), CompileErrorContent::InvalidHostCode(_)));
    }

    #[test]
    fn checks_names_first() {
        let err = gen("a = b ;").unwrap_err();
        assert_eq!(err.content(), &CompileErrorContent::UnknownRule("b".into()));
    }
}
