use super::builtin;
use super::combinators::{
    attempt, backtrack, choice, look, many, many1, not, optional, project, sequence,
};
use super::data::{Outcome, Span, Success, Value};
use super::errors::{Failure, RuntimeError};
use crate::compiler::{CompiledAlternative, MapperExpr, Matcher, Program, Repetition, RuleId};
use tracing::trace;

/// Description of the failure reported for leftover input in full-match mode
pub const EXPECTED_EOF: &str = "<eof>";

/// Match a subject string against a [compiled grammar](crate::compiler::compile_grammar)
///
/// The entry rule is matched at offset 0. Unless [`RuntimeOptions::full_match`] is set, it does not
/// need to consume the whole subject.
pub fn execute(ctx: &RuntimeContext) -> Result<Success<Value>, RuntimeError> {
    let entry = match ctx.entry {
        Some(name) => ctx
            .program
            .rule_id(name)
            .ok_or_else(|| RuntimeError::UnknownEntryRule(name.to_owned()))?,
        None => ctx.program.entry().ok_or(RuntimeError::MissingEntryRule)?,
    };

    let success = execute_rule(ctx.program, entry, ctx.subject, 0)?;

    if ctx.options.full_match && success.end < ctx.subject.len() {
        return Err(Failure::new(EXPECTED_EOF, success.end).into());
    }

    Ok(success)
}

/// Apply a single rule at some offset
///
/// Template rules are applied with an empty parameter.
pub fn execute_rule(program: &Program, rule: RuleId, input: &str, start: usize) -> Outcome<Value> {
    Executor { program }.rule(rule, None, input, start)
}

/// Runtime execution context
pub struct RuntimeContext<'a> {
    /// Compiled grammar
    pub program: &'a Program,

    /// Initial subject
    pub subject: &'a str,

    /// Name of the simple rule to start from (defaults to the grammar's first simple rule)
    pub entry: Option<&'a str>,

    /// Options
    pub options: RuntimeOptions,
}

/// Runtime options
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Require the entry rule to consume the whole subject.
    /// Leftover input is then reported as a failure expecting `<eof>`.
    pub full_match: bool,
}

impl RuntimeOptions {
    /// Create a new set of runtime options
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable full-match mode
    pub fn with_full_match(mut self, full_match: bool) -> Self {
        self.full_match = full_match;
        self
    }
}

struct Executor<'p> {
    program: &'p Program,
}

/// What the matchers of a sequence can refer to
#[derive(Clone, Copy)]
struct Scope<'s> {
    /// Literal given to the enclosing template rule
    param: Option<&'s str>,

    /// Values produced by the previous items of the enclosing sequence
    captures: &'s [Capture],
}

/// Value produced by an item of a sequence, along with the text it matched
struct Capture {
    value: Value,
    span: Span,
}

impl<'p> Executor<'p> {
    fn rule(&self, id: RuleId, param: Option<&str>, input: &str, start: usize) -> Outcome<Value> {
        let rule = &self.program.rules()[id];
        trace!(rule = %rule.name, start, "entering rule");

        let outcome = choice(
            rule.alternatives
                .iter()
                .map(|alt| move |input, start| self.alternative(alt, param, input, start)),
            input,
            start,
        );

        let outcome = match outcome {
            Ok(success) if rule.skip_whitespace => Ok(Success::new(
                success.value,
                builtin::skip_whitespace(input, success.end),
            )),
            outcome => outcome,
        };

        match &outcome {
            Ok(success) => trace!(rule = %rule.name, end = success.end, "matched rule"),
            Err(failure) => trace!(
                rule = %rule.name,
                position = failure.position,
                expected = %failure.expected,
                "rule failed"
            ),
        }

        outcome
    }

    fn alternative(
        &self,
        alt: &CompiledAlternative,
        param: Option<&str>,
        input: &str,
        start: usize,
    ) -> Outcome<Value> {
        let Success {
            value: captures,
            end,
        } = self.sequence(&alt.items, param, input, start)?;

        let value = match &alt.mapper {
            Some(mapper) => evaluate_mapper(mapper, &captures, input, Span::new(start, end)),
            None => Value::tuple(captures.into_iter().map(|capture| capture.value).collect()),
        };

        Ok(Success::new(value, end))
    }

    /// Match the items of a sequence, each one seeing the captures of the previous ones
    fn sequence(&self, items: &[Matcher], param: Option<&str>, input: &str, start: usize) -> Outcome<Vec<Capture>> {
        sequence(
            items.iter().map(|item| {
                move |captures: &[Capture], input: &str, start: usize| -> Outcome<Capture> {
                    let Success { value, end } = self.matcher(item, Scope { param, captures }, input, start)?;

                    Ok(Success::new(
                        Capture {
                            value,
                            span: Span::new(start, end),
                        },
                        end,
                    ))
                }
            }),
            input,
            start,
        )
    }

    fn matcher(&self, matcher: &Matcher, scope: Scope<'_>, input: &str, start: usize) -> Outcome<Value> {
        match matcher {
            Matcher::Literal(string) => builtin::literal(string, input, start).map(text_value),

            Matcher::Regex { rx, description } => {
                builtin::regex(rx, description, input, start).map(text_value)
            }

            Matcher::Any => builtin::any(input, start).map(text_value),

            Matcher::Rule(id) => self.rule(*id, None, input, start),

            Matcher::Param => {
                builtin::literal(scope.param.unwrap_or_default(), input, start).map(text_value)
            }

            Matcher::Variable(index) => {
                let text = scope
                    .captures
                    .get(*index)
                    .map(|capture| capture.value.text())
                    .unwrap_or_default();

                builtin::literal(&text, input, start).map(text_value)
            }

            Matcher::Template { rule, arg } => self.rule(*rule, Some(arg), input, start),

            Matcher::Not(inner) => not(
                |input, start| self.matcher(inner, scope, input, start),
                input,
                start,
            )
            .map(text_value),

            Matcher::Look(inner) => look(
                |input, start| self.matcher(inner, scope, input, start),
                input,
                start,
            ),

            Matcher::Try(inner) => attempt(
                |input, start| self.matcher(inner, scope, input, start),
                input,
                start,
            ),

            Matcher::Backtrack(inner) => backtrack(
                |input, start| self.matcher(inner, scope, input, start),
                input,
                start,
            ),

            Matcher::External {
                name,
                transformer,
                inner,
            } => match transformer {
                Some(transformer) => transformer.apply(
                    &|input: &str, start: usize| self.matcher(inner, scope, input, start),
                    input,
                    start,
                ),

                // Only generated code provides this transformer
                None => Err(Failure::new(format!("<{}>", name), start)),
            },

            Matcher::Group { items, important } => {
                let Success {
                    value: captures,
                    end,
                } = self.sequence(items, scope.param, input, start)?;

                let values = captures.into_iter().map(|capture| capture.value).collect();

                Ok(Success::new(Value::tuple(project(values, important)), end))
            }

            Matcher::Repeat(inner, repetition) => {
                let once = |input, start| self.matcher(inner, scope, input, start);

                match repetition {
                    Repetition::Optional => {
                        optional(once, input, start).map(|success| success.map(Value::from))
                    }
                    Repetition::Any => {
                        many(once, input, start).map(|success| success.map(Value::List))
                    }
                    Repetition::OneOrMore => {
                        many1(once, input, start).map(|success| success.map(Value::List))
                    }
                }
            }
        }
    }
}

fn text_value(success: Success<&str>) -> Success<Value> {
    success.map(Value::from)
}

/// Compute the result of an alternative
///
/// `span` covers the text matched by the alternative.
fn evaluate_mapper(expr: &MapperExpr, captures: &[Capture], input: &str, span: Span) -> Value {
    let evaluate_all = |exprs: &[MapperExpr]| {
        exprs
            .iter()
            .map(|expr| evaluate_mapper(expr, captures, input, span))
            .collect::<Vec<_>>()
    };

    match expr {
        MapperExpr::Capture(index) => captures
            .get(*index)
            .map(|capture| capture.value.clone())
            .unwrap_or(Value::Absent),
        MapperExpr::StartOf(index) => captures
            .get(*index)
            .map(|capture| Value::Int(capture.span.start))
            .unwrap_or(Value::Absent),
        MapperExpr::EndOf(index) => captures
            .get(*index)
            .map(|capture| Value::Int(capture.span.end))
            .unwrap_or(Value::Absent),
        MapperExpr::Text => Value::from(input.get(span.start..span.end).unwrap_or_default()),
        MapperExpr::Start => Value::Int(span.start),
        MapperExpr::End => Value::Int(span.end),
        MapperExpr::Str(string) => Value::from(string.as_str()),
        MapperExpr::List(items) => Value::List(evaluate_all(items)),
        MapperExpr::Node { kind, args } => Value::Node {
            kind: kind.clone(),
            span,
            children: evaluate_all(args),
        },
        MapperExpr::Concat(terms) => evaluate_all(terms)
            .into_iter()
            .reduce(Value::concat)
            .unwrap_or(Value::Absent),
    }
}
