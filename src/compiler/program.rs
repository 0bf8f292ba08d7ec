use super::data::{Alternative, Grammar, Mapper, PatternValue, Rep, Repetition, Rule, RuleKind, SimplePattern, Span};
use super::errors::{CompileError, CompileErrorContent};
use super::mapper::{parse_mapper, MapperExpr};
use super::recursion;
use super::utils::{FN_BACKTRACK, FN_LOOK, FN_NOT, FN_TRY};
use super::validator::validate_grammar;
use crate::runtime::{anchored_regex, regex_description, Outcome, Value};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Index of a rule, both in [`Grammar::rules`] and in [`Program::rules`]
pub type RuleId = usize;

/// Host function applied to a pattern (`func(pattern)` in a grammar)
///
/// It receives the compiled pattern as a matcher, along with the input and the offset to match at,
/// and is free to call the matcher as many times as needed, at any offset.
///
/// ## Example usage
///
/// ```rust
/// use pegc::compiler::Transformer;
/// use pegc::runtime::Value;
///
/// // Match the inner pattern, then return its text in uppercase
/// let upper = Transformer::new(|inner, input, start| {
///     inner(input, start).map(|success| success.map(|value| Value::from(value.text().to_uppercase())))
/// });
/// ```
#[derive(Clone)]
pub struct Transformer(
    Arc<dyn Fn(&dyn Fn(&str, usize) -> Outcome<Value>, &str, usize) -> Outcome<Value> + Send + Sync>,
);

impl Transformer {
    /// Wrap a host function
    pub fn new(
        func: impl Fn(&dyn Fn(&str, usize) -> Outcome<Value>, &str, usize) -> Outcome<Value>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self(Arc::new(func))
    }

    /// Apply the transformer to a matcher
    pub fn apply(
        &self,
        inner: &dyn Fn(&str, usize) -> Outcome<Value>,
        input: &str,
        start: usize,
    ) -> Outcome<Value> {
        (self.0)(inner, input, start)
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Transformer")
    }
}

/// Compilation options
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Make template rules skip the whitespaces following their match
    pub template_whitespace: bool,

    /// Reject rules able to call themselves without consuming any input
    pub reject_left_recursion: bool,

    /// Parse mappers as interpreter expressions (see [`super::mapper`]).
    /// When disabled, mappers are left to another backend and ignored by the interpreter.
    pub interpret_mappers: bool,

    /// Accept applications of unregistered transformers, leaving them to generated code
    pub host_transformers: bool,

    /// Transformers available to grammars, by name
    pub transformers: HashMap<String, Transformer>,
}

impl CompileOptions {
    /// Create a new set of compilation options
    pub fn new() -> Self {
        Self::default()
    }

    /// Options used to check grammars before generating code from them
    pub fn for_codegen() -> Self {
        Self {
            interpret_mappers: false,
            host_transformers: true,
            ..Self::default()
        }
    }

    /// Register a transformer
    pub fn with_transformer(mut self, name: impl Into<String>, transformer: Transformer) -> Self {
        self.transformers.insert(name.into(), transformer);
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            template_whitespace: true,
            reject_left_recursion: true,
            interpret_mappers: true,
            host_transformers: false,
            transformers: HashMap::new(),
        }
    }
}

/// Compiled grammar, ready to be executed
///
/// Immutable once built, and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Program {
    rules: Vec<CompiledRule>,
    simple_rules: HashMap<String, RuleId>,
    entry: Option<RuleId>,
}

impl Program {
    /// Get all rules, indexed by [`RuleId`]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Find a simple rule by its name
    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.simple_rules.get(name).copied()
    }

    /// Get the default entry rule (the first simple rule of the grammar)
    pub fn entry(&self) -> Option<RuleId> {
        self.entry
    }
}

/// Compiled rule
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Display name
    pub name: String,

    /// Skip whitespaces after a successful match (template rules)
    pub skip_whitespace: bool,

    pub alternatives: Vec<CompiledAlternative>,
    pub span: Span,
}

/// Compiled alternative
#[derive(Debug, Clone)]
pub struct CompiledAlternative {
    pub items: Vec<Matcher>,
    pub mapper: Option<MapperExpr>,
}

/// Resolved pattern
#[derive(Debug, Clone)]
pub enum Matcher {
    Literal(String),
    Regex { rx: Regex, description: String },
    Any,
    Rule(RuleId),

    /// Literal given to the enclosing template rule
    Param,

    /// Text of a previous capture of the enclosing sequence
    Variable(usize),

    Template { rule: RuleId, arg: String },
    Not(Box<Matcher>),
    Look(Box<Matcher>),
    Try(Box<Matcher>),
    Backtrack(Box<Matcher>),

    /// Host transformer (`None` when left to generated code)
    External {
        name: String,
        transformer: Option<Transformer>,
        inner: Box<Matcher>,
    },

    Group { items: Vec<Matcher>, important: Vec<usize> },
    Repeat(Box<Matcher>, Repetition),
}

/// Compile a grammar
///
/// Every name is resolved once and for all, mappers are parsed, and regular expressions are built.
pub fn compile_grammar(grammar: &Grammar, options: &CompileOptions) -> Result<Program, CompileError> {
    validate_grammar(grammar)?;

    let mut resolver = Resolver {
        options,
        simple_rules: HashMap::new(),
        template_rules: HashMap::new(),
        default_template: None,
    };

    for (id, rule) in grammar.rules.iter().enumerate() {
        match &rule.kind {
            RuleKind::Simple { name } => {
                resolver.simple_rules.insert(name.as_str(), id);
            }
            RuleKind::Template {
                name: Some(name), ..
            } => {
                resolver.template_rules.insert(name.as_str(), id);
            }
            RuleKind::Template { name: None, .. } => resolver.default_template = Some(id),
        }
    }

    let rules = grammar
        .rules
        .iter()
        .map(|rule| resolver.compile_rule(rule))
        .collect::<Result<Vec<_>, _>>()?;

    let program = Program {
        rules,
        simple_rules: resolver
            .simple_rules
            .into_iter()
            .map(|(name, id)| (name.to_owned(), id))
            .collect(),
        entry: grammar.rules.iter().position(|rule| !rule.is_template()),
    };

    let nullable = recursion::nullable_rules(&program);
    recursion::warn_nullable_repetitions(&program, &nullable);

    if options.reject_left_recursion {
        recursion::check_left_recursion(&program, &nullable)?;
    }

    debug!(
        rules = program.rules.len(),
        pastas = grammar.pastas.len(),
        "compiled grammar"
    );

    Ok(program)
}

struct Resolver<'g> {
    options: &'g CompileOptions,
    simple_rules: HashMap<&'g str, RuleId>,
    template_rules: HashMap<&'g str, RuleId>,
    default_template: Option<RuleId>,
}

impl<'g> Resolver<'g> {
    fn compile_rule(&self, rule: &Rule) -> Result<CompiledRule, CompileError> {
        let param = rule.param();

        let alternatives = rule
            .alternatives
            .iter()
            .map(|alt| self.compile_alternative(alt, param))
            .collect::<Result<Vec<_>, _>>()?;

        let name = rule.display_name();
        debug!(rule = %name, alternatives = alternatives.len(), "compiled rule");

        Ok(CompiledRule {
            name,
            skip_whitespace: rule.is_template() && self.options.template_whitespace,
            alternatives,
            span: rule.span,
        })
    }

    fn compile_alternative(
        &self,
        alt: &Alternative,
        param: Option<&str>,
    ) -> Result<CompiledAlternative, CompileError> {
        let items = self.compile_sequence(alt.items.iter(), param, &mut vec![])?;

        let mapper = match &alt.mapper {
            Some(mapper) if self.options.interpret_mappers => {
                Some(self.compile_mapper(mapper, items.len())?)
            }
            _ => None,
        };

        Ok(CompiledAlternative { items, mapper })
    }

    fn compile_mapper(&self, mapper: &Mapper, captures: usize) -> Result<MapperExpr, CompileError> {
        let expr = parse_mapper(&mapper.code).map_err(|err| {
            CompileError::new(
                mapper.span,
                CompileErrorContent::InvalidMapper(err.to_string()),
                Some("interpreted mappers are made of $N, text(), start, end, strings, [lists], calls and '+'"),
            )
        })?;

        match expr.max_capture() {
            Some(index) if index >= captures => Err(CompileError::new(
                mapper.span,
                CompileErrorContent::UnboundVariable(index),
                None,
            )),
            _ => Ok(expr),
        }
    }

    /// Compile a sequence, where each item can refer to the captures of the ones before it
    ///
    /// `scopes` holds the number of bound captures of every enclosing sequence.
    fn compile_sequence<'r>(
        &self,
        reps: impl Iterator<Item = &'r Rep>,
        param: Option<&str>,
        scopes: &mut Vec<usize>,
    ) -> Result<Vec<Matcher>, CompileError> {
        scopes.push(0);

        let items = reps
            .enumerate()
            .map(|(i, rep)| {
                if let Some(bound) = scopes.last_mut() {
                    *bound = i;
                }

                self.compile_rep(rep, param, scopes)
            })
            .collect::<Result<Vec<_>, _>>();

        scopes.pop();
        items
    }

    fn compile_rep(
        &self,
        rep: &Rep,
        param: Option<&str>,
        scopes: &mut Vec<usize>,
    ) -> Result<Matcher, CompileError> {
        let matcher = self.compile_pattern(&rep.pattern, param, scopes)?;

        Ok(match rep.repetition {
            Some(repetition) => Matcher::Repeat(Box::new(matcher), repetition),
            None => matcher,
        })
    }

    fn compile_pattern(
        &self,
        pattern: &SimplePattern,
        param: Option<&str>,
        scopes: &mut Vec<usize>,
    ) -> Result<Matcher, CompileError> {
        let span = pattern.span;

        match &pattern.value {
            PatternValue::Literal(string) => Ok(Matcher::Literal(string.clone())),

            PatternValue::Regex { source, flags } => {
                let rx = anchored_regex(source, flags).map_err(|err| {
                    CompileError::new(span, CompileErrorContent::InvalidRegex(err.to_string()), None)
                })?;

                Ok(Matcher::Regex {
                    rx,
                    description: regex_description(source, flags),
                })
            }

            PatternValue::Any => Ok(Matcher::Any),

            PatternValue::Id(name) => self.resolve_id(name, param, span),

            PatternValue::Variable(index) => {
                resolve_variable(*index, scopes).map_err(|content| CompileError::new(span, content, None))
            }

            PatternValue::Template { func, body } => Ok(Matcher::Template {
                rule: self.resolve_template(func.as_deref(), span)?,
                arg: body.clone(),
            }),

            PatternValue::Apply { func, pattern } => {
                self.compile_apply(func, pattern, param, scopes, span)
            }

            PatternValue::Group(items) => {
                let important = items
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| item.important)
                    .map(|(i, _)| i)
                    .collect();

                let items = self.compile_sequence(items.iter().map(|item| &item.rep), param, scopes)?;

                Ok(Matcher::Group { items, important })
            }
        }
    }

    fn compile_apply(
        &self,
        func: &str,
        inner: &SimplePattern,
        param: Option<&str>,
        scopes: &mut Vec<usize>,
        span: Span,
    ) -> Result<Matcher, CompileError> {
        match func {
            FN_NOT => Ok(Matcher::Not(Box::new(self.compile_pattern(inner, param, scopes)?))),
            FN_LOOK => Ok(Matcher::Look(Box::new(self.compile_pattern(inner, param, scopes)?))),
            FN_TRY => Ok(Matcher::Try(Box::new(self.compile_pattern(inner, param, scopes)?))),
            FN_BACKTRACK => Ok(Matcher::Backtrack(Box::new(
                self.compile_pattern(inner, param, scopes)?,
            ))),

            _ => {
                // Template rules applied to a literal are instantiated with it
                if let Some(rule) = self.template_rules.get(func) {
                    return match &inner.value {
                        PatternValue::Literal(arg) => Ok(Matcher::Template {
                            rule: *rule,
                            arg: arg.clone(),
                        }),
                        _ => Err(CompileError::new(
                            span,
                            CompileErrorContent::TemplateWithoutArgument(func.to_owned()),
                            None,
                        )),
                    };
                }

                if self.simple_rules.contains_key(func) {
                    return Err(CompileError::new(
                        span,
                        CompileErrorContent::NotATransformer(func.to_owned()),
                        Some("only the built-in functions (not, look, try, backtrack) and host transformers can be applied to a pattern"),
                    ));
                }

                let transformer = match self.options.transformers.get(func) {
                    Some(transformer) => Some(transformer.clone()),
                    None if self.options.host_transformers => None,
                    None => {
                        return Err(CompileError::new(
                            span,
                            CompileErrorContent::UnknownTransformer(func.to_owned()),
                            Some("transformers must be registered in the compilation options"),
                        ))
                    }
                };

                Ok(Matcher::External {
                    name: func.to_owned(),
                    transformer,
                    inner: Box::new(self.compile_pattern(inner, param, scopes)?),
                })
            }
        }
    }

    fn resolve_id(&self, name: &str, param: Option<&str>, span: Span) -> Result<Matcher, CompileError> {
        if param == Some(name) {
            return Ok(Matcher::Param);
        }

        if let Some(id) = self.simple_rules.get(name) {
            return Ok(Matcher::Rule(*id));
        }

        Err(if self.template_rules.contains_key(name) {
            CompileError::new(
                span,
                CompileErrorContent::TemplateWithoutArgument(name.to_owned()),
                Some("instantiate it with a literal, like name`literal`"),
            )
        } else {
            CompileError::new(span, CompileErrorContent::UnknownRule(name.to_owned()), None)
        })
    }

    fn resolve_template(&self, func: Option<&str>, span: Span) -> Result<RuleId, CompileError> {
        match func {
            Some(name) => match self.template_rules.get(name) {
                Some(id) => Ok(*id),
                None if self.simple_rules.contains_key(name) => Err(CompileError::new(
                    span,
                    CompileErrorContent::NotATemplate(name.to_owned()),
                    None,
                )),
                None => Err(CompileError::new(
                    span,
                    CompileErrorContent::UnknownTemplate(name.to_owned()),
                    None,
                )),
            },

            None => self.default_template.ok_or_else(|| {
                CompileError::new(
                    span,
                    CompileErrorContent::MissingDefaultTemplate,
                    Some("declare a template rule without a name, like `param` = param ;"),
                )
            }),
        }
    }
}

/// Resolve `$index` against the innermost scope of `scopes`
fn resolve_variable(index: usize, scopes: &[usize]) -> Result<Matcher, CompileErrorContent> {
    let (bound, enclosing) = scopes
        .split_last()
        .ok_or(CompileErrorContent::UnboundVariable(index))?;

    if index >= *bound {
        Err(CompileErrorContent::UnboundVariable(index))
    } else if enclosing.iter().any(|outer| index < *outer) {
        Err(CompileErrorContent::VariableCollision(index))
    } else {
        Ok(Matcher::Variable(index))
    }
}
