pub use crate::runtime::Span;

/// Parsed grammar
///
/// Built once by [`super::parse_grammar`] (or by hand) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grammar {
    /// Verbatim passthrough blocks, in declaration order
    pub pastas: Vec<Pasta>,

    /// Rules, in declaration order
    pub rules: Vec<Rule>,
}

impl Grammar {
    /// Create a grammar from its parts
    pub fn new(pastas: Vec<Pasta>, rules: Vec<Rule>) -> Self {
        Self { pastas, rules }
    }

    /// Find a template rule by its name, or the default template rule when `name` is `None`
    pub fn template_rule(&self, name: Option<&str>) -> Option<&Rule> {
        self.rules.iter().find(|rule| match &rule.kind {
            RuleKind::Template { name: candidate, .. } => candidate.as_deref() == name,
            RuleKind::Simple { .. } => false,
        })
    }
}

/// Verbatim passthrough block (`%{ ... }%`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pasta {
    pub code: String,
    pub span: Span,
}

/// Grammar rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,

    /// Declared result type (host-language text)
    pub ty: Option<String>,

    /// Ordered alternatives (never empty)
    pub alternatives: Vec<Alternative>,

    pub span: Span,
}

impl Rule {
    /// Get the rule's name (`None` for the default template rule)
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            RuleKind::Simple { name } => Some(name),
            RuleKind::Template { name, .. } => name.as_deref(),
        }
    }

    /// Get the name of the template's parameter, if this is a template rule
    pub fn param(&self) -> Option<&str> {
        match &self.kind {
            RuleKind::Simple { .. } => None,
            RuleKind::Template { param, .. } => Some(param),
        }
    }

    /// Check if this is a template rule
    pub fn is_template(&self) -> bool {
        matches!(self.kind, RuleKind::Template { .. })
    }

    /// Human-readable name, used in logs and diagnostics
    pub fn display_name(&self) -> String {
        match &self.kind {
            RuleKind::Simple { name } => name.clone(),
            RuleKind::Template {
                name: Some(name),
                param,
            } => format!("{}`{}`", name, param),
            RuleKind::Template { name: None, param } => format!("`{}`", param),
        }
    }
}

/// Kind of a [`Rule`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// `name = ... ;`
    Simple { name: String },

    /// ``name`param` = ... ;`` (nameless for the default template rule)
    Template { name: Option<String>, param: String },
}

/// One alternative of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    /// Sequence of patterns (never empty)
    pub items: Vec<Rep>,

    /// Expression computing the alternative's result
    pub mapper: Option<Mapper>,

    pub span: Span,
}

/// Mapper of an alternative (`%% <expr>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper {
    /// Trimmed expression text, lines joined with `\n`
    pub code: String,
    pub span: Span,
}

/// Possibly repeated pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rep {
    pub pattern: SimplePattern,
    pub repetition: Option<Repetition>,
    pub span: Span,
}

/// Repetition modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    /// `?`
    Optional,

    /// `*`
    Any,

    /// `+`
    OneOrMore,
}

impl Repetition {
    /// Parse a repetition modifier
    pub fn parse(symbol: char) -> Option<Self> {
        match symbol {
            '?' => Some(Self::Optional),
            '*' => Some(Self::Any),
            '+' => Some(Self::OneOrMore),
            _ => None,
        }
    }

    /// Get the modifier's symbol
    pub fn symbol(self) -> char {
        match self {
            Self::Optional => '?',
            Self::Any => '*',
            Self::OneOrMore => '+',
        }
    }
}

/// Single pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplePattern {
    pub value: PatternValue,
    pub span: Span,
}

impl SimplePattern {
    /// Create a new pattern
    pub fn new(value: PatternValue, span: Span) -> Self {
        Self { value, span }
    }
}

/// Value of a [`SimplePattern`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternValue {
    /// Exact string (escapes already resolved)
    Literal(String),

    /// Regular expression, with flags among `i` and `s`
    Regex { source: String, flags: String },

    /// Any single character (`.`)
    Any,

    /// Reference to a rule (or to the enclosing template's parameter)
    Id(String),

    /// Back-reference to a previous capture of the enclosing sequence (`$n`)
    Variable(usize),

    /// Template instantiation (``name`body` ``, or `` `body` `` for the default template)
    Template { func: Option<String>, body: String },

    /// Function applied to a pattern (`func(pattern)`)
    Apply {
        func: String,
        pattern: Box<SimplePattern>,
    },

    /// Parenthesized sequence
    Group(Vec<GroupItem>),
}

/// Member of a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupItem {
    /// Flagged with `!`: only flagged members are projected out of the group
    pub important: bool,
    pub rep: Rep,
}
