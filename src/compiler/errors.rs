use super::data::Span;
use crate::runtime::Failure;
use thiserror::Error;

/// Grammar compilation error
#[derive(Debug, Clone, Error)]
#[error("{content}")]
pub struct CompileError {
    span: Span,
    content: CompileErrorContent,
    tip: Option<&'static str>,
}

impl CompileError {
    /// Create a new compilation error
    pub(crate) fn new(span: Span, content: CompileErrorContent, tip: Option<&'static str>) -> Self {
        Self { span, content, tip }
    }

    /// Get the location of the error in the grammar's source
    pub fn span(&self) -> Span {
        self.span
    }

    /// Get the error's content
    pub fn content(&self) -> &CompileErrorContent {
        &self.content
    }

    /// Get the optional error's tip
    pub fn tip(&self) -> Option<&'static str> {
        self.tip
    }
}

/// Content of a [`CompileError`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileErrorContent {
    #[error("Expected {}", .0.expected)]
    Syntax(Failure),

    #[error("Expected rule or pasta block")]
    Leftover,

    #[error("Malformed syntax tree: expected {0}")]
    MalformedSyntaxTree(&'static str),

    #[error("Another rule was already declared with name '{0}'")]
    DuplicateRule(String),

    #[error("'{0}' is a built-in function and cannot be used as a rule name")]
    ReservedRuleName(String),

    #[error("A default template rule was already declared")]
    DuplicateDefaultTemplate,

    #[error("Unknown rule '{0}'")]
    UnknownRule(String),

    #[error("Unknown template rule '{0}'")]
    UnknownTemplate(String),

    #[error("No default template rule was declared")]
    MissingDefaultTemplate,

    #[error("Template rule '{0}' must be instantiated with a literal")]
    TemplateWithoutArgument(String),

    #[error("'{0}' is not a template rule")]
    NotATemplate(String),

    #[error("Rule '{0}' cannot be used as a transformer")]
    NotATransformer(String),

    #[error("Unknown transformer '{0}'")]
    UnknownTransformer(String),

    #[error("${0} does not refer to a previous capture of this sequence")]
    UnboundVariable(usize),

    #[error("${0} is ambiguous as it is also bound in an enclosing sequence")]
    VariableCollision(usize),

    #[error("Invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("Invalid mapper: {0}")]
    InvalidMapper(String),

    #[error("Left recursion detected: {}", .cycle.join(" -> "))]
    LeftRecursion { cycle: Vec<String> },

    #[error("Invalid Rust code: {0}")]
    InvalidHostCode(String),
}
