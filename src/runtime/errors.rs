use super::position::format_located;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a matcher
///
/// `position` is the furthest offset the failing attempt reached. Enclosing choices and
/// repetitions compare it to their own start offset to tell "did not apply here" (equal)
/// from "applied, then broke" (greater).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Description of what was expected
    pub expected: Arc<str>,

    /// Offset in the subject string
    pub position: usize,
}

impl Failure {
    /// Create a new failure
    pub fn new(expected: impl Into<Arc<str>>, position: usize) -> Self {
        Self {
            expected: expected.into(),
            position,
        }
    }

    /// Get the description of what was expected
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Check if the failure happened without any progress from `start`
    pub fn is_at(&self, start: usize) -> bool {
        self.position == start
    }

    /// Same failure, moved to another offset
    pub fn at(self, position: usize) -> Self {
        Self { position, ..self }
    }

    /// Format the failure against the subject it happened in
    pub fn format(&self, subject: &str, name: Option<&str>) -> String {
        format_located(
            subject,
            self.position,
            &format!("Expected {}", self.expected),
            name,
        )
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "expected {} at offset {}", self.expected, self.position)
    }
}

/// Failure rendered against its subject, ready to be displayed to a user
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    failure: Failure,
    message: String,
}

impl ParseError {
    /// Render a failure of a match on `subject`, optionally naming the subject
    pub fn new(subject: &str, failure: Failure, name: Option<&str>) -> Self {
        Self {
            message: failure.format(subject, name),
            failure,
        }
    }

    /// Get the underlying failure
    pub fn failure(&self) -> &Failure {
        &self.failure
    }

    /// Get the formatted three-line message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error returned when executing a compiled grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The subject did not match
    #[error("{0}")]
    Failed(Failure),

    #[error("No simple rule named '{0}'")]
    UnknownEntryRule(String),

    #[error("The grammar has no simple rule to start from")]
    MissingEntryRule,
}

impl RuntimeError {
    /// Get the match failure, if the subject did not match
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            Self::UnknownEntryRule(_) | Self::MissingEntryRule => None,
        }
    }
}

impl From<Failure> for RuntimeError {
    fn from(failure: Failure) -> Self {
        Self::Failed(failure)
    }
}
