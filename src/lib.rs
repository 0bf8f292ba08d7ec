//! # pegc
//!
//! pegc is a self-hosted PEG parser compiler. Grammars are written in a small meta-language, itself described
//! by a [grammar](compiler::meta_grammar) that goes through the very same pipeline as user grammars.
//!
//! It provides functions to [parse grammars](`compiler::parse_grammar`), to [compile](`compiler::compile_grammar`)
//! them, a [runtime](`runtime::execute`) to run them directly, and [generators](`generators`) to turn them back
//! into source code or into Rust code.
//!
//! ## Usage
//!
//! ```rust
//! use pegc::compiler::pretty_format_compile_err;
//!
//! // 1. Define the grammar
//! static GRAMMAR: &str = r#"
//! greeting = hello ws world ws? '!'* %% greeting($0, $2)
//!     ;
//! hello = 'Hello' ;
//! world = /[a-z]+/i %% text()
//!     ;
//! ws = /\s+/ ;
//! "#;
//!
//! // 2. Compile the grammar
//! let parser = pegc::compile(GRAMMAR, Some("greeting.peg"))
//!     .unwrap_or_else(|err| panic!("{}", pretty_format_compile_err(GRAMMAR, &err, Some("greeting.peg"))));
//!
//! // 3. Define the subject to use the compiled grammar on
//! let subject = "Hello world !!";
//!
//! // 4. Parse it
//! let parsed = parser
//!     .parse(subject)
//!     .unwrap_or_else(|err| panic!("{}", parser.report(subject, &err)));
//!
//! // 5. Play with the parsed content!
//! assert_eq!(parsed.end, 14);
//! ```

#![forbid(unsafe_code)]
#![forbid(unused_must_use)]

pub mod compiler;
pub mod generators;
pub mod runtime;

// Used by generated code
pub use lazy_static;
pub use regex;

use compiler::{compile_grammar, parse_grammar, CompileError, CompileOptions, Grammar, Program};
use runtime::{execute, ParseError, RuntimeContext, RuntimeError, RuntimeOptions, Success, Value};

/// Compile a grammar's source code with the default options
///
/// `name` is used in diagnostics only.
pub fn compile(source: &str, name: Option<&str>) -> Result<Parser, CompileError> {
    compile_with(source, name, &CompileOptions::new())
}

/// Compile a grammar's source code
pub fn compile_with(
    source: &str,
    name: Option<&str>,
    options: &CompileOptions,
) -> Result<Parser, CompileError> {
    let grammar = parse_grammar(source)?;
    let program = compile_grammar(&grammar, options)?;

    Ok(Parser {
        name: name.map(str::to_owned),
        grammar,
        program,
    })
}

/// Compiled grammar, ready to parse subjects
///
/// Parsers hold no mutable state and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Parser {
    name: Option<String>,
    grammar: Grammar,
    program: Program,
}

impl Parser {
    /// Get the grammar's display name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the grammar's data model
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Get the compiled grammar
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Match a subject from its beginning, using the grammar's first simple rule
    ///
    /// The match doesn't need to consume the whole subject.
    pub fn parse(&self, subject: &str) -> Result<Success<Value>, RuntimeError> {
        self.parse_with(subject, None, RuntimeOptions::new())
    }

    /// Match a subject from its beginning, using a specific rule and options
    pub fn parse_with(
        &self,
        subject: &str,
        entry: Option<&str>,
        options: RuntimeOptions,
    ) -> Result<Success<Value>, RuntimeError> {
        execute(&RuntimeContext {
            program: &self.program,
            subject,
            entry,
            options,
        })
    }

    /// Describe a parsing error in a human-readable way
    ///
    /// Match failures are rendered as a three-line diagnostic pointing into the subject.
    pub fn report(&self, subject: &str, err: &RuntimeError) -> String {
        match err.failure() {
            Some(failure) => ParseError::new(subject, failure.clone(), self.name()).to_string(),
            None => err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Failure;
    use pretty_assertions::assert_eq;

    #[test]
    fn reports_failures_with_the_grammar_name() {
        let parser = compile("main = 'abcd' ;", Some("test")).unwrap();
        let err = parser.parse("xabcd").unwrap_err();

        assert_eq!(err, RuntimeError::Failed(Failure::new("abcd", 0)));
        assert_eq!(parser.report("xabcd", &err), "xabcd\n^\ntest: 1:1: Expected abcd");
    }

    #[test]
    fn reports_other_errors_as_messages() {
        let parser = compile("main = 'a' ;", None).unwrap();
        let err = parser
            .parse_with("a", Some("other"), RuntimeOptions::new())
            .unwrap_err();

        assert_eq!(parser.report("a", &err), "No simple rule named 'other'");
    }

    #[test]
    fn parsers_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Parser>();
    }
}
