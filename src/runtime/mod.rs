//! # Matcher runtime
//!
//! This module contains the [combinators](combinators) every backend relies on, the [built-in matchers](builtin)
//! and an [interpreter](executor::execute) able to run [compiled grammars](crate::compiler::compile_grammar) directly.

mod builtin;
pub mod combinators;
mod data;
mod errors;
mod executor;
mod position;

pub use builtin::*;
pub use combinators::{
    attempt, backtrack, choice, look, many, many1, not, optional, project, sequence,
};
pub use data::*;
pub use errors::*;
pub use executor::*;
pub use position::*;
