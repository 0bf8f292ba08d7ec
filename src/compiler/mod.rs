//! # Grammar compiler
//!
//! This module turns grammar sources into a [data model](data), and the data model into [programs](Program)
//! whose every name is resolved.
//!
//! Programs can then be run by the [built-in runtime](`crate::runtime`), while the data model feeds the
//! [generators](`crate::generators`).

pub mod data;
mod errors;
mod lower;
pub mod mapper;
mod meta;
mod parser;
mod program;
mod recursion;
mod report;
pub(crate) mod singles;
pub(crate) mod utils;
mod validator;

pub use data::*;
pub use errors::*;
pub use lower::lower_grammar;
pub use mapper::MapperExpr;
pub use meta::*;
pub use parser::*;
pub use program::*;
pub use recursion::{check_left_recursion, is_nullable, nullable_rules, Nullable};
pub use report::*;
pub use validator::*;
