//! # Generators
//!
//! This module contains generators for [parsed grammars](`super::compiler::parse_grammar`):
//! back to grammar source code, or to Rust code (with the `rustgen` feature).

pub mod grammar;
#[cfg(feature = "rustgen")]
pub mod rust;

pub use self::grammar::gen_grammar;
#[cfg(feature = "rustgen")]
pub use self::rust::{gen_rust_str, gen_rust_str_with, gen_rust_token_stream, gen_rust_token_stream_with};
