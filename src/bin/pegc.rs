//! Command-line interface for pegc
//!
//! Usage:
//!   pegc `<grammar>` [--emit `<check|grammar|rust>`]          - Check or translate a grammar
//!   pegc `<grammar>` --input `<file>` [--entry `<rule>`] [--full] - Parse a file with a grammar, printed as JSON
//!
//! Logs are written to stderr and controlled by `RUST_LOG` (e.g. `RUST_LOG=pegc=debug`).

use clap::{Parser, ValueEnum};
use pegc::compiler::{compile_grammar, parse_grammar, pretty_format_compile_err, CompileError, CompileOptions};
use pegc::runtime::RuntimeOptions;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pegc", version, about = "A self-hosted PEG parser compiler")]
struct Args {
    /// Path to the grammar file
    grammar: PathBuf,

    /// What to output for the grammar
    #[arg(long, value_enum, default_value_t = Emit::default())]
    emit: Emit,

    /// Parse this file with the grammar instead, and print the produced value as JSON
    #[arg(long)]
    input: Option<PathBuf>,

    /// Rule to start parsing from (defaults to the grammar's first simple rule)
    #[arg(long, requires = "input")]
    entry: Option<String>,

    /// Require the whole input to be consumed
    #[arg(long, requires = "input")]
    full: bool,

    /// Don't skip whitespaces after template rules
    #[arg(long)]
    no_template_whitespace: bool,

    /// Accept left-recursive grammars
    #[arg(long)]
    allow_left_recursion: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Emit {
    /// Only check the grammar
    Check,

    /// Print the grammar back in its canonical layout
    Grammar,

    /// Print a Rust module implementing the grammar (requires the `rustgen` feature)
    Rust,
}

impl Default for Emit {
    #[cfg(feature = "rustgen")]
    fn default() -> Self {
        Emit::Rust
    }

    #[cfg(not(feature = "rustgen"))]
    fn default() -> Self {
        Emit::Check
    }
}

/// Failure of a command, already reported to the user
enum Failed {
    Io,
    Grammar,
    Subject,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failed::Io) => ExitCode::from(2),
        Err(Failed::Grammar | Failed::Subject) => ExitCode::from(1),
    }
}

fn run(args: &Args) -> Result<(), Failed> {
    let source = read(&args.grammar)?;
    let name = args.grammar.display().to_string();

    let report = |err: CompileError| {
        println!("{}", pretty_format_compile_err(&source, &err, Some(&name)));
        Failed::Grammar
    };

    // Mappers are only interpreted when parsing an input
    let mut options = match args.input {
        Some(_) => CompileOptions::new(),
        None => CompileOptions::for_codegen(),
    };

    options.template_whitespace = !args.no_template_whitespace;
    options.reject_left_recursion = !args.allow_left_recursion;

    if let Some(input) = &args.input {
        let parser = pegc::compile_with(&source, Some(&name), &options).map_err(report)?;
        let subject = read(input)?;

        let parsed = parser
            .parse_with(
                &subject,
                args.entry.as_deref(),
                RuntimeOptions::new().with_full_match(args.full),
            )
            .map_err(|err| {
                println!("{}", parser.report(&subject, &err));
                Failed::Subject
            })?;

        debug!(end = parsed.end, len = subject.len(), "parsed input");

        match serde_json::to_string_pretty(&parsed.value) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("Failed to serialize the parsed value: {}", err);
                return Err(Failed::Subject);
            }
        }

        return Ok(());
    }

    let grammar = parse_grammar(&source).map_err(report)?;

    match args.emit {
        Emit::Check => {
            let program = compile_grammar(&grammar, &options).map_err(report)?;
            println!(
                "{}: {} rules, {} pasta blocks",
                name,
                program.rules().len(),
                grammar.pastas.len()
            );
        }

        Emit::Grammar => {
            compile_grammar(&grammar, &options).map_err(report)?;
            print!("{}", pegc::generators::gen_grammar(&grammar));
        }

        #[cfg(feature = "rustgen")]
        Emit::Rust => {
            let code = pegc::generators::gen_rust_str_with(&grammar, &options).map_err(report)?;
            print!("{}", code);
        }

        #[cfg(not(feature = "rustgen"))]
        Emit::Rust => {
            eprintln!("pegc was built without the 'rustgen' feature");
            return Err(Failed::Grammar);
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<String, Failed> {
    fs::read_to_string(path).map_err(|err| {
        eprintln!("Failed to read '{}': {}", path.display(), err);
        Failed::Io
    })
}
