use pegc::compiler::{parse_grammar, pretty_format_compile_err};
use pegc::generators::gen_rust_str;
use std::path::{Path, PathBuf};
use std::{env, fs};

/// Module name and path of every grammar to generate a parser for
static GRAMMARS: &[(&str, &str)] = &[
    ("calc", "../tests/fixtures/calc.peg"),
    ("shadowing", "grammars/shadowing.peg"),
    ("backref", "grammars/backref.peg"),
    ("lists", "grammars/lists.peg"),
];

fn main() {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is not set"));

    for &(name, path) in GRAMMARS {
        println!("cargo:rerun-if-changed={}", path);

        let source = fs::read_to_string(manifest_dir.join(path))
            .unwrap_or_else(|err| panic!("Failed to read '{}': {}", path, err));

        let code = parse_grammar(&source)
            .and_then(|grammar| gen_rust_str(&grammar))
            .unwrap_or_else(|err| panic!("{}", pretty_format_compile_err(&source, &err, Some(path))));

        fs::write(out_dir.join(format!("{}.rs", name)), code)
            .unwrap_or_else(|err| panic!("Failed to write the parser for '{}': {}", path, err));
    }
}
