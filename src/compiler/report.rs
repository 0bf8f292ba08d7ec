use super::errors::CompileError;
use crate::runtime::format_located;

/// Format in a human-readable way a compilation error
///
/// The first three lines follow the usual diagnostic layout (source line, caret, located message).
/// The error's tip, if any, is added on a fourth line.
pub fn pretty_format_compile_err(source: &str, err: &CompileError, name: Option<&str>) -> String {
    let located = format_located(source, err.span().start, &err.content().to_string(), name);

    match err.tip() {
        Some(tip) => format!("{}\nTip: {}", located, tip),
        None => located,
    }
}

#[cfg(test)]
mod tests {
    use super::super::errors::CompileErrorContent;
    use super::*;
    use crate::runtime::{Failure, Span};

    #[test]
    fn formats_syntax_errors_like_parse_failures() {
        let err = CompileError::new(
            Span::new(4, 4),
            CompileErrorContent::Syntax(Failure::new(";", 4)),
            None,
        );

        assert_eq!(
            pretty_format_compile_err("a = \n", &err, Some("g.peg")),
            "a = \n    ^\ng.peg: 1:5: Expected ;"
        );
    }

    #[test]
    fn appends_tip() {
        let err = CompileError::new(
            Span::new(0, 3),
            CompileErrorContent::UnknownRule("foo".into()),
            Some("rules must be declared in the same grammar"),
        );

        assert_eq!(
            pretty_format_compile_err("foo", &err, None),
            "foo\n^\n1:1: Unknown rule 'foo'\nTip: rules must be declared in the same grammar"
        );
    }
}
