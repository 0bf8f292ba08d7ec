//! Helpers for single grammar tokens, shared by the meta-grammar lowering and the grammar formatter

/// Get the value of a quoted literal token (`'...'`)
///
/// Supported escapes are `\'`, `\\`, `\n`, `\r` and `\t`. Other backslashes are kept verbatim.
pub fn unescape_literal(token: &str) -> String {
    let inner = token
        .strip_prefix('\'')
        .and_then(|token| token.strip_suffix('\''))
        .unwrap_or(token);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Write a string as a quoted literal token
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');

    for c in value.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }

    out.push('\'');
    out
}

/// Split a regex token (`/source/flags`) into its source and flags
///
/// Escaped slashes are unescaped in the returned source.
pub fn split_regex(token: &str) -> (String, String) {
    let body = token.strip_prefix('/').unwrap_or(token);

    let (inner, flags) = match body.rfind('/') {
        Some(closing) => (&body[..closing], &body[closing + 1..]),
        None => (body, ""),
    };

    let mut source = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            source.push(c);
            continue;
        }

        match chars.next() {
            Some('/') => source.push('/'),
            Some(other) => {
                source.push('\\');
                source.push(other);
            }
            None => source.push('\\'),
        }
    }

    (source, flags.to_owned())
}

/// Write a regex as a token (`/source/flags`), escaping its slashes
pub fn escape_regex(source: &str, flags: &str) -> String {
    let mut out = String::with_capacity(source.len() + flags.len() + 2);
    out.push('/');

    let mut chars = source.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push('\\');

                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '/' => out.push_str("\\/"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }

    out.push('/');
    out.push_str(flags);
    out
}

/// Get the index of a variable token (`$n`)
pub fn parse_variable(token: &str) -> Option<usize> {
    token.strip_prefix('$')?.parse().ok()
}

/// Normalize a mapper's text: every line is trimmed, and blank lines are removed
pub fn normalize_mapper(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_escapes() {
        assert_eq!(unescape_literal(r"'it\'s'"), "it's");
        assert_eq!(unescape_literal(r"'a\\b\n'"), "a\\b\n");
        assert_eq!(unescape_literal(r"'\d'"), r"\d");
        assert_eq!(escape_literal("it's\t\\"), r"'it\'s\t\\'");
    }

    #[test]
    fn literal_round_trip() {
        for value in ["", "%{", "'", "\\", "a\nb", r"\d"] {
            assert_eq!(unescape_literal(&escape_literal(value)), value);
        }
    }

    #[test]
    fn regex_tokens() {
        assert_eq!(split_regex("/ab/"), ("ab".into(), "".into()));
        assert_eq!(split_regex("/a\\/b/is"), ("a/b".into(), "is".into()));
        assert_eq!(split_regex(r"/\d+/"), (r"\d+".into(), "".into()));
        assert_eq!(escape_regex("a/b", "i"), r"/a\/b/i");
        assert_eq!(escape_regex(r"\\", ""), r"/\\/");
    }

    #[test]
    fn variables() {
        assert_eq!(parse_variable("$0"), Some(0));
        assert_eq!(parse_variable("$12"), Some(12));
        assert_eq!(parse_variable("12"), None);
    }

    #[test]
    fn mapper_text() {
        assert_eq!(normalize_mapper("  foo($0,\n      $1)  \n"), "foo($0,\n$1)");
    }
}
