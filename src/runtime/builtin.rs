use super::data::{Outcome, Success};
use super::errors::Failure;
use regex::Regex;

/// Description of the failure of [`any`]
pub const EXPECTED_ANY: &str = "<any>";

/// Match a constant string
///
/// Succeeds iff `input` starts with `string` at `start`, consuming exactly its length.
pub fn literal<'i>(string: &str, input: &'i str, start: usize) -> Outcome<&'i str> {
    match input.get(start..) {
        Some(rest) if rest.starts_with(string) => {
            let end = start + string.len();
            Ok(Success::new(&input[start..end], end))
        }
        _ => Err(Failure::new(string, start)),
    }
}

/// Match a regular expression compiled with [`anchored_regex`]
///
/// `description` is reported as the expected item on failure.
pub fn regex<'i>(rx: &Regex, description: &str, input: &'i str, start: usize) -> Outcome<&'i str> {
    let found = input
        .get(start..)
        .and_then(|rest| rx.find(rest))
        .filter(|found| found.start() == 0);

    match found {
        Some(found) => {
            let end = start + found.end();
            Ok(Success::new(&input[start..end], end))
        }
        None => Err(Failure::new(description, start)),
    }
}

/// Match any single character
pub fn any(input: &str, start: usize) -> Outcome<&str> {
    match input.get(start..).and_then(|rest| rest.chars().next()) {
        Some(c) => {
            let end = start + c.len_utf8();
            Ok(Success::new(&input[start..end], end))
        }
        None => Err(Failure::new(EXPECTED_ANY, start)),
    }
}

/// Get the offset right after the whitespaces following `start`
pub fn skip_whitespace(input: &str, start: usize) -> usize {
    let skipped = input
        .get(start..)
        .map(|rest| {
            rest.chars()
                .take_while(|c| c.is_whitespace())
                .map(char::len_utf8)
                .sum::<usize>()
        })
        .unwrap_or(0);

    start + skipped
}

/// Get the text between two offsets, in whichever order they come
///
/// Offsets that do not fall on character boundaries give an empty string.
pub fn matched_text(input: &str, from: usize, to: usize) -> &str {
    input.get(from.min(to)..from.max(to)).unwrap_or_default()
}

/// Compile a regular expression so that it only matches at the beginning of its haystack
///
/// `flags` may contain `i` (case-insensitive) and `s` (dot matches new lines).
pub fn anchored_regex(source: &str, flags: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?{}:{})", flags, source))
}

/// Human-readable description of a regular expression, as written in grammars
pub fn regex_description(source: &str, flags: &str) -> String {
    format!("/{}/{}", source, flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matches_prefix_only() {
        assert_eq!(literal("ab", "abc", 0), Ok(Success::new("ab", 2)));
        assert_eq!(literal("bc", "abc", 1), Ok(Success::new("bc", 3)));
        assert_eq!(literal("bc", "abc", 0), Err(Failure::new("bc", 0)));
        assert_eq!(literal("c", "abc", 5), Err(Failure::new("c", 5)));
    }

    #[test]
    fn empty_literal_always_matches() {
        assert_eq!(literal("", "abc", 3), Ok(Success::new("", 3)));
    }

    #[test]
    fn regex_is_anchored() {
        let rx = anchored_regex("b+", "").unwrap();
        assert_eq!(regex(&rx, "/b+/", "abbc", 1), Ok(Success::new("bb", 3)));
        assert_eq!(regex(&rx, "/b+/", "abbc", 0), Err(Failure::new("/b+/", 0)));
    }

    #[test]
    fn regex_flags() {
        let rx = anchored_regex("ab.", "is").unwrap();
        assert_eq!(regex(&rx, "/ab./is", "AB\n", 0), Ok(Success::new("AB\n", 3)));
        assert_eq!(regex_description("ab.", "is"), "/ab./is");
    }

    #[test]
    fn regex_alternation_stays_anchored() {
        let rx = anchored_regex("x|b", "").unwrap();
        assert!(regex(&rx, "/x|b/", "ab", 0).is_err());
    }

    #[test]
    fn any_consumes_one_char() {
        assert_eq!(any("é!", 0), Ok(Success::new("é", 2)));
        assert_eq!(any("a", 1), Err(Failure::new(EXPECTED_ANY, 1)));
    }

    #[test]
    fn matched_text_accepts_both_orders() {
        assert_eq!(matched_text("abcd", 1, 3), "bc");
        assert_eq!(matched_text("abcd", 3, 1), "bc");
        assert_eq!(matched_text("é", 0, 1), "");
    }

    #[test]
    fn skips_whitespace() {
        assert_eq!(skip_whitespace("if  \n x", 2), 6);
        assert_eq!(skip_whitespace("if", 2), 2);
    }
}
