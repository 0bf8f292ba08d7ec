//! Backtracking combinators
//!
//! Every combinator takes its sub-matchers as closures along with the subject and the start offset,
//! so that both the interpreter and generated code drive the same failure semantics.
//!
//! The central rule: a failure whose position equals the offset the attempt started at means
//! "did not apply", and lets the enclosing choice or repetition move on. Any other failure is
//! committed and propagated as-is.

use super::data::{Outcome, Success};
use super::errors::Failure;

/// Description of the failure of [`not`]
pub const EXPECTED_NOT: &str = "<not>";

/// Description of the failure of [`look`]
pub const EXPECTED_LOOK: &str = "<look>";

/// Description of the failure of [`backtrack`]
pub const EXPECTED_BACKTRACK: &str = "<backtrack>";

/// Apply matchers one after the other, each one starting where the previous one ended
///
/// Each matcher receives the values produced so far. The first failure aborts the sequence.
pub fn sequence<'i, T, I, F>(items: I, input: &'i str, start: usize) -> Outcome<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: FnOnce(&[T], &'i str, usize) -> Outcome<T>,
{
    let mut values = vec![];
    let mut end = start;

    for item in items {
        let Success { value, end: next } = item(&values, input, end)?;
        values.push(value);
        end = next;
    }

    Ok(Success::new(values, end))
}

/// Ordered choice
///
/// Alternatives are tried in order while they fail without progress. A failure past `start`
/// is committed and returned without trying the remaining alternatives. The last alternative's
/// outcome is returned unconditionally.
pub fn choice<'i, T, I, F>(alternatives: I, input: &'i str, start: usize) -> Outcome<T>
where
    I: IntoIterator<Item = F>,
    F: FnOnce(&'i str, usize) -> Outcome<T>,
{
    let mut alternatives = alternatives.into_iter().peekable();

    while let Some(alternative) = alternatives.next() {
        match alternative(input, start) {
            Err(failure) if failure.is_at(start) && alternatives.peek().is_some() => continue,
            outcome => return outcome,
        }
    }

    Err(Failure::new("<choice>", start))
}

/// Zero-or-one repetition (`?`)
pub fn optional<'i, T>(
    matcher: impl FnOnce(&'i str, usize) -> Outcome<T>,
    input: &'i str,
    start: usize,
) -> Outcome<Option<T>> {
    match matcher(input, start) {
        Ok(success) => Ok(success.map(Some)),
        Err(failure) if failure.is_at(start) => Ok(Success::new(None, start)),
        Err(failure) => Err(failure),
    }
}

/// Zero-or-more repetition (`*`)
///
/// Stops at the first attempt failing without progress. An attempt succeeding without
/// consuming anything also ends the repetition, and its value is discarded.
pub fn many<'i, T>(
    matcher: impl Fn(&'i str, usize) -> Outcome<T>,
    input: &'i str,
    start: usize,
) -> Outcome<Vec<T>> {
    collect_many(&matcher, vec![], input, start)
}

/// One-or-more repetition (`+`)
///
/// The first attempt's failure is propagated as-is.
pub fn many1<'i, T>(
    matcher: impl Fn(&'i str, usize) -> Outcome<T>,
    input: &'i str,
    start: usize,
) -> Outcome<Vec<T>> {
    let first = matcher(input, start)?;
    collect_many(&matcher, vec![first.value], input, first.end)
}

fn collect_many<'i, T>(
    matcher: &impl Fn(&'i str, usize) -> Outcome<T>,
    mut values: Vec<T>,
    input: &'i str,
    mut end: usize,
) -> Outcome<Vec<T>> {
    loop {
        match matcher(input, end) {
            Ok(success) if success.end == end => break,
            Ok(success) => {
                values.push(success.value);
                end = success.end;
            }
            Err(failure) if failure.is_at(end) => break,
            Err(failure) => return Err(failure),
        }
    }

    Ok(Success::new(values, end))
}

/// Negative lookahead
///
/// Succeeds iff `matcher` fails at `start`, consuming exactly one character.
/// Fails at the end of the input.
pub fn not<'i, T>(
    matcher: impl FnOnce(&'i str, usize) -> Outcome<T>,
    input: &'i str,
    start: usize,
) -> Outcome<&'i str> {
    if matcher(input, start).is_ok() {
        return Err(Failure::new(EXPECTED_NOT, start));
    }

    match input.get(start..).and_then(|rest| rest.chars().next()) {
        Some(c) => {
            let end = start + c.len_utf8();
            Ok(Success::new(&input[start..end], end))
        }
        None => Err(Failure::new(EXPECTED_NOT, start)),
    }
}

/// Positive lookahead
///
/// Produces `matcher`'s value but never consumes input.
pub fn look<'i, T>(
    matcher: impl FnOnce(&'i str, usize) -> Outcome<T>,
    input: &'i str,
    start: usize,
) -> Outcome<T> {
    match matcher(input, start) {
        Ok(success) => Ok(Success::new(success.value, start)),
        Err(_) => Err(Failure::new(EXPECTED_LOOK, start)),
    }
}

/// Atomic commit (`try`)
///
/// Any failure of `matcher` is reported at `start`, making a partial match invisible to the
/// enclosing choice or repetition.
pub fn attempt<'i, T>(
    matcher: impl FnOnce(&'i str, usize) -> Outcome<T>,
    input: &'i str,
    start: usize,
) -> Outcome<T> {
    matcher(input, start).map_err(|failure| failure.at(start))
}

/// Match backward, from `start` toward the beginning of the input
///
/// `matcher` is applied to the character-reversed prefix of the input. On success, the new
/// position is `start` minus the length matched.
pub fn backtrack<T>(
    matcher: impl FnOnce(&str, usize) -> Outcome<T>,
    input: &str,
    start: usize,
) -> Outcome<T> {
    let reversed = match input.get(..start) {
        Some(prefix) => prefix.chars().rev().collect::<String>(),
        None => return Err(Failure::new(EXPECTED_BACKTRACK, start)),
    };

    match matcher(&reversed, 0) {
        Ok(success) => Ok(Success::new(success.value, start - success.end)),
        Err(_) => Err(Failure::new(EXPECTED_BACKTRACK, start)),
    }
}

/// Select the values a group produces
///
/// With no important index, all values are kept. Otherwise only the important ones are, in order.
pub fn project<T>(values: Vec<T>, important: &[usize]) -> Vec<T> {
    if important.is_empty() {
        return values;
    }

    values
        .into_iter()
        .enumerate()
        .filter(|(i, _)| important.contains(i))
        .map(|(_, value)| value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::builtin::{any, literal};
    use super::*;

    type Alt<'a> = &'a dyn Fn(&str, usize) -> Outcome<Vec<String>>;

    fn lit(string: &'static str) -> impl Fn(&[String], &str, usize) -> Outcome<String> {
        move |_, input, start| literal(string, input, start).map(Success::into_owned)
    }

    fn ab_then_x(input: &str, start: usize) -> Outcome<Vec<String>> {
        sequence([lit("ab"), lit("X")], input, start)
    }

    fn ac(input: &str, start: usize) -> Outcome<Vec<String>> {
        literal("ac", input, start).map(|success| success.map(|s| vec![s.to_owned()]))
    }

    #[test]
    fn sequence_threads_positions() {
        assert_eq!(
            ab_then_x("abX", 0),
            Ok(Success::new(vec!["ab".to_owned(), "X".to_owned()], 3))
        );
        assert_eq!(ab_then_x("abY", 0), Err(Failure::new("X", 2)));
    }

    #[test]
    fn sequence_sees_previous_values() {
        let result = sequence(
            [
                Box::new(|_: &[String], input: &str, start: usize| {
                    literal("q", input, start).map(Success::into_owned)
                }) as Box<dyn FnOnce(&[String], &str, usize) -> Outcome<String>>,
                Box::new(|values: &[String], input: &str, start: usize| {
                    literal(&values[0], input, start).map(Success::into_owned)
                }),
            ],
            "qq",
            0,
        );

        assert_eq!(result.map(|s| s.end), Ok(2));
    }

    #[test]
    fn choice_falls_through_on_shallow_failure() {
        let result = choice([&ab_then_x as Alt, &ac], "ac", 0);
        assert_eq!(result.map(|s| s.end), Ok(2));
    }

    #[test]
    fn choice_commits_to_deep_failure() {
        let result = choice([&ab_then_x as Alt, &ac], "abY", 0);
        assert_eq!(result, Err(Failure::new("X", 2)));
    }

    #[test]
    fn try_reopens_backtracking() {
        let attempted = |input: &str, start: usize| attempt(ab_then_x, input, start);

        // Without `try`, the partial match of the first alternative is committed
        let result = choice([&ab_then_x as Alt, &ac], "abac", 0);
        assert_eq!(result, Err(Failure::new("X", 2)));

        // With it, the failure is moved back to the start and the choice goes on
        let result = choice([&attempted as Alt, &ac], "abac", 0);
        assert_eq!(result, Err(Failure::new("ac", 0)));

        let result = choice([&attempted as Alt, &ac], "ac", 0);
        assert_eq!(result.map(|s| s.end), Ok(2));
    }

    #[test]
    fn last_alternative_failure_is_returned() {
        let result = choice([&ac as Alt, &ab_then_x], "c", 0);
        assert_eq!(result, Err(Failure::new("ab", 0)));
    }

    #[test]
    fn optional_absorbs_shallow_failures_only() {
        assert_eq!(
            optional(|i, s| literal("a", i, s), "b", 0),
            Ok(Success::new(None, 0))
        );
        assert_eq!(optional(ab_then_x, "abY", 0), Err(Failure::new("X", 2)));
    }

    #[test]
    fn many_collects_until_no_progress() {
        let result = many(|i, s| literal("a", i, s), "aab", 0).unwrap();
        assert_eq!(result, Success::new(vec!["a", "a"], 2));

        let result = many(|i, s| literal("a", i, s), "b", 0).unwrap();
        assert_eq!(result, Success::new(vec![], 0));
    }

    #[test]
    fn many_propagates_partial_matches() {
        assert_eq!(many(ab_then_x, "abXabY", 0), Err(Failure::new("X", 5)));
    }

    #[test]
    fn many_stops_on_empty_success() {
        let result = many(|i, s| literal("", i, s), "aaa", 0).unwrap();
        assert_eq!(result, Success::new(vec![], 0));
    }

    #[test]
    fn many1_requires_one_match() {
        assert_eq!(
            many1(|i, s| literal("a", i, s), "b", 0),
            Err(Failure::new("a", 0))
        );
        assert_eq!(
            many1(|i, s| literal("a", i, s), "aa", 0),
            Ok(Success::new(vec!["a", "a"], 2))
        );
    }

    #[test]
    fn not_consumes_one_char() {
        assert_eq!(
            not(|i, s| literal("x", i, s), "ab", 0),
            Ok(Success::new("a", 1))
        );
        assert_eq!(
            not(|i, s| literal("a", i, s), "ab", 0),
            Err(Failure::new(EXPECTED_NOT, 0))
        );
        assert_eq!(
            not(|i, s| literal("a", i, s), "", 0),
            Err(Failure::new(EXPECTED_NOT, 0))
        );
    }

    #[test]
    fn double_negation_is_not_identity() {
        let subject: &'static str = "ab";
        let inner = |i, s| not(|i, s| literal("ab", i, s), i, s);

        // `ab` matches two characters, `not(not(ab))` only ever consumes one
        assert_eq!(not(inner, subject, 0), Ok(Success::new("a", 1)));
    }

    #[test]
    fn look_never_consumes() {
        assert_eq!(
            look(|i, s| literal("ab", i, s), "abc", 0),
            Ok(Success::new("ab", 0))
        );
        assert_eq!(
            look(|i, s| literal("x", i, s), "abc", 1),
            Err(Failure::new(EXPECTED_LOOK, 1))
        );
    }

    #[test]
    fn backtrack_moves_backward() {
        let result = backtrack(
            |i: &str, s| literal("cb", i, s).map(Success::into_owned),
            "abcd",
            3,
        );
        assert_eq!(result, Ok(Success::new("cb".to_owned(), 1)));

        let result = backtrack(|i: &str, s| any(i, s).map(Success::into_owned), "", 0);
        assert_eq!(result, Err(Failure::new(EXPECTED_BACKTRACK, 0)));
    }

    #[test]
    fn projection() {
        assert_eq!(project(vec![1, 2, 3], &[]), vec![1, 2, 3]);
        assert_eq!(project(vec![1, 2, 3], &[1]), vec![2]);
        assert_eq!(project(vec![1, 2, 3], &[0, 2]), vec![1, 3]);
    }
}
