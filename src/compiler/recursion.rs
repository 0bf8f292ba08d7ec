use super::data::Repetition;
use super::errors::{CompileError, CompileErrorContent};
use super::program::{Matcher, Program, RuleId};
use tracing::warn;

/// Which rules can succeed without consuming any input
///
/// Template rules depend on the literal they are given, so they are tracked twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nullable {
    /// Indexed by [`RuleId`], for a non-empty parameter
    pub rules: Vec<bool>,

    /// Indexed by [`RuleId`], for an empty parameter (``k`` ``)
    pub empty_param: Vec<bool>,
}

impl Nullable {
    fn rule(&self, id: RuleId, empty_param: bool) -> bool {
        if empty_param {
            self.empty_param[id]
        } else {
            self.rules[id]
        }
    }
}

/// Find which rules can succeed without consuming any input
///
/// Computed as a fixpoint over all rules.
pub fn nullable_rules(program: &Program) -> Nullable {
    let count = program.rules().len();

    let mut nullable = Nullable {
        rules: vec![false; count],
        empty_param: vec![false; count],
    };

    loop {
        let mut changed = false;

        for (id, rule) in program.rules().iter().enumerate() {
            for empty_param in [false, true] {
                if nullable.rule(id, empty_param)
                    || !rule.alternatives.iter().any(|alt| {
                        alt.items
                            .iter()
                            .all(|item| is_nullable(item, &nullable, empty_param))
                    })
                {
                    continue;
                }

                if empty_param {
                    nullable.empty_param[id] = true;
                } else {
                    nullable.rules[id] = true;
                }

                changed = true;
            }
        }

        if !changed {
            return nullable;
        }
    }
}

/// Check if a matcher can succeed without consuming any input
///
/// `empty_param` tells if the enclosing template rule was given an empty literal.
pub fn is_nullable(matcher: &Matcher, nullable: &Nullable, empty_param: bool) -> bool {
    match matcher {
        Matcher::Literal(string) => string.is_empty(),
        Matcher::Regex { rx, .. } => rx.is_match(""),
        Matcher::Param => empty_param,
        Matcher::Any | Matcher::Not(_) | Matcher::External { .. } => false,
        Matcher::Rule(id) => nullable.rules[*id],
        Matcher::Template { rule, arg } => nullable.rule(*rule, arg.is_empty()),

        // Captures may be empty, lookaheads and backward matches never move forward
        Matcher::Variable(_) | Matcher::Look(_) | Matcher::Backtrack(_) => true,

        Matcher::Try(inner) => is_nullable(inner, nullable, empty_param),
        Matcher::Group { items, .. } => items
            .iter()
            .all(|item| is_nullable(item, nullable, empty_param)),
        Matcher::Repeat(inner, repetition) => match repetition {
            Repetition::Optional | Repetition::Any => true,
            Repetition::OneOrMore => is_nullable(inner, nullable, empty_param),
        },
    }
}

/// Collect the rules a matcher may call at the offset it starts at
fn left_calls(matcher: &Matcher, nullable: &Nullable, empty_param: bool, calls: &mut Vec<RuleId>) {
    match matcher {
        Matcher::Rule(id) | Matcher::Template { rule: id, .. } => calls.push(*id),

        Matcher::Not(inner)
        | Matcher::Look(inner)
        | Matcher::Try(inner)
        | Matcher::Repeat(inner, _)
        | Matcher::External { inner, .. } => left_calls(inner, nullable, empty_param, calls),

        Matcher::Group { items, .. } => sequence_left_calls(items, nullable, empty_param, calls),

        Matcher::Literal(_)
        | Matcher::Regex { .. }
        | Matcher::Any
        | Matcher::Param
        | Matcher::Variable(_)
        | Matcher::Backtrack(_) => {}
    }
}

fn sequence_left_calls(items: &[Matcher], nullable: &Nullable, empty_param: bool, calls: &mut Vec<RuleId>) {
    for item in items {
        left_calls(item, nullable, empty_param, calls);

        if !is_nullable(item, nullable, empty_param) {
            break;
        }
    }
}

/// Find the template rules given an empty literal somewhere in the grammar
fn empty_param_calls(program: &Program) -> Vec<bool> {
    let mut called = vec![false; program.rules().len()];

    for item in program.rules().iter().flat_map(|rule| &rule.alternatives).flat_map(|alt| &alt.items) {
        for_each_matcher(item, &mut |matcher: &Matcher| {
            if let Matcher::Template { rule, arg } = matcher {
                if arg.is_empty() {
                    called[*rule] = true;
                }
            }
        });
    }

    called
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

/// Reject rules able to call themselves without consuming any input
///
/// The body of a template rule given an empty literal somewhere is checked as if its parameter matched nothing.
pub fn check_left_recursion(program: &Program, nullable: &Nullable) -> Result<(), CompileError> {
    let empty_calls = empty_param_calls(program);

    let graph = program
        .rules()
        .iter()
        .zip(&empty_calls)
        .map(|(rule, empty_param)| {
            let mut calls = vec![];

            for alt in &rule.alternatives {
                sequence_left_calls(&alt.items, nullable, *empty_param, &mut calls);
            }

            calls.sort_unstable();
            calls.dedup();
            calls
        })
        .collect::<Vec<_>>();

    let mut states = vec![VisitState::Unvisited; graph.len()];

    for id in 0..graph.len() {
        if let Some(cycle) = find_cycle(id, &graph, &mut states, &mut vec![]) {
            let rules = program.rules();

            return Err(CompileError::new(
                rules[cycle[0]].span,
                CompileErrorContent::LeftRecursion {
                    cycle: cycle.iter().map(|id| rules[*id].name.clone()).collect(),
                },
                Some("consume some input before recursing, or use a repetition instead"),
            ));
        }
    }

    Ok(())
}

fn find_cycle(
    id: RuleId,
    graph: &[Vec<RuleId>],
    states: &mut [VisitState],
    path: &mut Vec<RuleId>,
) -> Option<Vec<RuleId>> {
    match states[id] {
        VisitState::Done => return None,
        VisitState::InProgress => {
            let from = path.iter().position(|candidate| *candidate == id)?;
            let mut cycle = path[from..].to_vec();
            cycle.push(id);
            return Some(cycle);
        }
        VisitState::Unvisited => {}
    }

    states[id] = VisitState::InProgress;
    path.push(id);

    for next in &graph[id] {
        if let Some(cycle) = find_cycle(*next, graph, states, path) {
            return Some(cycle);
        }
    }

    path.pop();
    states[id] = VisitState::Done;
    None
}

/// Warn about repetitions whose body can succeed without consuming input
///
/// Such a repetition stops at the first empty match.
pub fn warn_nullable_repetitions(program: &Program, nullable: &Nullable) {
    for rule in program.rules() {
        for item in rule.alternatives.iter().flat_map(|alt| &alt.items) {
            for_each_matcher(item, &mut |matcher: &Matcher| match matcher {
                Matcher::Repeat(inner, Repetition::Any | Repetition::OneOrMore)
                    if is_nullable(inner, nullable, false) =>
                {
                    warn!(rule = %rule.name, "repeated pattern can match empty input");
                }
                _ => {}
            });
        }
    }
}

/// Call `func` on a matcher and on all the matchers nested in it
fn for_each_matcher(matcher: &Matcher, func: &mut impl FnMut(&Matcher)) {
    func(matcher);

    match matcher {
        Matcher::Not(inner)
        | Matcher::Look(inner)
        | Matcher::Try(inner)
        | Matcher::Backtrack(inner)
        | Matcher::Repeat(inner, _)
        | Matcher::External { inner, .. } => for_each_matcher(inner, func),

        Matcher::Group { items, .. } => {
            for item in items {
                for_each_matcher(item, func);
            }
        }

        Matcher::Literal(_)
        | Matcher::Regex { .. }
        | Matcher::Any
        | Matcher::Rule(_)
        | Matcher::Param
        | Matcher::Variable(_)
        | Matcher::Template { .. } => {}
    }
}
