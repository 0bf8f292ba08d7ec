use super::data::{Grammar, RuleKind};
use super::errors::{CompileError, CompileErrorContent};
use super::utils::is_builtin_function;
use std::collections::HashSet;

/// Validate the declarations of a grammar
///
/// Checks that rule names are unique (simple and template rules share the same namespace), that no rule
/// is named after a built-in function, and that at most one default template rule is declared.
/// References between rules are checked when compiling the grammar.
pub fn validate_grammar(grammar: &Grammar) -> Result<(), CompileError> {
    let mut names = HashSet::new();
    let mut has_default_template = false;

    for rule in &grammar.rules {
        match &rule.kind {
            RuleKind::Template { name: None, .. } => {
                if has_default_template {
                    return Err(CompileError::new(
                        rule.span,
                        CompileErrorContent::DuplicateDefaultTemplate,
                        Some("give a name to one of the template rules"),
                    ));
                }

                has_default_template = true;
            }

            RuleKind::Simple { name } | RuleKind::Template { name: Some(name), .. } => {
                if is_builtin_function(name) {
                    return Err(CompileError::new(
                        rule.span,
                        CompileErrorContent::ReservedRuleName(name.to_owned()),
                        None,
                    ));
                }

                if !names.insert(name.as_str()) {
                    return Err(CompileError::new(
                        rule.span,
                        CompileErrorContent::DuplicateRule(name.to_owned()),
                        Some("simple and template rules share the same names"),
                    ));
                }
            }
        }
    }

    Ok(())
}
