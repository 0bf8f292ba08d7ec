/// Name of the negative lookahead function
pub const FN_NOT: &str = "not";

/// Name of the positive lookahead function
pub const FN_LOOK: &str = "look";

/// Name of the atomic commit function
pub const FN_TRY: &str = "try";

/// Name of the backward matching function
pub const FN_BACKTRACK: &str = "backtrack";

/// Exhaustive list of all built-in functions, which cannot be used as rule names
pub static BUILTIN_FUNCTIONS: &[&str] = &[FN_NOT, FN_LOOK, FN_TRY, FN_BACKTRACK];

/// Check if a name refers to a built-in function
pub fn is_builtin_function(name: &str) -> bool {
    BUILTIN_FUNCTIONS.contains(&name)
}
