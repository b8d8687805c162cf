//! Exit codes for owlctl

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when no rule or pattern matched
pub const EXIT_NO_MATCH: i32 = 2;

/// Exit code when a rule file fails to load
pub const EXIT_INVALID_RULES: i32 = 65;
