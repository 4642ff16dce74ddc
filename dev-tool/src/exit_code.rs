//! Exit codes of the commands.

/// Everything went fine.
pub const NO_ERROR: i32 = 0;

/// The command finished but some of its input had to be skipped.
pub const NON_FATAL_ERROR: i32 = 1;

/// The command failed.
pub const FATAL_ERROR: i32 = 2;
