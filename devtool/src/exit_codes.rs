//! Stable exit codes for devtool CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed (precondition, git/cargo failure, invalid config or other errors).
pub const FAILED: i32 = 1;
/// `devtool bump-version` found no commits since the most recent tag.
pub const NO_NEW_COMMITS: i32 = 2;
