//! Stable exit codes for `categories` CLI commands.

/// Command succeeded (including moves that change nothing).
pub const OK: i32 = 0;
/// Invalid layout, config, store, or arguments; or a store write failed.
pub const INVALID: i32 = 1;
/// Move rejected because it would create a cycle.
pub const REJECTED: i32 = 2;
/// A referenced category does not exist.
pub const NOT_FOUND: i32 = 3;
