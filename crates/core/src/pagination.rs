//! Limit helpers for list-style endpoints.

/// Default number of duplicate pairs returned by one scan request.
pub const DEFAULT_SCAN_LIMIT: i64 = 50;

/// Hard ceiling for the duplicate scan page size.
pub const MAX_SCAN_LIMIT: i64 = 500;

/// Clamp a user-provided limit to `[1, max]`, using `default` when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}
