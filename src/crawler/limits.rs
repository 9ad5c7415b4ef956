//! Bounds accepted for crawl parameters
//!
//! Configured defaults must lie inside these ranges; per-request values are
//! clamped into them.

use std::ops::RangeInclusive;

pub const MAX_PAGES: RangeInclusive<usize> = 1..=200;
pub const MAX_DEPTH: RangeInclusive<u32> = 0..=5;
pub const MAX_CONCURRENCY: RangeInclusive<usize> = 1..=16;
pub const TIMEOUT_MS: RangeInclusive<u64> = 2_000..=15_000;
pub const MAX_HTML_BYTES: RangeInclusive<usize> = 64 * 1024..=600 * 1024;

/// Clamps `value` into `range`
pub fn clamp<T: Ord + Copy>(value: T, range: &RangeInclusive<T>) -> T {
    value.clamp(*range.start(), *range.end())
}
