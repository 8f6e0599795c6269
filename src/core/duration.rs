// Duration arithmetic for tracked time.
//
// Purpose
// - Convert timestamp pairs into whole minutes, add up entry durations, and render totals.
//
// Responsibilities
// - Floor partial minutes, never round.
// - Clamp clock skew (end before start) to zero instead of failing.
// - Never perform input or output.

use chrono::{DateTime, Utc};

/// Anything that may carry a committed duration in minutes.
pub trait HasDuration {
    fn duration_minutes(&self) -> Option<i64>;
}

impl HasDuration for Option<i64> {
    fn duration_minutes(&self) -> Option<i64> {
        *self
    }
}

impl HasDuration for i64 {
    fn duration_minutes(&self) -> Option<i64> {
        Some(*self)
    }
}

/// Whole minutes between `start` and `end`, floored. Returns 0 when `end` precedes `start`.
pub fn elapsed_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes().max(0)
}

/// Plain sum of the durations, with missing durations counted as zero.
pub fn sum_durations<'a, T, I>(entries: I) -> i64
where
    T: HasDuration + 'a,
    I: IntoIterator<Item = &'a T>,
{
    entries
        .into_iter()
        .filter_map(|entry| entry.duration_minutes())
        .sum()
}

/// Renders minutes as `"{h}h {m}m"`, `"{h}h"` or `"{m}m"`.
pub fn format_minutes(total: i64) -> String {
    let total = total.max(0);
    let (hours, minutes) = (total / 60, total % 60);
    match (hours, minutes) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}
