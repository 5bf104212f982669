//! Lifetime overlap predicate.

use crate::types::UNBOUNDED_LIFE;

/// Whether the closed intervals `[s1, e1]` and `[s2, e2]` overlap.
///
/// Touching boundaries count as overlap, and an unbounded end overlaps
/// everything.
#[inline]
pub fn overlaps(s1: i64, e1: i64, s2: i64, e2: i64) -> bool {
    if e1 == UNBOUNDED_LIFE || e2 == UNBOUNDED_LIFE {
        return true;
    }
    !(e1 < s2 || e2 < s1)
}
