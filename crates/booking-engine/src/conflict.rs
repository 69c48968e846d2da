//! Interval-overlap conflict detection.
//!
//! Intervals are half-open, `[start, end)`: two intervals conflict unless one
//! ends at or before the other begins, so back-to-back appointments never
//! collide. Callers pass the *materialized* occurrence set, which is what
//! makes every future instance of a recurring series count, not just its
//! first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::appointment::Occurrence;

/// Anything with a half-open time span.
pub trait Timed {
    fn start(&self) -> DateTime<Utc>;
    fn end(&self) -> DateTime<Utc>;
}

/// A bare `[start, end)` span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

impl Timed for Interval {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Whether `a` and `b` overlap. Symmetric; touching endpoints do not count.
pub fn overlaps<A: Timed + ?Sized, B: Timed + ?Sized>(a: &A, b: &B) -> bool {
    !(a.end() <= b.start() || a.start() >= b.end())
}

/// Every item in `existing` that overlaps `proposed`, in input order.
///
/// # Examples
///
/// ```
/// use booking_engine::conflict::{find_conflicts, Interval};
/// use chrono::{TimeZone, Utc};
///
/// let at = |h, m| Utc.with_ymd_and_hms(2026, 3, 16, h, m, 0).unwrap();
/// let existing = vec![Interval::new(at(14, 0), at(15, 0))];
///
/// assert_eq!(find_conflicts(&Interval::new(at(14, 30), at(15, 30)), &existing).len(), 1);
/// assert!(find_conflicts(&Interval::new(at(15, 0), at(16, 0)), &existing).is_empty());
/// ```
pub fn find_conflicts<'a, P, T>(proposed: &P, existing: &'a [T]) -> Vec<&'a T>
where
    P: Timed + ?Sized,
    T: Timed,
{
    existing
        .iter()
        .filter(|item| overlaps(proposed, *item))
        .collect()
}

/// Whether anything in `existing` overlaps `proposed`.
pub fn has_conflict<P, T>(proposed: &P, existing: &[T]) -> bool
where
    P: Timed + ?Sized,
    T: Timed,
{
    existing.iter().any(|item| overlaps(proposed, item))
}

/// Render conflicts for a human: `"Title (start - end); ..."`.
pub fn describe_conflicts(conflicts: &[&Occurrence]) -> String {
    if conflicts.is_empty() {
        return "no conflicts".to_string();
    }
    let listed = conflicts
        .iter()
        .map(|c| {
            format!(
                "{} ({} - {})",
                c.title,
                c.start_time.to_rfc3339(),
                c.end_time.to_rfc3339()
            )
        })
        .collect::<Vec<_>>()
        .join("; ");
    format!("conflicts with existing appointment(s): {listed}")
}
