//! Interval algebra module
//!
//! Half-open `[start, end)` datetime intervals and the three primitives all
//! calendar math routes through: merge, subtract and intersect. Outputs are
//! always normalized: sorted, disjoint, non-empty.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` datetime interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    /// Creates a new interval; `end <= start` yields an empty interval
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Checks whether the interval contains no time at all
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Length of the interval in fractional minutes
    pub fn duration_min(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            (self.end - self.start).num_seconds() as f64 / 60.0
        }
    }

    /// Intersects this interval with another, if they overlap
    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(Interval::new(start, end))
        } else {
            None
        }
    }

    /// Splits the interval at midnight boundaries
    ///
    /// Each returned piece lies inside a single calendar day and is tagged
    /// with that day. Used for attributing overtime minutes to dates.
    pub fn split_by_day(&self) -> Vec<(NaiveDate, Interval)> {
        let mut pieces = Vec::new();
        let mut cursor = self.start;
        while cursor < self.end {
            let day = cursor.date();
            let next_midnight = (day + Duration::days(1)).and_time(NaiveTime::MIN);
            let piece_end = next_midnight.min(self.end);
            pieces.push((day, Interval::new(cursor, piece_end)));
            cursor = piece_end;
        }
        pieces
    }
}

/// Merges a list of intervals into a normalized list
///
/// Sorts by start, sweeps and coalesces touching or overlapping intervals.
/// Empty inputs are dropped.
pub fn merge(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted: Vec<Interval> = intervals.iter().filter(|iv| !iv.is_empty()).copied().collect();
    sorted.sort();

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for iv in sorted {
        match merged.last_mut() {
            Some(last) if iv.start <= last.end => {
                last.end = last.end.max(iv.end);
            }
            _ => merged.push(iv),
        }
    }
    merged
}

/// Removes forbidden intervals from a list of base intervals
///
/// Both inputs are normalized first; the result is the normalized set
/// difference `base \ forbidden`.
pub fn subtract(base: &[Interval], forbidden: &[Interval]) -> Vec<Interval> {
    let base = merge(base);
    let forbidden = merge(forbidden);

    let mut remaining = Vec::new();
    for b in &base {
        let mut cursor = b.start;
        for f in &forbidden {
            if f.end <= cursor {
                continue;
            }
            if f.start >= b.end {
                break;
            }
            if f.start > cursor {
                remaining.push(Interval::new(cursor, f.start.min(b.end)));
            }
            cursor = cursor.max(f.end);
            if cursor >= b.end {
                break;
            }
        }
        if cursor < b.end {
            remaining.push(Interval::new(cursor, b.end));
        }
    }
    remaining
}

/// Intersects two interval lists
pub fn intersect(left: &[Interval], right: &[Interval]) -> Vec<Interval> {
    let left = merge(left);
    let right = merge(right);

    let mut common = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if let Some(overlap) = left[i].intersection(&right[j]) {
            common.push(overlap);
        }
        if left[i].end <= right[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }
    common
}
