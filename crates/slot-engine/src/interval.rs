//! Half-open time intervals and the overlap predicate.
//!
//! Every interval in the engine is `[start, end)`. Two intervals that merely
//! touch (`a.end == b.start`) do NOT overlap, so back-to-back slots with zero
//! buffer never conflict with each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Build an interval, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, EngineError> {
        if start >= end {
            return Err(EngineError::InvalidInterval(format!(
                "start {start} is not before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Two intervals overlap iff `a.start < b.end && b.start < a.end`.
    /// Adjacent intervals, where one ends exactly when the other starts,
    /// are not overlapping.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Half-open membership: `start <= t < end`.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}
