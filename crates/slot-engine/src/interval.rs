//! Half-open date-time intervals.
//!
//! Every other component speaks in [`DateInterval`]s. Two intervals conflict
//! only when their interiors overlap: an interval ending exactly when another
//! starts is NOT a conflict, which is what allows back-to-back bookings.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::resolve_local_lenient;

/// Half-open interval `[start, end)` between two instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateInterval {
    /// Build an interval, returning `None` when `end` precedes `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Build an interval of `length` starting at `start`.
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Option<Self> {
        Self::new(start, start + length)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True iff the open interiors overlap.
    ///
    /// Zero-length intervals never intersect anything: they carry no
    /// duration to conflict over.
    pub fn intersects(&self, other: &DateInterval) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// Overlapping part of two intervals, if any.
    pub fn intersection(&self, other: &DateInterval) -> Option<DateInterval> {
        if !self.intersects(other) {
            return None;
        }
        Some(DateInterval {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// Closed-range test used when narrowing fetched records to a query
    /// window; unlike [`intersects`](Self::intersects) it keeps records that
    /// merely touch the window boundary.
    pub fn touches(&self, other: &DateInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// The provider-local calendar day `date` as a UTC interval.
///
/// The day runs from local midnight to the next local midnight, so it is 23
/// or 25 hours long on DST transition days.
pub fn day_bounds(date: NaiveDate, tz: Tz) -> DateInterval {
    let midnight = |d: NaiveDate| resolve_local_lenient(tz, d.and_time(NaiveTime::MIN));
    let start = midnight(date);
    let end = date
        .succ_opt()
        .map(midnight)
        .unwrap_or(start + Duration::days(1));
    DateInterval { start, end }
}
