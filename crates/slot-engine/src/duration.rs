//! Ceiling on the length of a new provider-authored entry.
//!
//! Answers "how much contiguous room is there from this start?" against the
//! day's busy intervals only. Declared availability is deliberately not
//! consulted: the result bounds what a provider may type in when creating a
//! new availability or block rule.

use chrono::{DateTime, Utc};

use crate::error::{EngineError, Result};
use crate::interval::DateInterval;
use crate::rule::MAX_RECURRING_WEEKS;

/// Shortest entry a provider may create, in hours.
pub const MIN_ENTRY_HOURS: u32 = 1;

/// Whole hours available from `candidate` before the next busy interval.
///
/// Busy intervals starting at or after `horizon_end` are ignored; without a
/// conflict inside the horizon the ceiling is `policy_max_hours`. A candidate
/// that sits inside a busy interval has no room at all.
pub fn max_duration_hours(
    candidate: DateTime<Utc>,
    busy: &[DateInterval],
    horizon_end: DateTime<Utc>,
    policy_max_hours: u32,
) -> u32 {
    let inside_busy = busy
        .iter()
        .any(|b| !b.is_empty() && b.contains_instant(candidate));
    if inside_busy {
        return 0;
    }

    let next_conflict = busy
        .iter()
        .filter(|b| !b.is_empty())
        .map(|b| b.start)
        .filter(|&start| start > candidate && start < horizon_end)
        .min();

    match next_conflict {
        Some(start) => {
            let room = (start - candidate).num_hours();
            u32::try_from(room).unwrap_or(0).min(policy_max_hours)
        }
        None => policy_max_hours,
    }
}

/// Validate a requested entry against the computed ceiling.
///
/// `hours` must lie in `1..=ceiling_hours`; for recurring entries `weeks` must
/// lie in `1..=30`.
pub fn validate_entry(hours: u32, ceiling_hours: u32, weeks: Option<u32>) -> Result<()> {
    if ceiling_hours < MIN_ENTRY_HOURS {
        return Err(EngineError::InvalidEntry(
            "no free time at the requested start".to_string(),
        ));
    }
    if !(MIN_ENTRY_HOURS..=ceiling_hours).contains(&hours) {
        return Err(EngineError::InvalidEntry(format!(
            "duration must be between {MIN_ENTRY_HOURS} and {ceiling_hours} hours, got {hours}"
        )));
    }
    if let Some(weeks) = weeks {
        if !(1..=MAX_RECURRING_WEEKS).contains(&weeks) {
            return Err(EngineError::InvalidEntry(format!(
                "recurring entries span 1 to {MAX_RECURRING_WEEKS} weeks, got {weeks}"
            )));
        }
    }
    Ok(())
}
