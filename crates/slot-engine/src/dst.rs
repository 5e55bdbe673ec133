//! DST transition policies for provider-local wall-clock times.
//!
//! Recurring rules are written as local "HH:mm" times. On the two days a year
//! a timezone changes offset, some local times happen twice and some never
//! happen at all; the policy decides which instant such a time maps to.

use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Policy for local times that fall during DST transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop rule instances whose local time falls in the DST gap
    Skip,
    /// Move a time inside the gap to the first valid minute after it
    ShiftForward,
    /// Keep the wall-clock reading and apply the offset in force before the gap
    #[default]
    WallClock,
}

/// Longest offset change handled when stepping out of a gap.
const MAX_GAP_MINUTES: i64 = 180;

/// Resolve a provider-local date-time to a UTC instant.
///
/// Ambiguous times (the repeated hour when clocks fall back) always resolve to
/// the earlier instant. Nonexistent times are handled per `policy`; only
/// [`DstPolicy::Skip`] yields `None` for them.
pub fn resolve_local(tz: Tz, local: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Utc>> {
    if let Some(t) = tz.from_local_datetime(&local).earliest() {
        return Some(t.with_timezone(&Utc));
    }

    match policy {
        DstPolicy::Skip => None,
        DstPolicy::ShiftForward => (1..=MAX_GAP_MINUTES)
            .map(|m| local + Duration::minutes(m))
            .find_map(|t| tz.from_local_datetime(&t).earliest())
            .map(|t| t.with_timezone(&Utc)),
        DstPolicy::WallClock => {
            let before = tz
                .from_local_datetime(&(local - Duration::minutes(MAX_GAP_MINUTES)))
                .earliest()?;
            let offset = before.offset().fix().local_minus_utc();
            let utc = local - Duration::seconds(i64::from(offset));
            Some(Utc.from_utc_datetime(&utc))
        }
    }
}

/// Resolve a local date-time that must always map somewhere (day boundaries).
///
/// Falls back to reading the wall clock as UTC, which only happens for
/// timezone data chrono-tz cannot resolve either side of.
pub(crate) fn resolve_local_lenient(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    resolve_local(tz, local, DstPolicy::WallClock).unwrap_or_else(|| Utc.from_utc_datetime(&local))
}
