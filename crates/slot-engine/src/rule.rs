//! Provider-authored records: recurring weekly rules, one-off exceptions and
//! bookings.
//!
//! These are the raw shapes handed over by the rule store. Time-of-day fields
//! stay strings on the record (that is how they are stored) and are parsed into
//! [`TimeOfDay`] at the expansion boundary; nothing downstream of the expander
//! ever sees the raw strings.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::interval::DateInterval;

/// Opaque identifier of the service provider whose calendar is queried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(pub String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a rule or exception opens time for booking or closes it.
///
/// There is no default: every record states its kind explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Available,
    Blocked,
}

/// A local wall-clock time of day with minute precision.
///
/// `24:00` is accepted so a rule can run until the end of the day; it is only
/// meaningful as an end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    pub const END_OF_DAY: TimeOfDay = TimeOfDay { minutes: 24 * 60 };

    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        match (hour, minute) {
            (24, 0) => Some(Self::END_OF_DAY),
            (0..=23, 0..=59) => Some(Self {
                minutes: (hour * 60 + minute) as u16,
            }),
            _ => None,
        }
    }

    /// Parse an `"HH:mm"` string: exactly two ':'-separated integers.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.minutes / 60)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.minutes % 60)
    }

    pub fn is_end_of_day(&self) -> bool {
        *self == Self::END_OF_DAY
    }

    /// The equivalent [`NaiveTime`], or `None` for `24:00`.
    pub fn to_naive(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0)
    }
}

impl FromStr for TimeOfDay {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Weekday number in the provider calendar's numbering: 1 = Sunday .. 7 = Saturday.
pub fn weekday_number(day: Weekday) -> u8 {
    day.number_from_sunday() as u8
}

/// Inverse of [`weekday_number`].
pub fn weekday_from_number(n: u8) -> Result<Weekday> {
    match n {
        1 => Ok(Weekday::Sun),
        2 => Ok(Weekday::Mon),
        3 => Ok(Weekday::Tue),
        4 => Ok(Weekday::Wed),
        5 => Ok(Weekday::Thu),
        6 => Ok(Weekday::Fri),
        7 => Ok(Weekday::Sat),
        other => Err(EngineError::InvalidWeekday(other)),
    }
}

/// Upper bound on the number of weeks a recurring entry may be created for.
pub const MAX_RECURRING_WEEKS: u32 = 30;

/// A weekly-repeating availability or block declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringRule {
    /// 1 = Sunday .. 7 = Saturday.
    pub day_of_week: u8,
    /// Local `"HH:mm"`.
    pub start_time: String,
    /// Local `"HH:mm"`.
    pub end_time: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub kind: RuleKind,
    /// Last calendar date (inclusive) on which the rule applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
}

fn default_active() -> bool {
    true
}

impl RecurringRule {
    /// An active rule with no expiry.
    pub fn weekly(day: Weekday, start: TimeOfDay, end: TimeOfDay, kind: RuleKind) -> Self {
        Self {
            day_of_week: weekday_number(day),
            start_time: start.to_string(),
            end_time: end.to_string(),
            is_active: true,
            kind,
            valid_until: None,
        }
    }

    /// A rule that repeats on `first_date`'s weekday for `weeks` occurrences.
    ///
    /// `weeks` must be within `1..=30`.
    pub fn for_weeks(
        first_date: NaiveDate,
        start: TimeOfDay,
        end: TimeOfDay,
        kind: RuleKind,
        weeks: u32,
    ) -> Result<Self> {
        if !(1..=MAX_RECURRING_WEEKS).contains(&weeks) {
            return Err(EngineError::InvalidEntry(format!(
                "recurring entries span 1 to {MAX_RECURRING_WEEKS} weeks, got {weeks}"
            )));
        }
        let last = first_date + Duration::weeks(i64::from(weeks) - 1);
        Ok(Self {
            valid_until: Some(last),
            ..Self::weekly(first_date.weekday(), start, end, kind)
        })
    }

    pub fn with_valid_until(mut self, date: NaiveDate) -> Self {
        self.valid_until = Some(date);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn weekday(&self) -> Result<Weekday> {
        weekday_from_number(self.day_of_week)
    }

    /// Parse the stored start and end strings.
    pub fn times(&self) -> Result<(TimeOfDay, TimeOfDay)> {
        Ok((
            TimeOfDay::parse(&self.start_time)?,
            TimeOfDay::parse(&self.end_time)?,
        ))
    }

    /// True if the rule still applies on `date` (no expiry, or `date <= valid_until`).
    pub fn applies_through(&self, date: NaiveDate) -> bool {
        self.valid_until.is_none_or(|until| date <= until)
    }

    /// The weekly recurrence as an RFC 5545 RRULE body, e.g. `FREQ=WEEKLY;BYDAY=MO`.
    pub fn to_rrule(&self) -> Result<String> {
        let byday = match self.weekday()? {
            Weekday::Mon => "MO",
            Weekday::Tue => "TU",
            Weekday::Wed => "WE",
            Weekday::Thu => "TH",
            Weekday::Fri => "FR",
            Weekday::Sat => "SA",
            Weekday::Sun => "SU",
        };
        Ok(format!("FREQ=WEEKLY;BYDAY={byday}"))
    }
}

/// A single concrete availability or block, not tied to a weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneOffException {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl OneOffException {
    /// `None` when the stored end precedes the start.
    pub fn interval(&self) -> Option<DateInterval> {
        DateInterval::new(self.start, self.end)
    }
}

/// Lifecycle of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Requested,
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Whether a booking in this state holds its time.
    pub fn occupies(&self) -> bool {
        !matches!(self, BookingStatus::Rejected | BookingStatus::Cancelled)
    }
}

/// An existing booking against a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub provider_id: ProviderId,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub status: BookingStatus,
}

impl Booking {
    /// The time the booking holds, or `None` if its status releases it.
    pub fn occupancy(&self, length: Duration) -> Option<DateInterval> {
        if !self.status.occupies() {
            return None;
        }
        DateInterval::starting_at(self.scheduled_at, length)
    }
}
