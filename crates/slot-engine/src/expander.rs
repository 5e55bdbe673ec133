//! Recurring rule expansion -- projects a weekly rule onto concrete dates.
//!
//! [`expand_on`] answers the per-day question the resolver asks: does this rule
//! produce an interval on date `D`, and if so which one? [`expand_between`]
//! walks a date range by expanding the rule's RFC 5545 form with the `rrule`
//! crate and projecting each occurrence through [`expand_on`].

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;
use tracing::warn;

use crate::dst::{resolve_local, resolve_local_lenient, DstPolicy};
use crate::error::{EngineError, Result};
use crate::interval::DateInterval;
use crate::rule::{weekday_number, RecurringRule, RuleKind};

/// Hard cap on occurrences produced by [`expand_between`] (ten years of weeks).
const MAX_RANGE_OCCURRENCES: u16 = 522;

/// Project `rule` onto `date` in the provider's timezone.
///
/// Returns `None` when the rule is inactive, falls on another weekday, has
/// expired (`date > valid_until`), or cannot produce an interval on that date:
/// unparseable `"HH:mm"` strings, an end not after the start, or (under
/// [`DstPolicy::Skip`]) a local time that does not exist. A corrupt rule only
/// removes itself from the calculation.
pub fn expand_on(
    rule: &RecurringRule,
    date: NaiveDate,
    tz: Tz,
    policy: DstPolicy,
) -> Option<DateInterval> {
    if !rule.is_active {
        return None;
    }
    if rule.day_of_week != weekday_number(date.weekday()) {
        return None;
    }
    if !rule.applies_through(date) {
        return None;
    }

    let (start, end) = match rule.times() {
        Ok(times) => times,
        Err(e) => {
            warn!(
                day_of_week = rule.day_of_week,
                "skipping recurring rule: {e}"
            );
            return None;
        }
    };
    if end <= start {
        warn!(
            day_of_week = rule.day_of_week,
            "skipping recurring rule: end {end} is not after start {start}"
        );
        return None;
    }

    let start = resolve_local(tz, date.and_time(start.to_naive()?), policy)?;
    let end = match end.to_naive() {
        Some(t) => resolve_local(tz, date.and_time(t), policy)?,
        None => resolve_local_lenient(tz, date.succ_opt()?.and_time(NaiveTime::MIN)),
    };

    DateInterval::new(start, end).filter(|i| !i.is_empty())
}

/// Expand every rule of `kind` that applies on `date`.
pub fn expand_all_on(
    rules: &[RecurringRule],
    kind: RuleKind,
    date: NaiveDate,
    tz: Tz,
    policy: DstPolicy,
) -> Vec<DateInterval> {
    rules
        .iter()
        .filter(|r| r.kind == kind)
        .filter_map(|r| expand_on(r, date, tz, policy))
        .collect()
}

/// Expand `rule` over every date in `[from, to]` (inclusive).
///
/// The recurrence is bounded by the earlier of `to` and the rule's
/// `valid_until`. Dates on which [`expand_on`] yields nothing are omitted.
///
/// # Errors
/// Returns `EngineError::InvalidWeekday` if the rule's weekday number is out of
/// range, or `EngineError::InvalidRule` if the generated RRULE is rejected.
pub fn expand_between(
    rule: &RecurringRule,
    from: NaiveDate,
    to: NaiveDate,
    tz: Tz,
    policy: DstPolicy,
) -> Result<Vec<DateInterval>> {
    let rrule = rule.to_rrule()?;

    // The rule's own expiry wins over a later range end.
    let last = match rule.valid_until {
        Some(until) => to.min(until),
        None => to,
    };
    if !rule.is_active || from > last {
        return Ok(Vec::new());
    }

    // Anchor at midnight UTC of `from`; only the occurrence dates are used,
    // the local window is applied per date by `expand_on`.
    let rrule_text = format!(
        "DTSTART:{}T000000Z\nRRULE:{};UNTIL={}T000000Z",
        from.format("%Y%m%d"),
        rrule,
        last.format("%Y%m%d"),
    );
    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| EngineError::InvalidRule(format!("{}", e)))?;

    // One occurrence per week at most, plus one for a partial first week.
    let span_weeks = (last - from).num_weeks() + 1;
    let limit = u16::try_from(span_weeks)
        .unwrap_or(MAX_RANGE_OCCURRENCES)
        .min(MAX_RANGE_OCCURRENCES);

    let dates = rrule_set.all(limit).dates;
    Ok(dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .filter_map(|date| expand_on(rule, date, tz, policy))
        .collect())
}

/// Local `"HH:mm"` label of an instant in the provider's timezone.
pub fn local_label(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%H:%M").to_string()
}
