//! Merge declared availability, blocks and bookings into free and busy sets.
//!
//! Availability must be declared: a day with no available intervals has no
//! free time no matter what else is on the calendar. Blocks and bookings are
//! never subtracted geometrically here; they are collected into the busy set
//! and checked per slot candidate, so slots stay aligned to the start of the
//! declared window.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::aggregator::Aggregation;
use crate::config::EngineConfig;
use crate::expander::expand_all_on;
use crate::interval::{day_bounds, DateInterval};
use crate::rule::{OneOffException, RuleKind};

/// Every interval source, already narrowed to one query date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverInput {
    pub recurring_available: Vec<DateInterval>,
    pub one_off_available: Vec<DateInterval>,
    pub recurring_blocked: Vec<DateInterval>,
    pub one_off_blocked: Vec<DateInterval>,
    pub occupancy: Vec<DateInterval>,
}

impl ResolverInput {
    /// Narrow an aggregation to `date` in the provider's timezone.
    ///
    /// Recurring rules are expanded for the date; one-off exceptions and
    /// bookings are kept only if they overlap the local calendar day. One-off
    /// records are filtered by their own kind, so a store returning mixed
    /// records cannot turn a block into availability.
    pub fn narrow(
        aggregation: &Aggregation,
        date: NaiveDate,
        tz: Tz,
        config: &EngineConfig,
    ) -> Self {
        let day = day_bounds(date, tz);
        let policy = config.dst_policy;

        let one_off = |records: &[OneOffException], kind: RuleKind| -> Vec<DateInterval> {
            records
                .iter()
                .filter(|e| e.kind == kind)
                .filter_map(OneOffException::interval)
                .filter(|i| i.intersects(&day))
                .collect()
        };

        let booking_length = config.booking_duration();
        let occupancy = aggregation
            .bookings
            .iter()
            .filter_map(|b| b.occupancy(booking_length))
            .filter(|i| i.intersects(&day))
            .collect();

        Self {
            recurring_available: expand_all_on(
                &aggregation.recurring_rules,
                RuleKind::Available,
                date,
                tz,
                policy,
            ),
            one_off_available: one_off(&aggregation.one_off_available, RuleKind::Available),
            recurring_blocked: expand_all_on(
                &aggregation.recurring_rules,
                RuleKind::Blocked,
                date,
                tz,
                policy,
            ),
            one_off_blocked: one_off(&aggregation.one_off_blocked, RuleKind::Blocked),
            occupancy,
        }
    }
}

/// Free and busy interval sets for one query date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Declared availability, recurring and one-off, in input order.
    pub free: Vec<DateInterval>,
    /// Recurring blocks, one-off blocks and booking occupancy.
    pub busy: Vec<DateInterval>,
}

impl Resolution {
    pub fn has_availability(&self) -> bool {
        self.free.iter().any(|i| !i.is_empty())
    }
}

/// Combine the narrowed sources into free and busy sets.
pub fn resolve(input: &ResolverInput) -> Resolution {
    let free = input
        .recurring_available
        .iter()
        .chain(&input.one_off_available)
        .copied()
        .collect();

    let busy = input
        .recurring_blocked
        .iter()
        .chain(&input.one_off_blocked)
        .chain(&input.occupancy)
        .copied()
        .collect();

    Resolution { free, busy }
}
