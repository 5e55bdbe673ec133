//! Tests for merging declared availability, blocks and bookings.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc, Weekday};
use slot_engine::{
    resolve, Aggregation, Booking, BookingStatus, DateInterval, EngineConfig, OneOffException,
    ProviderId, RecurringRule, ResolverInput, RuleKind, TimeOfDay,
};

fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
}

fn interval(d: u32, sh: u32, eh: u32) -> DateInterval {
    DateInterval::new(at(d, sh, 0), at(d, eh, 0)).unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

fn rule(day: Weekday, start: &str, end: &str, kind: RuleKind) -> RecurringRule {
    RecurringRule::weekly(
        day,
        TimeOfDay::parse(start).unwrap(),
        TimeOfDay::parse(end).unwrap(),
        kind,
    )
}

fn exception(start: DateTime<Utc>, end: DateTime<Utc>, kind: RuleKind) -> OneOffException {
    OneOffException {
        start,
        end,
        kind,
        reason: None,
    }
}

fn booking(at: DateTime<Utc>, status: BookingStatus) -> Booking {
    Booking {
        provider_id: ProviderId::new("p1"),
        scheduled_at: at,
        status,
    }
}

fn narrow(aggregation: &Aggregation) -> ResolverInput {
    let config = EngineConfig::default();
    ResolverInput::narrow(aggregation, monday(), chrono_tz::UTC, &config)
}

#[test]
fn free_is_union_of_recurring_and_one_off_availability() {
    let input = ResolverInput {
        recurring_available: vec![interval(16, 9, 12)],
        one_off_available: vec![interval(16, 11, 14)],
        ..Default::default()
    };
    let resolution = resolve(&input);
    assert_eq!(
        resolution.free,
        vec![interval(16, 9, 12), interval(16, 11, 14)]
    );
    assert!(resolution.busy.is_empty());
}

#[test]
fn busy_is_union_of_blocks_and_occupancy() {
    let input = ResolverInput {
        recurring_available: vec![interval(16, 9, 17)],
        recurring_blocked: vec![interval(16, 12, 13)],
        one_off_blocked: vec![interval(16, 15, 16)],
        occupancy: vec![interval(16, 10, 11)],
        ..Default::default()
    };
    let resolution = resolve(&input);
    assert_eq!(resolution.free, vec![interval(16, 9, 17)]);
    assert_eq!(
        resolution.busy,
        vec![
            interval(16, 12, 13),
            interval(16, 15, 16),
            interval(16, 10, 11),
        ]
    );
}

#[test]
fn no_declared_availability_means_no_free_time() {
    let input = ResolverInput {
        recurring_blocked: vec![interval(16, 12, 13)],
        ..Default::default()
    };
    let resolution = resolve(&input);
    assert!(resolution.free.is_empty());
    assert!(!resolution.has_availability());
}

#[test]
fn narrow_expands_rules_by_kind_for_the_date() {
    let aggregation = Aggregation {
        recurring_rules: vec![
            rule(Weekday::Mon, "09:00", "17:00", RuleKind::Available),
            rule(Weekday::Mon, "12:00", "13:00", RuleKind::Blocked),
            rule(Weekday::Tue, "09:00", "17:00", RuleKind::Available),
        ],
        ..Default::default()
    };
    let input = narrow(&aggregation);
    assert_eq!(input.recurring_available, vec![interval(16, 9, 17)]);
    assert_eq!(input.recurring_blocked, vec![interval(16, 12, 13)]);
}

#[test]
fn narrow_keeps_only_records_overlapping_the_day() {
    let aggregation = Aggregation {
        one_off_available: vec![
            exception(at(16, 18, 0), at(16, 20, 0), RuleKind::Available),
            exception(at(17, 9, 0), at(17, 10, 0), RuleKind::Available),
        ],
        one_off_blocked: vec![
            exception(at(15, 9, 0), at(15, 10, 0), RuleKind::Blocked),
            exception(at(16, 19, 0), at(16, 20, 0), RuleKind::Blocked),
        ],
        ..Default::default()
    };
    let input = narrow(&aggregation);
    assert_eq!(input.one_off_available, vec![interval(16, 18, 20)]);
    assert_eq!(input.one_off_blocked, vec![interval(16, 19, 20)]);
}

#[test]
fn narrow_ignores_exceptions_of_the_wrong_kind() {
    // A blocked record showing up in the availability source must not open time.
    let aggregation = Aggregation {
        one_off_available: vec![exception(at(16, 9, 0), at(16, 10, 0), RuleKind::Blocked)],
        ..Default::default()
    };
    assert!(narrow(&aggregation).one_off_available.is_empty());
}

#[test]
fn narrow_turns_bookings_into_one_hour_occupancy() {
    let aggregation = Aggregation {
        bookings: vec![
            booking(at(16, 13, 0), BookingStatus::Accepted),
            booking(at(16, 15, 0), BookingStatus::Requested),
        ],
        ..Default::default()
    };
    let input = narrow(&aggregation);
    assert_eq!(
        input.occupancy,
        vec![interval(16, 13, 14), interval(16, 15, 16)]
    );
    assert_eq!(input.occupancy[0].duration(), Duration::hours(1));
}

#[test]
fn cancelled_and_rejected_bookings_do_not_occupy() {
    let aggregation = Aggregation {
        bookings: vec![
            booking(at(16, 10, 0), BookingStatus::Cancelled),
            booking(at(16, 11, 0), BookingStatus::Rejected),
            booking(at(16, 12, 0), BookingStatus::Completed),
        ],
        ..Default::default()
    };
    assert_eq!(narrow(&aggregation).occupancy, vec![interval(16, 12, 13)]);
}

#[test]
fn booking_from_previous_evening_spills_into_the_day() {
    let aggregation = Aggregation {
        bookings: vec![booking(at(15, 23, 30), BookingStatus::Accepted)],
        ..Default::default()
    };
    let input = narrow(&aggregation);
    assert_eq!(input.occupancy.len(), 1);
    assert_eq!(input.occupancy[0].end, at(16, 0, 30));
}
