//! Tests for the half-open interval primitive and local day bounds.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use slot_engine::{day_bounds, DateInterval};

/// Helper to create an interval from hour/minute ranges on 2026-03-16.
fn interval(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> DateInterval {
    DateInterval::new(at(start_hour, start_min), at(end_hour, end_min)).unwrap()
}

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, hour, min, 0).unwrap()
}

#[test]
fn overlapping_intervals_intersect() {
    let a = interval(9, 0, 10, 0);
    let b = interval(9, 30, 10, 30);
    assert!(a.intersects(&b));
    assert!(b.intersects(&a));
    assert_eq!(a.intersection(&b), Some(interval(9, 30, 10, 0)));
}

#[test]
fn touching_intervals_do_not_intersect() {
    // 09:00-10:00 and 10:00-11:00 are back to back, not conflicting.
    let a = interval(9, 0, 10, 0);
    let b = interval(10, 0, 11, 0);
    assert!(!a.intersects(&b));
    assert!(!b.intersects(&a));
    assert_eq!(a.intersection(&b), None);
    // The closed-range test still sees them as touching.
    assert!(a.touches(&b));
}

#[test]
fn contained_interval_intersects() {
    let outer = interval(9, 0, 17, 0);
    let inner = interval(12, 0, 13, 0);
    assert!(outer.intersects(&inner));
    assert!(inner.intersects(&outer));
}

#[test]
fn zero_length_interval_never_intersects() {
    let point = interval(12, 0, 12, 0);
    let day = interval(0, 0, 23, 0);
    assert!(point.is_empty());
    assert!(!point.intersects(&day));
    assert!(!day.intersects(&point));
    assert!(!point.intersects(&point));
}

#[test]
fn end_before_start_is_rejected() {
    let start = Utc.with_ymd_and_hms(2026, 3, 16, 10, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();
    assert!(DateInterval::new(start, end).is_none());
}

#[test]
fn duration_is_end_minus_start() {
    assert_eq!(interval(9, 0, 17, 0).duration(), Duration::hours(8));
    assert_eq!(interval(9, 15, 9, 45).duration(), Duration::minutes(30));
}

#[test]
fn contains_instant_is_half_open() {
    let i = interval(9, 0, 10, 0);
    assert!(i.contains_instant(at(9, 0)));
    assert!(i.contains_instant(at(9, 59)));
    assert!(!i.contains_instant(at(10, 0)));
}

#[test]
fn utc_day_bounds_span_24_hours() {
    let date = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
    let day = day_bounds(date, chrono_tz::UTC);
    assert_eq!(day.start, at(0, 0));
    assert_eq!(day.end, at(0, 0) + Duration::days(1));
}

#[test]
fn spring_forward_day_is_23_hours() {
    // America/New_York moves to EDT on 2026-03-08.
    let day = day_bounds(
        NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
        chrono_tz::America::New_York,
    );
    // Local midnight is still EST (UTC-5).
    assert_eq!(day.start.hour(), 5);
    assert_eq!(day.duration(), Duration::hours(23));
}

#[test]
fn fall_back_day_is_25_hours() {
    // America/New_York returns to EST on 2026-11-01.
    let day = day_bounds(
        NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
        chrono_tz::America::New_York,
    );
    assert_eq!(day.duration(), Duration::hours(25));
}
