//! Tests for the concurrent four-source aggregation.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc, Weekday};
use slot_engine::store::StoreResult;
use slot_engine::{
    aggregate, day_bounds, Booking, BookingStatus, DateInterval, MemoryStore, OneOffException,
    ProviderId, ProviderRecords, RecurringRule, RuleKind, RuleStore, Source, StoreError,
    TimeOfDay,
};
use tokio_util::sync::CancellationToken;

fn provider() -> ProviderId {
    ProviderId::new("provider-1")
}

fn day() -> DateInterval {
    let date = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
    day_bounds(date, chrono_tz::UTC)
}

fn records() -> ProviderRecords {
    ProviderRecords {
        recurring_rules: vec![
            RecurringRule::weekly(
                Weekday::Mon,
                TimeOfDay::parse("09:00").unwrap(),
                TimeOfDay::parse("17:00").unwrap(),
                RuleKind::Available,
            ),
            RecurringRule::weekly(
                Weekday::Tue,
                TimeOfDay::parse("09:00").unwrap(),
                TimeOfDay::parse("17:00").unwrap(),
                RuleKind::Available,
            )
            .inactive(),
        ],
        exceptions: vec![
            OneOffException {
                start: Utc.with_ymd_and_hms(2026, 3, 16, 18, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2026, 3, 16, 20, 0, 0).unwrap(),
                kind: RuleKind::Available,
                reason: Some("late shift".to_string()),
            },
            OneOffException {
                start: Utc.with_ymd_and_hms(2026, 3, 16, 12, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2026, 3, 16, 13, 0, 0).unwrap(),
                kind: RuleKind::Blocked,
                reason: None,
            },
            OneOffException {
                start: Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2026, 3, 20, 13, 0, 0).unwrap(),
                kind: RuleKind::Blocked,
                reason: None,
            },
        ],
        bookings: vec![
            Booking {
                provider_id: provider(),
                scheduled_at: Utc.with_ymd_and_hms(2026, 3, 16, 14, 0, 0).unwrap(),
                status: BookingStatus::Accepted,
            },
            Booking {
                provider_id: ProviderId::new("someone-else"),
                scheduled_at: Utc.with_ymd_and_hms(2026, 3, 16, 10, 0, 0).unwrap(),
                status: BookingStatus::Accepted,
            },
        ],
    }
}

#[tokio::test]
async fn all_sources_succeed() {
    let store = MemoryStore::new(provider(), records());
    let cancel = CancellationToken::new();

    let aggregation = aggregate(&store, &provider(), day(), Duration::hours(1), &cancel)
        .await
        .expect("live query should produce results");

    // Inactive rules, blocks on other days and other providers' bookings are
    // left out by the store.
    assert_eq!(aggregation.recurring_rules.len(), 1);
    assert_eq!(aggregation.one_off_available.len(), 1);
    assert_eq!(aggregation.one_off_blocked.len(), 1);
    assert_eq!(aggregation.bookings.len(), 1);
    assert!(aggregation.failures.is_empty());
    assert!(!aggregation.all_failed());
}

#[tokio::test]
async fn failed_source_degrades_to_empty() {
    let store = MemoryStore::new(provider(), records());
    store.fail(Source::Bookings);
    let cancel = CancellationToken::new();

    let aggregation = aggregate(&store, &provider(), day(), Duration::hours(1), &cancel)
        .await
        .unwrap();

    assert!(aggregation.bookings.is_empty());
    assert_eq!(aggregation.recurring_rules.len(), 1);
    assert_eq!(aggregation.one_off_available.len(), 1);
    assert_eq!(aggregation.one_off_blocked.len(), 1);
    assert_eq!(aggregation.failures.len(), 1);
    assert_eq!(aggregation.failures[0].source, Source::Bookings);
    assert!(matches!(aggregation.failures[0].error, StoreError::Unavailable(_)));
}

#[tokio::test]
async fn every_source_failing_still_joins() {
    let store = MemoryStore::new(provider(), records());
    for source in [
        Source::RecurringRules,
        Source::OneOffAvailable,
        Source::OneOffBlocked,
        Source::Bookings,
    ] {
        store.fail(source);
    }
    let cancel = CancellationToken::new();

    let aggregation = aggregate(&store, &provider(), day(), Duration::hours(1), &cancel)
        .await
        .unwrap();

    assert!(aggregation.all_failed());
    assert!(aggregation.recurring_rules.is_empty());
    assert!(aggregation.bookings.is_empty());
}

#[tokio::test]
async fn cancelled_before_start_returns_nothing() {
    let store = MemoryStore::new(provider(), records());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = aggregate(&store, &provider(), day(), Duration::hours(1), &cancel).await;

    assert!(result.is_none());
}

/// Store whose booking fetch supersedes the query while it is in flight and
/// counts how many fetches were issued.
struct SupersedingStore {
    inner: MemoryStore,
    cancel: CancellationToken,
    calls: AtomicUsize,
}

#[async_trait]
impl RuleStore for SupersedingStore {
    async fn recurring_rules(&self, provider: &ProviderId) -> StoreResult<Vec<RecurringRule>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.recurring_rules(provider).await
    }

    async fn one_off_available(
        &self,
        provider: &ProviderId,
        range: DateInterval,
    ) -> StoreResult<Vec<OneOffException>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.one_off_available(provider, range).await
    }

    async fn one_off_blocked(
        &self,
        provider: &ProviderId,
        range: DateInterval,
    ) -> StoreResult<Vec<OneOffException>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.one_off_blocked(provider, range).await
    }

    async fn bookings(
        &self,
        provider: &ProviderId,
        range: DateInterval,
    ) -> StoreResult<Vec<Booking>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.inner.bookings(provider, range).await;
        self.cancel.cancel();
        result
    }
}

#[tokio::test]
async fn results_arriving_after_supersession_are_discarded() {
    let cancel = CancellationToken::new();
    let store = SupersedingStore {
        inner: MemoryStore::new(provider(), records()),
        cancel: cancel.clone(),
        calls: AtomicUsize::new(0),
    };

    let result = aggregate(&store, &provider(), day(), Duration::hours(1), &cancel).await;

    assert!(result.is_none());
    // All four fetches were issued before the results were dropped.
    assert_eq!(store.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn booking_range_reaches_back_by_booking_length() {
    let mut recs = records();
    recs.bookings.push(Booking {
        provider_id: provider(),
        scheduled_at: Utc.with_ymd_and_hms(2026, 3, 15, 23, 30, 0).unwrap(),
        status: BookingStatus::Accepted,
    });
    let store = MemoryStore::new(provider(), recs);
    let cancel = CancellationToken::new();

    let aggregation = aggregate(&store, &provider(), day(), Duration::hours(1), &cancel)
        .await
        .unwrap();

    assert_eq!(aggregation.bookings.len(), 2);
}
