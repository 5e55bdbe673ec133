//! Concurrent retrieval of the four record sets a slot query needs.
//!
//! The fetches are fanned out together and joined once all four have
//! reported. A failing source contributes an empty collection plus a
//! [`SourceFailure`] diagnostic; it never aborts the other three. Results are
//! handed over only if the query's cancellation token is still live once the
//! join completes, so late results of a superseded query are dropped.

use chrono::Duration;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::interval::DateInterval;
use crate::rule::{Booking, OneOffException, ProviderId, RecurringRule};
use crate::store::{RuleStore, Source, StoreResult};

/// A source that failed during aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: Source,
    #[serde(serialize_with = "serialize_error")]
    pub error: StoreError,
}

fn serialize_error<S: serde::Serializer>(
    error: &StoreError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// The joined result of one aggregation, owned by the query that issued it.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub recurring_rules: Vec<RecurringRule>,
    pub one_off_available: Vec<OneOffException>,
    pub one_off_blocked: Vec<OneOffException>,
    pub bookings: Vec<Booking>,
    /// Sources that were replaced by an empty collection.
    pub failures: Vec<SourceFailure>,
}

impl Aggregation {
    /// True when every source failed, i.e. the result carries no data at all.
    pub fn all_failed(&self) -> bool {
        self.failures.len() == 4
    }
}

/// Fetch all four sources for `provider` over `range` concurrently.
///
/// Bookings are requested from `booking_length` before `range.start`, so a
/// booking that starts before the range but runs into it is still seen.
///
/// Returns `None` if `cancel` fires before or during the fetch; in that case
/// nothing fetched is returned to the caller.
pub async fn aggregate<S>(
    store: &S,
    provider: &ProviderId,
    range: DateInterval,
    booking_length: Duration,
    cancel: &CancellationToken,
) -> Option<Aggregation>
where
    S: RuleStore + ?Sized,
{
    // A booking that began up to one length before the range still overlaps it.
    let booking_range = DateInterval {
        start: range.start - booking_length,
        end: range.end,
    };

    let fan_out = async {
        tokio::join!(
            store.recurring_rules(provider),
            store.one_off_available(provider, range),
            store.one_off_blocked(provider, range),
            store.bookings(provider, booking_range),
        )
    };

    let (rules, available, blocked, bookings) = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(%provider, "aggregation cancelled before fan-in");
            return None;
        }
        joined = fan_out => joined,
    };

    // The token may have fired between the last fetch completing and here.
    if cancel.is_cancelled() {
        debug!(%provider, "discarding results of superseded aggregation");
        return None;
    }

    let mut failures = Vec::new();
    let aggregation = Aggregation {
        recurring_rules: degrade(Source::RecurringRules, rules, &mut failures),
        one_off_available: degrade(Source::OneOffAvailable, available, &mut failures),
        one_off_blocked: degrade(Source::OneOffBlocked, blocked, &mut failures),
        bookings: degrade(Source::Bookings, bookings, &mut failures),
        failures,
    };

    debug!(
        %provider,
        rules = aggregation.recurring_rules.len(),
        one_off_available = aggregation.one_off_available.len(),
        one_off_blocked = aggregation.one_off_blocked.len(),
        bookings = aggregation.bookings.len(),
        failed = aggregation.failures.len(),
        "aggregation joined"
    );

    Some(aggregation)
}

/// Substitute an empty collection for a failed source and record why.
fn degrade<T>(
    source: Source,
    result: StoreResult<Vec<T>>,
    failures: &mut Vec<SourceFailure>,
) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(error) => {
            warn!(%source, %error, "source fetch failed; treating as empty");
            failures.push(SourceFailure { source, error });
            Vec::new()
        }
    }
}
