//! The caller-facing engine: slots and entry ceilings for a provider and date.
//!
//! [`SlotEngine`] wires the aggregator, resolver, slot generator and
//! max-duration calculator together over an injected [`RuleStore`]. Queries
//! issued through a [`QueryScope`] supersede each other: starting a new one
//! cancels the previous one, whose results are then dropped instead of being
//! returned.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::aggregator::{aggregate, SourceFailure};
use crate::config::{EngineConfig, Horizon};
use crate::dst::resolve_local_lenient;
use crate::duration::max_duration_hours;
use crate::error::Result;
use crate::interval::day_bounds;
use crate::resolver::{resolve, Resolution, ResolverInput};
use crate::rule::{ProviderId, TimeOfDay};
use crate::slots::{generate_slots, slot_labels, ResolvedSlot};
use crate::store::RuleStore;

/// Result of a query issued through a [`QueryScope`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<T> {
    Complete(T),
    /// A newer query in the same scope started before this one finished.
    Superseded,
}

impl<T> QueryOutcome<T> {
    pub fn complete(self) -> Option<T> {
        match self {
            QueryOutcome::Complete(value) => Some(value),
            QueryOutcome::Superseded => None,
        }
    }
}

/// Tracks the single live query of one caller context (e.g. a date picker).
#[derive(Debug, Default)]
pub struct QueryScope {
    current: Mutex<CancellationToken>,
}

impl QueryScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new query, cancelling whichever one was live.
    pub fn begin(&self) -> CancellationToken {
        let next = CancellationToken::new();
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *current, next.clone());
        previous.cancel();
        next
    }

    /// Abandon the live query without starting another.
    pub fn cancel(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

/// Slots offered on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotReport {
    pub date: NaiveDate,
    pub slots: Vec<ResolvedSlot>,
    /// Slot starts as local `"HH:mm"`, in slot order.
    pub labels: Vec<String>,
    pub failures: Vec<SourceFailure>,
}

impl SlotReport {
    /// True when no source could be read, so an empty slot list means
    /// "unknown" rather than "fully booked".
    pub fn all_sources_failed(&self) -> bool {
        self.failures.len() == 4
    }
}

/// Longest entry a provider may create from a given start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationReport {
    pub hours: u32,
    pub failures: Vec<SourceFailure>,
}

pub struct SlotEngine<S> {
    store: S,
    config: EngineConfig,
    tz: Tz,
}

impl<S: RuleStore> SlotEngine<S> {
    /// # Errors
    /// Returns the configuration's validation error, e.g.
    /// `EngineError::InvalidTimezone`.
    pub fn new(store: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let tz = config.tz()?;
        Ok(Self { store, config, tz })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Aggregate and resolve one day; `None` if `cancel` fired first.
    pub async fn resolve_day(
        &self,
        provider: &ProviderId,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Option<(Resolution, Vec<SourceFailure>)> {
        let day = day_bounds(date, self.tz);
        let aggregation = aggregate(
            &self.store,
            provider,
            day,
            self.config.booking_duration(),
            cancel,
        )
        .await?;

        let input = ResolverInput::narrow(&aggregation, date, self.tz, &self.config);
        Some((resolve(&input), aggregation.failures))
    }

    /// Bookable slots for `provider` on `date`.
    pub async fn compute_slots(&self, provider: &ProviderId, date: NaiveDate) -> SlotReport {
        let cancel = CancellationToken::new();
        match self.slots_with(provider, date, &cancel).await {
            Some(report) => report,
            None => SlotReport {
                date,
                slots: Vec::new(),
                labels: Vec::new(),
                failures: Vec::new(),
            },
        }
    }

    /// Like [`compute_slots`](Self::compute_slots), superseding the scope's
    /// previous query.
    pub async fn compute_slots_in(
        &self,
        scope: &QueryScope,
        provider: &ProviderId,
        date: NaiveDate,
    ) -> QueryOutcome<SlotReport> {
        let cancel = scope.begin();
        match self.slots_with(provider, date, &cancel).await {
            Some(report) if !cancel.is_cancelled() => QueryOutcome::Complete(report),
            _ => {
                debug!(%provider, %date, "slot query superseded");
                QueryOutcome::Superseded
            }
        }
    }

    /// Ceiling in whole hours for a new entry starting at `candidate` on `date`.
    ///
    /// A `24:00` candidate is the end of the day and always gets 0.
    pub async fn compute_max_duration(
        &self,
        provider: &ProviderId,
        date: NaiveDate,
        candidate: TimeOfDay,
    ) -> DurationReport {
        let cancel = CancellationToken::new();
        match self
            .max_duration_with(provider, date, candidate, &cancel)
            .await
        {
            Some(report) => report,
            None => DurationReport {
                hours: 0,
                failures: Vec::new(),
            },
        }
    }

    /// Like [`compute_max_duration`](Self::compute_max_duration), superseding
    /// the scope's previous query.
    pub async fn compute_max_duration_in(
        &self,
        scope: &QueryScope,
        provider: &ProviderId,
        date: NaiveDate,
        candidate: TimeOfDay,
    ) -> QueryOutcome<DurationReport> {
        let cancel = scope.begin();
        match self
            .max_duration_with(provider, date, candidate, &cancel)
            .await
        {
            Some(report) if !cancel.is_cancelled() => QueryOutcome::Complete(report),
            _ => {
                debug!(%provider, %date, "max-duration query superseded");
                QueryOutcome::Superseded
            }
        }
    }

    async fn slots_with(
        &self,
        provider: &ProviderId,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Option<SlotReport> {
        let (resolution, failures) = self.resolve_day(provider, date, cancel).await?;
        let day = day_bounds(date, self.tz);
        let slots = generate_slots(
            &resolution.free,
            &resolution.busy,
            self.config.slot_duration(),
            day,
        );
        let labels = slot_labels(&slots, self.tz);
        Some(SlotReport {
            date,
            slots,
            labels,
            failures,
        })
    }

    async fn max_duration_with(
        &self,
        provider: &ProviderId,
        date: NaiveDate,
        candidate: TimeOfDay,
        cancel: &CancellationToken,
    ) -> Option<DurationReport> {
        let (resolution, failures) = self.resolve_day(provider, date, cancel).await?;
        let day = day_bounds(date, self.tz);

        // 24:00 starts on the next day; nothing fits before the day ends.
        let Some(time) = candidate.to_naive() else {
            return Some(DurationReport { hours: 0, failures });
        };
        let start = resolve_local_lenient(self.tz, date.and_time(time));
        let horizon_end = match self.config.horizon {
            Horizon::EndOfDay => day.end,
            Horizon::Hours(h) => start
                .checked_add_signed(Duration::hours(i64::from(h)))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let hours = max_duration_hours(
            start,
            &resolution.busy,
            horizon_end,
            self.config.policy_max_hours,
        );
        Some(DurationReport { hours, failures })
    }
}
