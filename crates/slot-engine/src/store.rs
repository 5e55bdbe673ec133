//! The data-access collaborator the aggregator fetches from.
//!
//! The engine owns no storage. A [`RuleStore`] is injected by the caller; any
//! retry policy lives behind it. [`MemoryStore`] is a ready-made in-memory
//! implementation for tests, fixtures and the CLI.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::interval::DateInterval;
use crate::rule::{Booking, OneOffException, ProviderId, RecurringRule, RuleKind};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Async, independently fallible access to a provider's scheduling records.
///
/// Range arguments are closed: a record touching either boundary is returned.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Active recurring rules of the provider, unfiltered by date.
    async fn recurring_rules(&self, provider: &ProviderId) -> StoreResult<Vec<RecurringRule>>;

    /// One-off availability exceptions intersecting `range`.
    async fn one_off_available(
        &self,
        provider: &ProviderId,
        range: DateInterval,
    ) -> StoreResult<Vec<OneOffException>>;

    /// One-off blocked intervals intersecting `range`.
    async fn one_off_blocked(
        &self,
        provider: &ProviderId,
        range: DateInterval,
    ) -> StoreResult<Vec<OneOffException>>;

    /// Bookings of the provider intersecting `range`.
    async fn bookings(
        &self,
        provider: &ProviderId,
        range: DateInterval,
    ) -> StoreResult<Vec<Booking>>;
}

/// Records of a single provider, as loaded from a fixture or test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderRecords {
    pub recurring_rules: Vec<RecurringRule>,
    pub exceptions: Vec<OneOffException>,
    pub bookings: Vec<Booking>,
}

/// One of the four record sets the aggregator fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    RecurringRules,
    OneOffAvailable,
    OneOffBlocked,
    Bookings,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Source::RecurringRules => "recurring rules",
            Source::OneOffAvailable => "one-off availability",
            Source::OneOffBlocked => "one-off blocks",
            Source::Bookings => "bookings",
        };
        f.write_str(name)
    }
}

/// In-memory [`RuleStore`] over one provider's records.
///
/// Individual sources can be switched to failing to exercise degraded
/// aggregation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    provider: ProviderId,
    records: ProviderRecords,
    failing: Mutex<HashSet<Source>>,
}

impl MemoryStore {
    pub fn new(provider: ProviderId, records: ProviderRecords) -> Self {
        Self {
            provider,
            records,
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make every subsequent fetch of `source` fail with `StoreError::Unavailable`.
    pub fn fail(&self, source: Source) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(source);
        }
    }

    fn check(&self, source: Source, provider: &ProviderId) -> StoreResult<bool> {
        let failing = self
            .failing
            .lock()
            .map(|f| f.contains(&source))
            .unwrap_or(false);
        if failing {
            return Err(StoreError::Unavailable(format!("{source} offline")));
        }
        Ok(*provider == self.provider)
    }

    fn exceptions(&self, kind: RuleKind, range: DateInterval) -> Vec<OneOffException> {
        self.records
            .exceptions
            .iter()
            .filter(|e| e.kind == kind)
            .filter(|e| e.interval().is_some_and(|i| i.touches(&range)))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn recurring_rules(&self, provider: &ProviderId) -> StoreResult<Vec<RecurringRule>> {
        if !self.check(Source::RecurringRules, provider)? {
            return Ok(Vec::new());
        }
        Ok(self
            .records
            .recurring_rules
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }

    async fn one_off_available(
        &self,
        provider: &ProviderId,
        range: DateInterval,
    ) -> StoreResult<Vec<OneOffException>> {
        if !self.check(Source::OneOffAvailable, provider)? {
            return Ok(Vec::new());
        }
        Ok(self.exceptions(RuleKind::Available, range))
    }

    async fn one_off_blocked(
        &self,
        provider: &ProviderId,
        range: DateInterval,
    ) -> StoreResult<Vec<OneOffException>> {
        if !self.check(Source::OneOffBlocked, provider)? {
            return Ok(Vec::new());
        }
        Ok(self.exceptions(RuleKind::Blocked, range))
    }

    async fn bookings(
        &self,
        provider: &ProviderId,
        range: DateInterval,
    ) -> StoreResult<Vec<Booking>> {
        if !self.check(Source::Bookings, provider)? {
            return Ok(Vec::new());
        }
        Ok(self
            .records
            .bookings
            .iter()
            .filter(|b| b.provider_id == *provider)
            .filter(|b| range.start <= b.scheduled_at && b.scheduled_at <= range.end)
            .cloned()
            .collect())
    }
}
