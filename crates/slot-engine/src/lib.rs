//! # slot-engine
//!
//! Bookable slot computation for service providers.
//!
//! For a provider and a calendar date, the engine computes the time slots that
//! are declared available (weekly recurring rules or one-off exceptions), not
//! blocked (recurring or one-off), and not already taken by a booking. It also
//! computes how long a new provider-authored entry may run from a given start.
//!
//! The engine owns no storage: records come from an injected
//! [`RuleStore`](store::RuleStore), fetched concurrently and tolerating the
//! failure of any individual source.
//!
//! ## Modules
//!
//! - [`interval`] — Half-open date-time intervals and local day bounds
//! - [`rule`] — Recurring rules, one-off exceptions, bookings, typed times
//! - [`dst`] — DST transition policies for local wall-clock times
//! - [`expander`] — Recurring rule → concrete interval for a date or range
//! - [`store`] — The data-access collaborator trait and an in-memory store
//! - [`aggregator`] — Concurrent fan-out/fan-in over the four record sets
//! - [`resolver`] — Merge sources into free and busy interval sets
//! - [`slots`] — Slice free time into fixed-length bookable slots
//! - [`duration`] — Ceiling and validation for new entries
//! - [`config`] — Engine configuration
//! - [`engine`] — `compute_slots` / `compute_max_duration` with supersession
//! - [`error`] — Error types

pub mod aggregator;
pub mod config;
pub mod dst;
pub mod duration;
pub mod engine;
pub mod error;
pub mod expander;
pub mod interval;
pub mod resolver;
pub mod rule;
pub mod slots;
pub mod store;

pub use aggregator::{aggregate, Aggregation, SourceFailure};
pub use config::{EngineConfig, Horizon};
pub use dst::DstPolicy;
pub use duration::{max_duration_hours, validate_entry};
pub use engine::{DurationReport, QueryOutcome, QueryScope, SlotEngine, SlotReport};
pub use error::{EngineError, StoreError};
pub use expander::{expand_between, expand_on};
pub use interval::{day_bounds, DateInterval};
pub use resolver::{resolve, Resolution, ResolverInput};
pub use rule::{
    Booking, BookingStatus, OneOffException, ProviderId, RecurringRule, RuleKind, TimeOfDay,
};
pub use slots::{generate_slots, ResolvedSlot};
pub use store::{MemoryStore, ProviderRecords, RuleStore, Source};
