//! Error types for slot-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("Invalid weekday number: {0} (expected 1 = Sunday .. 7 = Saturday)")]
    InvalidWeekday(u8),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure reported by a [`RuleStore`](crate::store::RuleStore) fetch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("could not decode record: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
