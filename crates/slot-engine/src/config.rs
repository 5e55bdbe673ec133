//! Engine configuration.
//!
//! All fields have defaults matching the booking product's observed policy
//! (one-hour slots and bookings, an eight-hour ceiling for new entries), so an
//! empty JSON object is a valid configuration.

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{EngineError, Result};

/// Longest fixed horizon accepted, one year.
pub const MAX_HORIZON_HOURS: u32 = 366 * 24;

/// How far past a candidate start the max-duration calculator looks for room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    /// Up to the end of the candidate's local calendar day.
    #[default]
    EndOfDay,
    /// A fixed number of hours after the candidate start.
    Hours(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA timezone of the provider's calendar.
    pub timezone: String,
    /// Length of each offered slot.
    pub slot_minutes: u32,
    /// Length of time a booking occupies.
    pub booking_minutes: u32,
    /// Ceiling for provider-authored entries, in whole hours.
    pub policy_max_hours: u32,
    pub horizon: Horizon,
    pub dst_policy: DstPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            slot_minutes: 60,
            booking_minutes: 60,
            policy_max_hours: 8,
            horizon: Horizon::EndOfDay,
            dst_policy: DstPolicy::WallClock,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Check that the timezone resolves and the durations are usable.
    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if self.slot_minutes == 0 {
            return Err(EngineError::InvalidConfig(
                "slot_minutes must be positive".to_string(),
            ));
        }
        if self.booking_minutes == 0 {
            return Err(EngineError::InvalidConfig(
                "booking_minutes must be positive".to_string(),
            ));
        }
        if self.policy_max_hours == 0 {
            return Err(EngineError::InvalidConfig(
                "policy_max_hours must be positive".to_string(),
            ));
        }
        if let Horizon::Hours(hours) = self.horizon {
            if !(1..=MAX_HORIZON_HOURS).contains(&hours) {
                return Err(EngineError::InvalidConfig(format!(
                    "horizon must be 1 to {MAX_HORIZON_HOURS} hours, got {hours}"
                )));
            }
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| EngineError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn slot_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_minutes))
    }

    pub fn booking_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.booking_minutes))
    }
}
