//! Slice free intervals into fixed-length bookable slots.
//!
//! Each free interval is walked on its own from its start, so slots always
//! begin on the declared window's grid. A candidate is dropped if it overlaps
//! any busy interval; touching a busy interval is fine, which is what lets
//! bookings sit back to back.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::expander::local_label;
use crate::interval::DateInterval;

/// A bookable slot, recomputed per query and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolvedSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ResolvedSlot {
    pub fn interval(&self) -> DateInterval {
        DateInterval {
            start: self.start,
            end: self.end,
        }
    }

    /// Start time as local `"HH:mm"` in the provider's timezone.
    pub fn label(&self, tz: Tz) -> String {
        local_label(self.start, tz)
    }
}

/// Generate the slots of length `slot` offered on `day`.
///
/// Only candidates starting within `day` are considered. The result is
/// deduplicated by start instant and sorted ascending, so running it twice on
/// the same input yields the same list. A non-positive `slot` yields nothing.
///
/// Slot identity is the start instant, not its wall-clock reading: on a day
/// the clocks fall back, the repeated local hour is offered twice, once per
/// offset. [`slot_labels`] tells the two apart.
pub fn generate_slots(
    free: &[DateInterval],
    busy: &[DateInterval],
    slot: Duration,
    day: DateInterval,
) -> Vec<ResolvedSlot> {
    if slot <= Duration::zero() {
        return Vec::new();
    }

    let mut slots = Vec::new();
    for window in free {
        // Walk the window on its own grid; a trailing remainder shorter than
        // `slot` is dropped.
        let mut cursor = window.start;
        while cursor + slot <= window.end {
            let candidate = DateInterval {
                start: cursor,
                end: cursor + slot,
            };
            if day.contains_instant(cursor) && !busy.iter().any(|b| b.intersects(&candidate)) {
                slots.push(ResolvedSlot {
                    start: candidate.start,
                    end: candidate.end,
                });
            }
            cursor += slot;
        }
    }

    // Overlapping windows produce the same candidate more than once.
    slots.sort();
    slots.dedup_by_key(|s| s.start);
    slots
}

/// Local `"HH:mm"` labels for a slot list.
///
/// A reading shared by two slots (the repeated hour when clocks fall back)
/// gets the zone abbreviation appended, e.g. `"01:00 EDT"` and `"01:00 EST"`.
pub fn slot_labels(slots: &[ResolvedSlot], tz: Tz) -> Vec<String> {
    let plain: Vec<String> = slots.iter().map(|s| s.label(tz)).collect();
    plain
        .iter()
        .zip(slots)
        .map(|(label, slot)| {
            if plain.iter().filter(|l| *l == label).count() > 1 {
                let local = slot.start.with_timezone(&tz);
                local.format("%H:%M %Z").to_string()
            } else {
                label.clone()
            }
        })
        .collect()
}
