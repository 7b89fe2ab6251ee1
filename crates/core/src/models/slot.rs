use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A concrete bookable interval produced by the resolver. Ephemeral: never
/// persisted, consumed immediately by the reservation coordinator or
/// converted for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSlot {
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

impl ResolvedSlot {
    /// Full containment of `[start_utc, end_utc)`; partial overlap is not
    /// enough to make a window offerable.
    pub fn contains(&self, start_utc: DateTime<Utc>, end_utc: DateTime<Utc>) -> bool {
        self.start_utc <= start_utc && end_utc <= self.end_utc
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end_utc - self.start_utc
    }

    /// Shift into a caller's timezone for display.
    pub fn in_zone(&self, tz: Tz) -> SlotView {
        SlotView {
            start: self.start_utc.with_timezone(&tz).fixed_offset(),
            end: self.end_utc.with_timezone(&tz).fixed_offset(),
        }
    }
}

/// A resolved slot rendered in the requesting caller's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}
