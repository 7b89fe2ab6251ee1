use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::EngineResult;
use crate::ledger::Transition;
use crate::models::availability::{AvailabilityProfile, DateOverride, WeeklyRule};
use crate::models::booking::Booking;

/// Storage seam between the coordinator and a concrete backend.
///
/// Implementors must make [`reserve`] and [`transition`] atomic per mentor:
/// the conflict scan and the write execute as one unit, and no lock is
/// shared between two mentors. Profile reads return a single consistent
/// snapshot, never a mix of old and new rules.
///
/// [`reserve`]: EngineStore::reserve
/// [`transition`]: EngineStore::transition
#[async_trait]
pub trait EngineStore: Send + Sync {
    async fn get_profile(&self, mentor_id: Uuid) -> EngineResult<Option<AvailabilityProfile>>;

    /// Replace the mentor's weekly rule set, creating the profile on first
    /// write. `timezone` is required on creation and optional afterwards.
    async fn set_weekly_rules(
        &self,
        mentor_id: Uuid,
        timezone: Option<String>,
        rules: Vec<WeeklyRule>,
    ) -> EngineResult<AvailabilityProfile>;

    /// Insert or replace the override for its date.
    async fn set_date_override(
        &self,
        mentor_id: Uuid,
        date_override: DateOverride,
    ) -> EngineResult<AvailabilityProfile>;

    async fn set_profile_active(
        &self,
        mentor_id: Uuid,
        is_active: bool,
    ) -> EngineResult<AvailabilityProfile>;

    async fn get_booking(&self, booking_id: Uuid) -> EngineResult<Option<Booking>>;

    /// All bookings for a mentor, ordered by start time.
    async fn list_bookings(&self, mentor_id: Uuid) -> EngineResult<Vec<Booking>>;

    /// Atomic conflict-check and insert of a new pending booking. Exactly
    /// one of two racing calls for overlapping windows succeeds; the other
    /// observes `SlotConflict`.
    async fn reserve(
        &self,
        mentor_id: Uuid,
        student_id: Uuid,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
    ) -> EngineResult<Booking>;

    /// Atomic version-guarded transition, re-running the overlap scan for
    /// transitions that commit a new interval into the conflict index.
    async fn transition(
        &self,
        booking_id: Uuid,
        expected_version: i64,
        transition: Transition,
    ) -> EngineResult<Booking>;
}
