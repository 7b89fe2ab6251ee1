use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mentorbook_core::errors::{EngineError, EngineResult};
use mentorbook_core::ledger::{self, Transition};
use mentorbook_core::models::availability::{
    AvailabilityProfile, DateOverride, WeeklyRule, parse_timezone,
};
use mentorbook_core::models::booking::Booking;
use mentorbook_core::store::EngineStore;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// In-memory storage with the same atomicity contract as the Postgres
/// backend: one async mutex per mentor ledger, so the overlap scan and the
/// write happen under a single lock and mentors never contend with each
/// other. Used by tests and ad-hoc tooling.
#[derive(Default)]
pub struct MemoryStore {
    profiles: RwLock<HashMap<Uuid, AvailabilityProfile>>,
    ledgers: RwLock<HashMap<Uuid, Arc<Mutex<Vec<Booking>>>>>,
    booking_index: RwLock<HashMap<Uuid, Uuid>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    async fn ledger(&self, mentor_id: Uuid) -> Arc<Mutex<Vec<Booking>>> {
        let mut ledgers = self.ledgers.write().await;
        Arc::clone(ledgers.entry(mentor_id).or_default())
    }

    async fn mentor_of(&self, booking_id: Uuid) -> EngineResult<Uuid> {
        // copy out under a short read guard; holding it across the ledger
        // lock would invert the lock order used by reserve
        self.booking_index
            .read()
            .await
            .get(&booking_id)
            .copied()
            .ok_or_else(|| EngineError::NotFound(format!("booking {booking_id} not found")))
    }
}

#[async_trait]
impl EngineStore for MemoryStore {
    async fn get_profile(&self, mentor_id: Uuid) -> EngineResult<Option<AvailabilityProfile>> {
        Ok(self.profiles.read().await.get(&mentor_id).cloned())
    }

    async fn set_weekly_rules(
        &self,
        mentor_id: Uuid,
        timezone: Option<String>,
        rules: Vec<WeeklyRule>,
    ) -> EngineResult<AvailabilityProfile> {
        for rule in &rules {
            rule.validate()?;
        }
        if let Some(timezone) = &timezone {
            parse_timezone(timezone)?;
        }

        let now = Utc::now();
        let mut profiles = self.profiles.write().await;
        let profile = match profiles.entry(mentor_id) {
            Entry::Occupied(occupied) => {
                let profile = occupied.into_mut();
                if let Some(timezone) = timezone {
                    profile.timezone = timezone;
                }
                profile
            }
            Entry::Vacant(vacant) => {
                let timezone = timezone.ok_or_else(|| {
                    EngineError::validation(
                        "timezone",
                        "timezone is required when creating an availability profile",
                    )
                })?;
                vacant.insert(AvailabilityProfile::new(mentor_id, timezone, now))
            }
        };
        profile.weekly_rules = rules;
        profile.updated_at = now;
        Ok(profile.clone())
    }

    async fn set_date_override(
        &self,
        mentor_id: Uuid,
        date_override: DateOverride,
    ) -> EngineResult<AvailabilityProfile> {
        date_override.validate()?;
        let mut profiles = self.profiles.write().await;
        let profile = profiles.get_mut(&mentor_id).ok_or_else(|| {
            EngineError::NotFound(format!(
                "availability profile for mentor {mentor_id} not found"
            ))
        })?;
        profile
            .date_overrides
            .insert(date_override.date, date_override);
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn set_profile_active(
        &self,
        mentor_id: Uuid,
        is_active: bool,
    ) -> EngineResult<AvailabilityProfile> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles.get_mut(&mentor_id).ok_or_else(|| {
            EngineError::NotFound(format!(
                "availability profile for mentor {mentor_id} not found"
            ))
        })?;
        profile.is_active = is_active;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn get_booking(&self, booking_id: Uuid) -> EngineResult<Option<Booking>> {
        let Ok(mentor_id) = self.mentor_of(booking_id).await else {
            return Ok(None);
        };
        let ledger = self.ledger(mentor_id).await;
        let entries = ledger.lock().await;
        Ok(entries.iter().find(|b| b.id == booking_id).cloned())
    }

    async fn list_bookings(&self, mentor_id: Uuid) -> EngineResult<Vec<Booking>> {
        let ledger = self.ledger(mentor_id).await;
        let entries = ledger.lock().await;
        let mut bookings: Vec<Booking> = entries.clone();
        bookings.sort_by_key(|b| b.start_utc);
        Ok(bookings)
    }

    async fn reserve(
        &self,
        mentor_id: Uuid,
        student_id: Uuid,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
    ) -> EngineResult<Booking> {
        let ledger = self.ledger(mentor_id).await;
        let mut entries = ledger.lock().await;

        if let Some(existing) = ledger::find_overlap(entries.iter(), start_utc, end_utc, None) {
            return Err(EngineError::SlotConflict(format!(
                "window {start_utc}..{end_utc} overlaps booking {}",
                existing.id
            )));
        }

        let booking = Booking::new(mentor_id, student_id, start_utc, end_utc, Utc::now());
        entries.push(booking.clone());
        self.booking_index.write().await.insert(booking.id, mentor_id);
        Ok(booking)
    }

    async fn transition(
        &self,
        booking_id: Uuid,
        expected_version: i64,
        transition: Transition,
    ) -> EngineResult<Booking> {
        let mentor_id = self.mentor_of(booking_id).await?;
        let ledger = self.ledger(mentor_id).await;
        let mut entries = ledger.lock().await;

        let position = entries
            .iter()
            .position(|b| b.id == booking_id)
            .ok_or_else(|| EngineError::NotFound(format!("booking {booking_id} not found")))?;

        if let Some((check_start, check_end)) =
            ledger::window_to_check(&entries[position], &transition)
        {
            if let Some(existing) =
                ledger::find_overlap(entries.iter(), check_start, check_end, Some(booking_id))
            {
                return Err(EngineError::SlotConflict(format!(
                    "window {check_start}..{check_end} overlaps booking {}",
                    existing.id
                )));
            }
        }

        let next = ledger::apply(&entries[position], transition, expected_version, Utc::now())?;
        entries[position] = next.clone();
        Ok(next)
    }
}
