use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mentorbook_core::errors::{EngineError, EngineResult};
use mentorbook_core::ledger::Transition;
use mentorbook_core::models::availability::{
    AvailabilityProfile, DateOverride, WeeklyRule, parse_timezone,
};
use mentorbook_core::models::booking::Booking;
use mentorbook_core::store::EngineStore;
use uuid::Uuid;

use crate::repositories::{availability, booking};
use crate::DbPool;

/// Postgres-backed storage. Booking writes take a per-mentor advisory lock
/// inside their transaction, with the table's exclusion constraint as a
/// second line of defense.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        PgStore { pool }
    }

    async fn require_profile(&self, mentor_id: Uuid) -> EngineResult<AvailabilityProfile> {
        availability::get_profile(&self.pool, mentor_id)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!(
                    "availability profile for mentor {mentor_id} not found"
                ))
            })
    }
}

#[async_trait]
impl EngineStore for PgStore {
    async fn get_profile(&self, mentor_id: Uuid) -> EngineResult<Option<AvailabilityProfile>> {
        Ok(availability::get_profile(&self.pool, mentor_id).await?)
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
        let exists = availability::get_profile(&self.pool, mentor_id).await?.is_some();
        if !exists && timezone.is_none() {
            return Err(EngineError::validation(
                "timezone",
                "timezone is required when creating an availability profile",
            ));
        }

        availability::upsert_profile(&self.pool, mentor_id, timezone.as_deref()).await?;
        availability::replace_weekly_rules(&self.pool, mentor_id, &rules).await?;
        self.require_profile(mentor_id).await
    }

    async fn set_date_override(
        &self,
        mentor_id: Uuid,
        date_override: DateOverride,
    ) -> EngineResult<AvailabilityProfile> {
        date_override.validate()?;
        self.require_profile(mentor_id).await?;
        availability::upsert_date_override(&self.pool, mentor_id, &date_override).await?;
        self.require_profile(mentor_id).await
    }

    async fn set_profile_active(
        &self,
        mentor_id: Uuid,
        is_active: bool,
    ) -> EngineResult<AvailabilityProfile> {
        let touched = availability::set_active(&self.pool, mentor_id, is_active).await?;
        if !touched {
            return Err(EngineError::NotFound(format!(
                "availability profile for mentor {mentor_id} not found"
            )));
        }
        self.require_profile(mentor_id).await
    }

    async fn get_booking(&self, booking_id: Uuid) -> EngineResult<Option<Booking>> {
        Ok(booking::get_booking(&self.pool, booking_id).await?)
    }

    async fn list_bookings(&self, mentor_id: Uuid) -> EngineResult<Vec<Booking>> {
        Ok(booking::get_bookings_by_mentor_id(&self.pool, mentor_id).await?)
    }

    async fn reserve(
        &self,
        mentor_id: Uuid,
        student_id: Uuid,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
    ) -> EngineResult<Booking> {
        booking::reserve(&self.pool, mentor_id, student_id, start_utc, end_utc).await
    }

    async fn transition(
        &self,
        booking_id: Uuid,
        expected_version: i64,
        transition: Transition,
    ) -> EngineResult<Booking> {
        booking::transition(&self.pool, booking_id, expected_version, transition).await
    }
}
