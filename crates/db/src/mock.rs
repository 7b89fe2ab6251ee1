use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mentorbook_core::errors::EngineResult;
use mentorbook_core::ledger::Transition;
use mentorbook_core::models::availability::{AvailabilityProfile, DateOverride, WeeklyRule};
use mentorbook_core::models::booking::Booking;
use mentorbook_core::store::EngineStore;
use mockall::mock;
use uuid::Uuid;

// Mock store for testing failure paths without a live backend
mock! {
    pub Store {}

    #[async_trait]
    impl EngineStore for Store {
        async fn get_profile(&self, mentor_id: Uuid) -> EngineResult<Option<AvailabilityProfile>>;

        async fn set_weekly_rules(
            &self,
            mentor_id: Uuid,
            timezone: Option<String>,
            rules: Vec<WeeklyRule>,
        ) -> EngineResult<AvailabilityProfile>;

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

        async fn list_bookings(&self, mentor_id: Uuid) -> EngineResult<Vec<Booking>>;

        async fn reserve(
            &self,
            mentor_id: Uuid,
            student_id: Uuid,
            start_utc: DateTime<Utc>,
            end_utc: DateTime<Utc>,
        ) -> EngineResult<Booking>;

        async fn transition(
            &self,
            booking_id: Uuid,
            expected_version: i64,
            transition: Transition,
        ) -> EngineResult<Booking>;
    }
}
