use chrono::{DateTime, NaiveDate, Utc};
use eyre::{Result, eyre};
use mentorbook_core::models::availability::{DateOverride, TimeOfDay, WeeklyRule};
use mentorbook_core::models::booking::{Booking, Party, RescheduleProposal};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailabilityProfile {
    pub mentor_id: Uuid,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbWeeklyRule {
    pub mentor_id: Uuid,
    pub position: i32,
    pub day_of_week: i16,
    pub start_minutes: i16,
    pub end_minutes: i16,
    pub is_available: bool,
}

impl DbWeeklyRule {
    pub fn into_core(self) -> Result<WeeklyRule> {
        Ok(WeeklyRule {
            day_of_week: u8::try_from(self.day_of_week)
                .map_err(|_| eyre!("day_of_week {} out of range", self.day_of_week))?,
            start_time: time_of_day(self.start_minutes)?,
            end_time: time_of_day(self.end_minutes)?,
            is_available: self.is_available,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDateOverride {
    pub mentor_id: Uuid,
    pub date: NaiveDate,
    pub is_available: bool,
    pub start_minutes: Option<i16>,
    pub end_minutes: Option<i16>,
    pub note: Option<String>,
}

impl DbDateOverride {
    pub fn into_core(self) -> Result<DateOverride> {
        Ok(DateOverride {
            date: self.date,
            is_available: self.is_available,
            start_time: self.start_minutes.map(time_of_day).transpose()?,
            end_time: self.end_minutes.map(time_of_day).transpose()?,
            note: self.note,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub student_id: Uuid,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub status: String,
    pub version: i64,
    pub proposed_start_utc: Option<DateTime<Utc>>,
    pub proposed_end_utc: Option<DateTime<Utc>>,
    pub proposal_reason: Option<String>,
    pub proposal_initiated_by: Option<String>,
    pub proposal_requested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbBooking {
    pub fn into_core(self) -> Result<Booking> {
        let proposal = match (
            self.proposed_start_utc,
            self.proposed_end_utc,
            self.proposal_initiated_by,
            self.proposal_requested_at,
        ) {
            (Some(new_start_utc), Some(new_end_utc), Some(initiated_by), Some(requested_at)) => {
                Some(RescheduleProposal {
                    new_start_utc,
                    new_end_utc,
                    reason: self.proposal_reason,
                    initiated_by: initiated_by.parse::<Party>().map_err(|e| eyre!(e))?,
                    requested_at,
                })
            }
            (None, None, _, None) => None,
            _ => return Err(eyre!("booking {} carries a partial proposal", self.id)),
        };

        Ok(Booking {
            id: self.id,
            mentor_id: self.mentor_id,
            student_id: self.student_id,
            start_utc: self.start_utc,
            end_utc: self.end_utc,
            status: self.status.parse().map_err(|e| eyre!("{e}"))?,
            version: self.version,
            proposal,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn time_of_day(raw: i16) -> Result<TimeOfDay> {
    u16::try_from(raw)
        .ok()
        .and_then(TimeOfDay::from_minutes)
        .ok_or_else(|| eyre!("minute-of-day value {raw} out of range"))
}
