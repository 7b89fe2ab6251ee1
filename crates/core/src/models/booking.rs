use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    ReschedulePending,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Whether a booking in this status holds its interval in the
    /// per-mentor conflict index.
    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::ReschedulePending
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::ReschedulePending => "reschedule-pending",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "reschedule-pending" => Ok(BookingStatus::ReschedulePending),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(EngineError::validation(
                "status",
                format!("unknown booking status {other:?}"),
            )),
        }
    }
}

/// Which side of a booking an actor is on. Either party may cancel; only
/// the party that did not initiate a reschedule may respond to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Mentor,
    Student,
}

impl Party {
    pub fn as_str(self) -> &'static str {
        match self {
            Party::Mentor => "mentor",
            Party::Student => "student",
        }
    }
}

impl FromStr for Party {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mentor" => Ok(Party::Mentor),
            "student" => Ok(Party::Student),
            other => Err(EngineError::validation(
                "party",
                format!("unknown party {other:?}"),
            )),
        }
    }
}

/// A proposed new window carried by a `reschedule-pending` booking. The
/// booking's committed interval stays reserved while the proposal is
/// negotiated; the proposed interval is not held until acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleProposal {
    pub new_start_utc: DateTime<Utc>,
    pub new_end_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub initiated_by: Party,
    pub requested_at: DateTime<Utc>,
}

/// A ledger entry. Per mentor, no two bookings whose status is blocking may
/// overlap on `[start_utc, end_utc)` -- the engine's core invariant.
/// `version` is a monotone counter guarding every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub student_id: Uuid,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub status: BookingStatus,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal: Option<RescheduleProposal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        mentor_id: Uuid,
        student_id: Uuid,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Booking {
            id: Uuid::new_v4(),
            mentor_id,
            student_id,
            start_utc,
            end_utc,
            status: BookingStatus::Pending,
            version: 0,
            proposal: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Half-open interval overlap: back-to-back bookings do not conflict.
    pub fn overlaps(&self, start_utc: DateTime<Utc>, end_utc: DateTime<Utc>) -> bool {
        self.start_utc < end_utc && start_utc < self.end_utc
    }

    pub fn party_of(&self, actor_id: Uuid) -> Option<Party> {
        if actor_id == self.mentor_id {
            Some(Party::Mentor)
        } else if actor_id == self.student_id {
            Some(Party::Student)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub mentor_id: Uuid,
    pub student_id: Uuid,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub actor_id: Uuid,
    pub new_start_utc: DateTime<Utc>,
    pub new_end_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RescheduleDecision {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondRescheduleRequest {
    pub actor_id: Uuid,
    pub decision: RescheduleDecision,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub actor_id: Uuid,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmBookingRequest {
    pub actor_id: Uuid,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteBookingRequest {
    pub version: i64,
}
