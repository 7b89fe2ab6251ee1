//! # Reservation Coordinator
//!
//! Mediates between the slot resolver and the booking ledger. Every
//! booking mutation goes through this module, so conflict and concurrency
//! failures surface from one place with one taxonomy:
//!
//! - `ProfileInactive` when the mentor has disabled their profile;
//! - `SlotUnavailable` when the requested window is not fully inside the
//!   mentor's offerable time;
//! - `SlotConflict` when another blocking booking holds the window; when
//!   two requests race for one window, exactly one succeeds;
//! - `StaleBooking` when the caller's observed version has been superseded;
//!   the engine never retries on the caller's behalf.
//!
//! Availability is checked against a single profile snapshot; the overlap
//! scan and the write happen atomically inside the store.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult};
use crate::ledger::Transition;
use crate::models::availability::AvailabilityProfile;
use crate::models::booking::{Booking, Party};
use crate::resolver;
use crate::store::EngineStore;

/// Reserve a new pending booking for `[start_utc, end_utc)`.
pub async fn create_booking(
    store: &dyn EngineStore,
    mentor_id: Uuid,
    student_id: Uuid,
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
) -> EngineResult<Booking> {
    if end_utc <= start_utc {
        return Err(EngineError::validation(
            "start_utc",
            "booking start must be before booking end",
        ));
    }
    let profile = fetch_profile(store, mentor_id).await?;
    if !profile.is_active {
        return Err(EngineError::ProfileInactive);
    }
    ensure_offerable(&profile, start_utc, end_utc)?;
    store.reserve(mentor_id, student_id, start_utc, end_utc).await
}

/// Propose a new window for an existing booking. The old interval stays
/// reserved while the proposal is negotiated; the new window is validated
/// exactly as a fresh reservation would be, excluding the booking itself
/// from its own conflict scan.
pub async fn request_reschedule(
    store: &dyn EngineStore,
    booking_id: Uuid,
    actor_id: Uuid,
    new_start_utc: DateTime<Utc>,
    new_end_utc: DateTime<Utc>,
    reason: Option<String>,
    version: i64,
) -> EngineResult<Booking> {
    if new_end_utc <= new_start_utc {
        return Err(EngineError::validation(
            "new_start_utc",
            "proposed start must be before proposed end",
        ));
    }
    let booking = fetch_booking(store, booking_id).await?;
    let party = party_of(&booking, actor_id)?;
    let profile = fetch_profile(store, booking.mentor_id).await?;
    ensure_offerable(&profile, new_start_utc, new_end_utc)?;
    store
        .transition(
            booking_id,
            version,
            Transition::RequestReschedule {
                new_start_utc,
                new_end_utc,
                reason,
                by: party,
            },
        )
        .await
}

/// Accept or reject a pending reschedule proposal. Only the party that did
/// not initiate the proposal may respond.
pub async fn respond_reschedule(
    store: &dyn EngineStore,
    booking_id: Uuid,
    actor_id: Uuid,
    accept: bool,
    version: i64,
) -> EngineResult<Booking> {
    let booking = fetch_booking(store, booking_id).await?;
    let party = party_of(&booking, actor_id)?;
    store
        .transition(
            booking_id,
            version,
            Transition::RespondReschedule { accept, by: party },
        )
        .await
}

/// Cancel a booking. Either party may cancel any non-terminal booking.
pub async fn cancel_booking(
    store: &dyn EngineStore,
    booking_id: Uuid,
    actor_id: Uuid,
    version: i64,
) -> EngineResult<Booking> {
    let booking = fetch_booking(store, booking_id).await?;
    party_of(&booking, actor_id)?;
    store.transition(booking_id, version, Transition::Cancel).await
}

/// Confirm a pending booking; the mentor's side of the handshake.
pub async fn confirm_booking(
    store: &dyn EngineStore,
    booking_id: Uuid,
    actor_id: Uuid,
    version: i64,
) -> EngineResult<Booking> {
    let booking = fetch_booking(store, booking_id).await?;
    let party = party_of(&booking, actor_id)?;
    store
        .transition(booking_id, version, Transition::Confirm { by: party })
        .await
}

/// Mark a confirmed booking completed once its end time has passed.
pub async fn complete_booking(
    store: &dyn EngineStore,
    booking_id: Uuid,
    version: i64,
) -> EngineResult<Booking> {
    store.transition(booking_id, version, Transition::Complete).await
}

fn ensure_offerable(
    profile: &AvailabilityProfile,
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
) -> EngineResult<()> {
    if !resolver::window_is_offerable(profile, start_utc, end_utc)? {
        return Err(EngineError::SlotUnavailable(format!(
            "window {start_utc}..{end_utc} is not inside the mentor's offerable time"
        )));
    }
    Ok(())
}

async fn fetch_profile(
    store: &dyn EngineStore,
    mentor_id: Uuid,
) -> EngineResult<AvailabilityProfile> {
    store.get_profile(mentor_id).await?.ok_or_else(|| {
        EngineError::NotFound(format!("availability profile for mentor {mentor_id} not found"))
    })
}

async fn fetch_booking(store: &dyn EngineStore, booking_id: Uuid) -> EngineResult<Booking> {
    store
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("booking {booking_id} not found")))
}

fn party_of(booking: &Booking, actor_id: Uuid) -> EngineResult<Party> {
    booking.party_of(actor_id).ok_or_else(|| {
        EngineError::Forbidden(format!(
            "actor {actor_id} is not a party to booking {}",
            booking.id
        ))
    })
}
