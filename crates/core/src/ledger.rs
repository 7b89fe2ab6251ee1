//! # Booking Ledger
//!
//! Pure transition and overlap logic for the authoritative booking record.
//! Storage backends call into this module from inside their atomic
//! check-and-write sections, so every mutation path shares one state
//! machine and one overlap rule.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult};
use crate::models::booking::{Booking, BookingStatus, Party, RescheduleProposal};

/// A requested mutation of a single booking. Every transition carries the
/// version the caller observed; stores pass it to [`apply`] unchanged.
#[derive(Debug, Clone)]
pub enum Transition {
    /// `pending -> confirmed`, mentor only
    Confirm { by: Party },
    /// Any non-terminal status `-> cancelled`; either party
    Cancel,
    /// `pending | confirmed -> reschedule-pending`, holding the old
    /// interval as reserved while the proposal is negotiated
    RequestReschedule {
        new_start_utc: DateTime<Utc>,
        new_end_utc: DateTime<Utc>,
        reason: Option<String>,
        by: Party,
    },
    /// `reschedule-pending -> confirmed`, committing or discarding the
    /// proposal; counterparty of the initiator only
    RespondReschedule { accept: bool, by: Party },
    /// `confirmed -> completed` once the session end has passed
    Complete,
}

/// First blocking booking overlapping `[start_utc, end_utc)`, if any.
/// `exclude` drops the booking being rescheduled from its own scan.
pub fn find_overlap<'a, I>(
    bookings: I,
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> Option<&'a Booking>
where
    I: IntoIterator<Item = &'a Booking>,
{
    bookings.into_iter().find(|booking| {
        booking.status.is_blocking()
            && exclude != Some(booking.id)
            && booking.overlaps(start_utc, end_utc)
    })
}

/// The window a transition is about to commit into the conflict index, if
/// any. Stores re-run the overlap scan on this window (excluding the
/// booking itself) inside their atomic section: the proposed interval of a
/// reschedule is not held during negotiation, so both requesting and
/// accepting must validate it against the current ledger.
pub fn window_to_check(
    booking: &Booking,
    transition: &Transition,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match transition {
        Transition::RequestReschedule {
            new_start_utc,
            new_end_utc,
            ..
        } => Some((*new_start_utc, *new_end_utc)),
        Transition::RespondReschedule { accept: true, .. } => booking
            .proposal
            .as_ref()
            .map(|proposal| (proposal.new_start_utc, proposal.new_end_utc)),
        _ => None,
    }
}

/// Apply a version-guarded transition, returning the successor booking.
/// The input is never mutated; the successor carries `version + 1`.
pub fn apply(
    booking: &Booking,
    transition: Transition,
    expected_version: i64,
    now: DateTime<Utc>,
) -> EngineResult<Booking> {
    if booking.version != expected_version {
        return Err(EngineError::StaleBooking {
            supplied: expected_version,
            current: booking.version,
        });
    }

    let mut next = booking.clone();
    match transition {
        Transition::Confirm { by } => {
            require_status(booking, &[BookingStatus::Pending], "confirm")?;
            if by != Party::Mentor {
                return Err(EngineError::Forbidden(
                    "only the mentor may confirm a pending booking".to_string(),
                ));
            }
            next.status = BookingStatus::Confirmed;
        }
        Transition::Cancel => {
            if booking.status.is_terminal() {
                return Err(EngineError::InvalidTransition(format!(
                    "cannot cancel a {} booking",
                    booking.status.as_str()
                )));
            }
            next.status = BookingStatus::Cancelled;
            next.proposal = None;
        }
        Transition::RequestReschedule {
            new_start_utc,
            new_end_utc,
            reason,
            by,
        } => {
            require_status(
                booking,
                &[BookingStatus::Pending, BookingStatus::Confirmed],
                "reschedule",
            )?;
            if new_end_utc <= new_start_utc {
                return Err(EngineError::validation(
                    "new_start_utc",
                    "proposed start must be before proposed end",
                ));
            }
            next.status = BookingStatus::ReschedulePending;
            next.proposal = Some(RescheduleProposal {
                new_start_utc,
                new_end_utc,
                reason,
                initiated_by: by,
                requested_at: now,
            });
        }
        Transition::RespondReschedule { accept, by } => {
            require_status(
                booking,
                &[BookingStatus::ReschedulePending],
                "respond to a reschedule for",
            )?;
            let proposal = next.proposal.take().ok_or_else(|| {
                EngineError::InvalidTransition(
                    "reschedule-pending booking carries no proposal".to_string(),
                )
            })?;
            if by == proposal.initiated_by {
                return Err(EngineError::Forbidden(
                    "the party that requested the reschedule cannot respond to it".to_string(),
                ));
            }
            if accept {
                next.start_utc = proposal.new_start_utc;
                next.end_utc = proposal.new_end_utc;
            }
            next.status = BookingStatus::Confirmed;
        }
        Transition::Complete => {
            require_status(booking, &[BookingStatus::Confirmed], "complete")?;
            if now < booking.end_utc {
                return Err(EngineError::InvalidTransition(
                    "booking cannot be completed before its end time".to_string(),
                ));
            }
            next.status = BookingStatus::Completed;
        }
    }

    next.version = booking.version + 1;
    next.updated_at = now;
    Ok(next)
}

fn require_status(booking: &Booking, allowed: &[BookingStatus], action: &str) -> EngineResult<()> {
    if allowed.contains(&booking.status) {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition(format!(
            "cannot {action} a {} booking",
            booking.status.as_str()
        )))
    }
}
