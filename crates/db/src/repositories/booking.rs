use crate::models::DbBooking;
use chrono::{DateTime, Utc};
use eyre::Result;
use mentorbook_core::errors::{EngineError, EngineResult};
use mentorbook_core::ledger::{self, Transition};
use mentorbook_core::models::booking::Booking;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "id, mentor_id, student_id, start_utc, end_utc, status, version, \
     proposed_start_utc, proposed_end_utc, proposal_reason, proposal_initiated_by, \
     proposal_requested_at, created_at, updated_at";

pub async fn get_booking(pool: &Pool<Postgres>, booking_id: Uuid) -> Result<Option<Booking>> {
    tracing::debug!("Getting booking: id={}", booking_id);

    let row = sqlx::query_as::<_, DbBooking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
    ))
    .bind(booking_id)
    .fetch_optional(pool)
    .await?;

    row.map(DbBooking::into_core).transpose()
}

pub async fn get_bookings_by_mentor_id(
    pool: &Pool<Postgres>,
    mentor_id: Uuid,
) -> Result<Vec<Booking>> {
    tracing::debug!("Getting bookings: mentor_id={}", mentor_id);

    let rows = sqlx::query_as::<_, DbBooking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE mentor_id = $1 ORDER BY start_utc ASC"
    ))
    .bind(mentor_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(DbBooking::into_core).collect()
}

/// Atomically conflict-checks and inserts a new pending booking.
///
/// The per-mentor advisory lock serializes all writers touching one
/// mentor's ledger, so the overlap scan and the insert act as one unit.
/// The table's exclusion constraint backs this up; a `23P01` violation is
/// surfaced as the same `SlotConflict` the scan would have produced.
pub async fn reserve(
    pool: &Pool<Postgres>,
    mentor_id: Uuid,
    student_id: Uuid,
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
) -> EngineResult<Booking> {
    tracing::debug!(
        "Reserving booking: mentor_id={}, window={}..{}",
        mentor_id,
        start_utc,
        end_utc
    );

    let mut tx = pool.begin().await.map_err(map_sqlx)?;
    lock_mentor_ledger(&mut tx, mentor_id).await?;

    let ledger = blocking_bookings(&mut tx, mentor_id).await?;
    if let Some(existing) = ledger::find_overlap(&ledger, start_utc, end_utc, None) {
        return Err(EngineError::SlotConflict(format!(
            "window {start_utc}..{end_utc} overlaps booking {}",
            existing.id
        )));
    }

    let booking = Booking::new(mentor_id, student_id, start_utc, end_utc, Utc::now());
    insert_booking(&mut tx, &booking).await?;
    tx.commit().await.map_err(map_sqlx)?;

    tracing::debug!("Booking reserved: id={}", booking.id);
    Ok(booking)
}

/// Atomically applies a version-guarded transition.
///
/// Locks the booking row first, then the mentor's ledger, then re-runs the
/// overlap scan for any window the transition is about to commit (the
/// proposed interval of a reschedule is not held during negotiation).
pub async fn transition(
    pool: &Pool<Postgres>,
    booking_id: Uuid,
    expected_version: i64,
    transition: Transition,
) -> EngineResult<Booking> {
    tracing::debug!(
        "Applying transition: booking_id={}, expected_version={}",
        booking_id,
        expected_version
    );

    let mut tx = pool.begin().await.map_err(map_sqlx)?;

    let row = sqlx::query_as::<_, DbBooking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
    ))
    .bind(booking_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(map_sqlx)?;

    let booking = row
        .ok_or_else(|| EngineError::NotFound(format!("booking {booking_id} not found")))?
        .into_core()?;

    lock_mentor_ledger(&mut tx, booking.mentor_id).await?;

    if let Some((check_start, check_end)) = ledger::window_to_check(&booking, &transition) {
        let ledger = blocking_bookings(&mut tx, booking.mentor_id).await?;
        if let Some(existing) =
            ledger::find_overlap(&ledger, check_start, check_end, Some(booking.id))
        {
            return Err(EngineError::SlotConflict(format!(
                "window {check_start}..{check_end} overlaps booking {}",
                existing.id
            )));
        }
    }

    let next = ledger::apply(&booking, transition, expected_version, Utc::now())?;
    update_booking(&mut tx, &next).await?;
    tx.commit().await.map_err(map_sqlx)?;

    tracing::debug!(
        "Transition applied: booking_id={}, status={}, version={}",
        next.id,
        next.status.as_str(),
        next.version
    );
    Ok(next)
}

async fn lock_mentor_ledger(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    mentor_id: Uuid,
) -> EngineResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
        .bind(mentor_id)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx)?;
    Ok(())
}

async fn blocking_bookings(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    mentor_id: Uuid,
) -> EngineResult<Vec<Booking>> {
    let rows = sqlx::query_as::<_, DbBooking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings \
         WHERE mentor_id = $1 AND status IN ('pending', 'confirmed', 'reschedule-pending') \
         ORDER BY start_utc ASC"
    ))
    .bind(mentor_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(map_sqlx)?;

    Ok(rows
        .into_iter()
        .map(DbBooking::into_core)
        .collect::<Result<_>>()?)
}

async fn insert_booking(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    booking: &Booking,
) -> EngineResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bookings
            (id, mentor_id, student_id, start_utc, end_utc, status, version, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(booking.id)
    .bind(booking.mentor_id)
    .bind(booking.student_id)
    .bind(booking.start_utc)
    .bind(booking.end_utc)
    .bind(booking.status.as_str())
    .bind(booking.version)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

async fn update_booking(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    booking: &Booking,
) -> EngineResult<()> {
    let proposal = booking.proposal.as_ref();
    sqlx::query(
        r#"
        UPDATE bookings
        SET start_utc = $2, end_utc = $3, status = $4, version = $5,
            proposed_start_utc = $6, proposed_end_utc = $7, proposal_reason = $8,
            proposal_initiated_by = $9, proposal_requested_at = $10, updated_at = $11
        WHERE id = $1
        "#,
    )
    .bind(booking.id)
    .bind(booking.start_utc)
    .bind(booking.end_utc)
    .bind(booking.status.as_str())
    .bind(booking.version)
    .bind(proposal.map(|p| p.new_start_utc))
    .bind(proposal.map(|p| p.new_end_utc))
    .bind(proposal.and_then(|p| p.reason.as_deref()))
    .bind(proposal.map(|p| p.initiated_by.as_str()))
    .bind(proposal.map(|p| p.requested_at))
    .bind(booking.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

fn map_sqlx(err: sqlx::Error) -> EngineError {
    if let sqlx::Error::Database(db_err) = &err {
        // 23P01: the no_double_booking exclusion constraint fired
        if db_err.code().as_deref() == Some("23P01") {
            return EngineError::SlotConflict("window already held by another booking".to_string());
        }
    }
    EngineError::Database(err.into())
}
