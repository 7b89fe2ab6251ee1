//! # Booking Handlers
//!
//! Handlers for the booking lifecycle. Each mutation goes through the
//! reservation coordinator, which checks the mentor's availability against
//! a single profile snapshot and delegates the atomic conflict-check and
//! write to the store. Every mutation body carries the booking `version`
//! the caller last observed; a superseded version yields `stale_booking`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use mentorbook_core::coordinator;
use mentorbook_core::errors::EngineError;
use mentorbook_core::models::booking::{
    Booking, CancelBookingRequest, CompleteBookingRequest, ConfirmBookingRequest,
    CreateBookingRequest, RescheduleDecision, RescheduleRequest, RespondRescheduleRequest,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

/// Reserves a new pending booking.
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings
/// ```
#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = coordinator::create_booking(
        state.store.as_ref(),
        request.mentor_id,
        request.student_id,
        request.start_utc,
        request.end_utc,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Fetches a single booking.
///
/// # Endpoint
///
/// ```text
/// GET /api/bookings/:booking_id
/// ```
#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .store
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("booking {booking_id} not found")))?;
    Ok(Json(booking))
}

/// Lists all bookings for a mentor, ordered by start time.
///
/// # Endpoint
///
/// ```text
/// GET /api/mentors/:mentor_id/bookings
/// ```
#[axum::debug_handler]
pub async fn list_mentor_bookings(
    State(state): State<Arc<ApiState>>,
    Path(mentor_id): Path<Uuid>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.store.list_bookings(mentor_id).await?))
}

/// Confirms a pending booking (mentor only).
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings/:booking_id/confirm
/// ```
#[axum::debug_handler]
pub async fn confirm_booking(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<ConfirmBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = coordinator::confirm_booking(
        state.store.as_ref(),
        booking_id,
        request.actor_id,
        request.version,
    )
    .await?;
    Ok(Json(booking))
}

/// Proposes a new window for a booking. The old interval stays reserved
/// while the counterparty decides.
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings/:booking_id/reschedule
/// ```
#[axum::debug_handler]
pub async fn request_reschedule(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = coordinator::request_reschedule(
        state.store.as_ref(),
        booking_id,
        request.actor_id,
        request.new_start_utc,
        request.new_end_utc,
        request.reason,
        request.version,
    )
    .await?;
    Ok(Json(booking))
}

/// Accepts or rejects a pending reschedule proposal (counterparty only).
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings/:booking_id/reschedule/respond
/// ```
#[axum::debug_handler]
pub async fn respond_reschedule(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<RespondRescheduleRequest>,
) -> Result<Json<Booking>, AppError> {
    let accept = matches!(request.decision, RescheduleDecision::Accept);
    let booking = coordinator::respond_reschedule(
        state.store.as_ref(),
        booking_id,
        request.actor_id,
        accept,
        request.version,
    )
    .await?;
    Ok(Json(booking))
}

/// Cancels a booking (either party).
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings/:booking_id/cancel
/// ```
#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = coordinator::cancel_booking(
        state.store.as_ref(),
        booking_id,
        request.actor_id,
        request.version,
    )
    .await?;
    Ok(Json(booking))
}

/// Marks a confirmed booking completed once its end time has passed.
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings/:booking_id/complete
/// ```
#[axum::debug_handler]
pub async fn complete_booking(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<CompleteBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking =
        coordinator::complete_booking(state.store.as_ref(), booking_id, request.version).await?;
    Ok(Json(booking))
}
