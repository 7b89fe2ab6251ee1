//! # Availability Handlers
//!
//! Handlers for managing a mentor's availability profile and resolving it
//! into concrete bookable slots.
//!
//! The profile itself is declarative (weekly rules plus date overrides,
//! all in the mentor's timezone); the slots endpoint runs the resolver
//! over a UTC range and returns merged, timezone-projected intervals.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Duration, Utc};
use mentorbook_core::errors::EngineError;
use mentorbook_core::models::availability::{
    AvailabilityProfileResponse, DateOverride, SetProfileActiveRequest, SetWeeklyRulesRequest,
    parse_timezone,
};
use mentorbook_core::models::slot::SlotView;
use mentorbook_core::resolver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

/// Longest slot-resolution range a single request may ask for.
const MAX_RESOLVE_DAYS: i64 = 92;

/// Query parameters for the slot resolution endpoint.
///
/// `start` and `end` are RFC 3339 instants bounding the UTC range to
/// resolve; `timezone` optionally projects the response into a viewer
/// timezone (defaults to the mentor's own).
#[derive(Debug, Deserialize)]
pub struct ResolveSlotsQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: Option<String>,
}

/// Response body for the slot resolution endpoint.
#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub mentor_id: Uuid,
    /// Timezone the slot bounds are projected into
    pub timezone: String,
    pub slots: Vec<SlotView>,
}

/// Returns the mentor's declarative availability profile.
///
/// # Endpoint
///
/// ```text
/// GET /api/mentors/:mentor_id/availability
/// ```
#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    Path(mentor_id): Path<Uuid>,
) -> Result<Json<AvailabilityProfileResponse>, AppError> {
    let profile = state.store.get_profile(mentor_id).await?.ok_or_else(|| {
        EngineError::NotFound(format!(
            "availability profile for mentor {mentor_id} not found"
        ))
    })?;
    Ok(Json(profile.into()))
}

/// Replaces the mentor's weekly rule set, creating the profile on first
/// write.
///
/// # Endpoint
///
/// ```text
/// PUT /api/mentors/:mentor_id/availability/rules
/// ```
#[axum::debug_handler]
pub async fn set_weekly_rules(
    State(state): State<Arc<ApiState>>,
    Path(mentor_id): Path<Uuid>,
    Json(request): Json<SetWeeklyRulesRequest>,
) -> Result<Json<AvailabilityProfileResponse>, AppError> {
    let profile = state
        .store
        .set_weekly_rules(mentor_id, request.timezone, request.rules)
        .await?;
    Ok(Json(profile.into()))
}

/// Inserts or replaces the date override for the date in the body.
///
/// # Endpoint
///
/// ```text
/// PUT /api/mentors/:mentor_id/availability/overrides
/// ```
#[axum::debug_handler]
pub async fn set_date_override(
    State(state): State<Arc<ApiState>>,
    Path(mentor_id): Path<Uuid>,
    Json(date_override): Json<DateOverride>,
) -> Result<Json<AvailabilityProfileResponse>, AppError> {
    let profile = state
        .store
        .set_date_override(mentor_id, date_override)
        .await?;
    Ok(Json(profile.into()))
}

/// Soft-enables or disables the whole profile. Disabling blocks new
/// bookings but leaves existing ones untouched.
///
/// # Endpoint
///
/// ```text
/// PUT /api/mentors/:mentor_id/availability/active
/// ```
#[axum::debug_handler]
pub async fn set_profile_active(
    State(state): State<Arc<ApiState>>,
    Path(mentor_id): Path<Uuid>,
    Json(request): Json<SetProfileActiveRequest>,
) -> Result<Json<AvailabilityProfileResponse>, AppError> {
    let profile = state
        .store
        .set_profile_active(mentor_id, request.is_active)
        .await?;
    Ok(Json(profile.into()))
}

/// Resolves the mentor's profile into concrete bookable slots over a UTC
/// range.
///
/// # Endpoint
///
/// ```text
/// GET /api/mentors/:mentor_id/slots?start=...&end=...&timezone=Asia/Ulaanbaatar
/// ```
///
/// An inactive profile resolves to an empty slot list rather than an
/// error, so listings can keep rendering the mentor.
#[axum::debug_handler]
pub async fn resolve_slots(
    State(state): State<Arc<ApiState>>,
    Path(mentor_id): Path<Uuid>,
    Query(query): Query<ResolveSlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    if query.end <= query.start {
        return Err(AppError(EngineError::validation(
            "start",
            "range start must be before range end",
        )));
    }
    if query.end - query.start > Duration::days(MAX_RESOLVE_DAYS) {
        return Err(AppError(EngineError::validation(
            "end",
            format!("range may span at most {MAX_RESOLVE_DAYS} days"),
        )));
    }

    let profile = state.store.get_profile(mentor_id).await?.ok_or_else(|| {
        EngineError::NotFound(format!(
            "availability profile for mentor {mentor_id} not found"
        ))
    })?;

    let display_timezone = query.timezone.unwrap_or_else(|| profile.timezone.clone());
    let tz = parse_timezone(&display_timezone)?;

    let slots = if profile.is_active {
        resolver::resolve(&profile, query.start, query.end)?
            .map(|slot| slot.in_zone(tz))
            .collect()
    } else {
        Vec::new()
    };

    Ok(Json(SlotsResponse {
        mentor_id,
        timezone: display_timezone,
        slots,
    }))
}
