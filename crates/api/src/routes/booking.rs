use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/bookings", post(handlers::booking::create_booking))
        .route(
            "/api/bookings/:booking_id",
            get(handlers::booking::get_booking),
        )
        .route(
            "/api/mentors/:mentor_id/bookings",
            get(handlers::booking::list_mentor_bookings),
        )
        .route(
            "/api/bookings/:booking_id/confirm",
            post(handlers::booking::confirm_booking),
        )
        .route(
            "/api/bookings/:booking_id/reschedule",
            post(handlers::booking::request_reschedule),
        )
        .route(
            "/api/bookings/:booking_id/reschedule/respond",
            post(handlers::booking::respond_reschedule),
        )
        .route(
            "/api/bookings/:booking_id/cancel",
            post(handlers::booking::cancel_booking),
        )
        .route(
            "/api/bookings/:booking_id/complete",
            post(handlers::booking::complete_booking),
        )
}
