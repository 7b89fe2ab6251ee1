use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/mentors/:mentor_id/availability",
            get(handlers::availability::get_availability),
        )
        .route(
            "/api/mentors/:mentor_id/availability/rules",
            put(handlers::availability::set_weekly_rules),
        )
        .route(
            "/api/mentors/:mentor_id/availability/overrides",
            put(handlers::availability::set_date_override),
        )
        .route(
            "/api/mentors/:mentor_id/availability/active",
            put(handlers::availability::set_profile_active),
        )
        .route(
            "/api/mentors/:mentor_id/slots",
            get(handlers::availability::resolve_slots),
        )
}
