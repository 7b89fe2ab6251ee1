//! # Mentorbook API
//!
//! Web server for the availability and booking engine. It exposes RESTful
//! endpoints for managing mentor availability, resolving bookable slots,
//! and driving the booking lifecycle.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Middleware**: Provide cross-cutting concerns like error handling
//! - **Config**: Handle environment and application configuration
//!
//! Handlers talk to storage only through the `EngineStore` trait, so the
//! same router runs against Postgres in production and the in-memory store
//! in tests.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use eyre::{Result, eyre};
use mentorbook_core::store::EngineStore;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers.
pub struct ApiState {
    /// Storage backend behind the engine's atomicity contract
    pub store: Arc<dyn EngineStore>,
}

/// Builds the application router over the given storage backend.
pub fn router(store: Arc<dyn EngineStore>) -> Router {
    let state = Arc::new(ApiState { store });

    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Availability management endpoints
        .merge(routes::availability::routes())
        // Booking lifecycle endpoints
        .merge(routes::booking::routes())
        // Attach shared state to all routes
        .with_state(state)
}

/// Starts the API server with the provided configuration and storage
/// backend. Initializes logging, configures routes, and serves until the
/// process is stopped.
pub async fn start_server(config: config::ApiConfig, store: Arc<dyn EngineStore>) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let app = router(store);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let mut allowed: Vec<axum::http::HeaderValue> = Vec::with_capacity(origins.len());
        for origin in origins {
            allowed.push(
                origin
                    .parse()
                    .map_err(|_| eyre!("invalid CORS origin: {origin}"))?,
            );
        }
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(allowed)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout middleware
    let app = app.layer(tower_http::timeout::TimeoutLayer::new(
        std::time::Duration::from_secs(config.request_timeout),
    ));

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
