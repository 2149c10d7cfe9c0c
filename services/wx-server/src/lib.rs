//! Read-only HTTP API over stored METAR, TAF and ICAO location data.
//!
//! Endpoints:
//! - `/metar/{CODE}`, `/taf/{CODE}`, `/location/{CODE}`, `/all/{CODE}`
//! - the same endpoints with `?location=CODE1,CODE2` for up to 16 locations
//! - `/` and `/help` documentation pages
//! - `/health` and `/ready` checks

pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use state::AppState;

/// Build the application router.
///
/// Data endpoints are served by the fallback so that any path outside the
/// known routes gets the same 403 answer.
pub fn build_router(state: Arc<AppState>) -> Router {
    let request_timeout = state.config.request_timeout;

    Router::new()
        // Documentation
        .route("/", get(handlers::index_handler))
        .route("/help", get(handlers::help_handler))
        .route("/help/", get(handlers::help_handler))
        // Health
        .route("/health", get(handlers::health_handler))
        .route("/ready", get(handlers::ready_handler))
        // Data endpoints
        .fallback(handlers::weather_handler)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::method_guard,
        ))
        .layer(Extension(state))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
