//! HTTP surface using Axum
//!
//! - `POST /api/plates`          sighting ingest (X-API-Key)
//! - `GET  /ws/dashboard`        live alert feed (X-API-Key or `?api_key=`)
//! - `POST /internal/broadcast`  publish an envelope to the hub (X-API-Key)
//! - `GET  /health`              unauthenticated liveness/readiness

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod plates;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::hub::HubHandle;
use crate::pipeline::IntakeProcessor;
use crate::storage::SightingStore;

/// Shared handler state
pub struct AppState {
    pub intake: IntakeProcessor,
    pub hub: HubHandle,
    pub store: Arc<dyn SightingStore>,
    pub config: ServiceConfig,
}

/// Restrictive by default. `SENTINEL_CORS_ORIGINS` takes a comma-separated
/// origin list for a dashboard served from elsewhere.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(auth::API_KEY_HEADER)]);

    match std::env::var("SENTINEL_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_payload_size;

    Router::new()
        .route("/api/plates", post(plates::ingest_sighting))
        .route("/ws/dashboard", get(dashboard::dashboard_ws))
        .route("/internal/broadcast", post(dashboard::publish_broadcast))
        .route("/health", get(health::get_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer())
        .with_state(state)
}
