//! Health check endpoint

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub db_connected: bool,
    pub live_sessions: usize,
    pub timestamp: DateTime<Utc>,
}

/// GET /health
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let db_ok = state.store.is_healthy().await;
    let live_sessions = state.hub.session_count().await;

    Json(HealthResponse {
        status: if db_ok && live_sessions.is_ok() {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        db_connected: db_ok,
        live_sessions: live_sessions.unwrap_or(0),
        timestamp: Utc::now(),
    })
}
