//! Sighting ingest endpoint

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::auth::{api_error, ApiError, ApiKeyAuth};
use super::AppState;
use crate::pipeline::IntakeError;
use crate::types::{SightingReport, VehicleRecord, WatchlistHit};

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub sighting_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<Uuid>,
    pub vehicle_data: Option<VehicleRecord>,
    pub watchlist_hit: Option<WatchlistHit>,
}

/// POST /api/plates
pub async fn ingest_sighting(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SightingReport>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let Json(report) = payload.map_err(|rejection| {
        let status = match &rejection {
            JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        api_error(status, rejection.body_text())
    })?;

    let outcome = state.intake.process(report).await.map_err(|e| match e {
        IntakeError::Invalid(errors) => api_error(StatusCode::BAD_REQUEST, errors.join("; ")),
        IntakeError::Persist { sighting_id, source } => {
            error!(sighting_id = %sighting_id, error = %source, "Sighting persistence failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to record sighting")
        }
        IntakeError::Dispatch { sighting_id, source } => {
            error!(sighting_id = %sighting_id, error = %source, "Alert persistence failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Sighting {sighting_id} recorded but its alert could not be stored"),
            )
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            success: true,
            sighting_id: outcome.sighting_id,
            alert_id: outcome.alert_id(),
            vehicle_data: outcome.vehicle,
            watchlist_hit: outcome.hit,
        }),
    ))
}
