//! API key authentication extractors

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn unauthorized() -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "Unauthorized")
}

fn header_key(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
}

/// Caller presented the service key in `X-API-Key`
pub struct ApiKeyAuth;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ApiKeyAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match header_key(parts) {
            Some(key) if key == state.config.server.api_key => Ok(ApiKeyAuth),
            _ => Err(unauthorized()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ViewerQuery {
    api_key: Option<String>,
}

/// Dashboard viewer. Browsers cannot set headers on a websocket handshake,
/// so `?api_key=` is accepted as well.
pub struct ViewerAuth;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ViewerAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.config.server.api_key.as_str();
        if header_key(parts) == Some(expected) {
            return Ok(ViewerAuth);
        }

        let query = Query::<ViewerQuery>::try_from_uri(&parts.uri).ok();
        match query.and_then(|Query(q)| q.api_key) {
            Some(key) if key == expected => Ok(ViewerAuth),
            _ => Err(unauthorized()),
        }
    }
}
