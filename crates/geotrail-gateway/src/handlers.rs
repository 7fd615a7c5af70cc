// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the location query API.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use geotrail_core::{GeotrailError, HealthStatus, RecentLogEntry};
use geotrail_history::{CurrentLocation, DeviceHistoryView, DeviceListing};

use crate::server::AppState;

/// Rows returned by `/api/debug/gps-logs`.
const DEBUG_LOG_LIMIT: usize = 10;

/// Query string for the history route.
///
/// `days` is kept as text so a malformed value gets the JSON error body
/// instead of axum's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub days: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Binary version.
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A failure already mapped to its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<GeotrailError> for ApiError {
    fn from(err: GeotrailError) -> Self {
        if err.is_not_found() {
            return Self {
                status: StatusCode::NOT_FOUND,
                message: "Device not found".to_string(),
            };
        }
        tracing::error!(error = %err, store_unavailable = err.is_store_unavailable(), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// GET /api/locations
pub async fn get_locations(
    State(state): State<AppState>,
) -> Result<Json<Vec<CurrentLocation>>, ApiError> {
    Ok(Json(state.service.list_current_locations().await?))
}

/// GET /api/device/{number}/history?days=N
pub async fn get_device_history(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<DeviceHistoryView>, ApiError> {
    let requested = match query.days.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
            ApiError::bad_request(format!("days must be an integer, got '{raw}'"))
        })?),
    };
    let days = state.service.window_days(requested).ok_or_else(|| {
        ApiError::bad_request(format!(
            "days must be between 1 and {}",
            state.service.max_window_days()
        ))
    })?;

    Ok(Json(state.service.device_history(&number, days).await?))
}

/// GET /api/devices
pub async fn get_devices(
    State(state): State<AppState>,
) -> Result<Json<Vec<DeviceListing>>, ApiError> {
    Ok(Json(state.service.list_devices().await?))
}

/// GET /api/debug/gps-logs
pub async fn get_gps_logs(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecentLogEntry>>, ApiError> {
    Ok(Json(state.service.recent_location_logs(DEBUG_LOG_LIMIT).await?))
}

/// GET /health
///
/// 200 while the store answers, 503 otherwise.
pub async fn get_health(State(state): State<AppState>) -> Response {
    let (code, status) = match state.store.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => {
            (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {reason}"))
        }
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {e}")),
    };
    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    };
    (code, Json(body)).into_response()
}
