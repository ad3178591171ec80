//! Device discovery endpoints, served from the catalog.
//!
//! - `GET /devices` – every device with at least one heatmap
//! - `GET /devices/{device_id}/dates` – dates with artifacts for a device

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::error;

use crate::routes::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/devices", get(list_devices))
        .route("/devices/{device_id}/dates", get(list_dates))
}

async fn list_devices(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    match state.catalog.devices().await {
        Ok(devices) => (StatusCode::OK, Json(json!({ "devices": devices }))).into_response(),
        Err(e) => {
            error!("Failed to list devices: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn list_dates(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> impl IntoResponse {
    // ---
    match state.catalog.dates_for(&device_id).await {
        Ok(dates) if dates.is_empty() => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Device ID '{device_id}' not found.") })),
        )
            .into_response(),
        Ok(dates) => (StatusCode::OK, Json(json!({ "dates": dates }))).into_response(),
        Err(e) => {
            error!("Failed to list dates for {device_id}: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
