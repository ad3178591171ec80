//! Heatmap generation and retrieval endpoints.
//!
//! - `POST /process_data` – run the pipeline for one device and date
//! - `POST /process_batch` – run the pipeline over an uploaded raw batch
//! - `POST /get_heatmap_data` – serve one artifact back to a renderer

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::models::{Attribute, RawReading, RunStatus};
use crate::{PipelineError, routes::AppState};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/process_data", post(process_data))
        .route("/process_batch", post(process_batch))
        .route("/get_heatmap_data", post(get_heatmap_data))
}

// ---

#[derive(Debug, Deserialize)]
struct ProcessDataRequest {
    device_id: Option<String>,
    date: Option<String>,
}

async fn process_data(
    State(state): State<AppState>,
    Json(payload): Json<ProcessDataRequest>,
) -> impl IntoResponse {
    // ---
    info!("POST /process_data - {payload:?}");

    let Some(device_id) = payload.device_id.filter(|d| !d.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Device ID is required" })),
        )
            .into_response();
    };
    let Some(date) = payload.date.filter(|d| !d.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Date is required" })),
        )
            .into_response();
    };

    let result = state
        .orchestrator
        .generate_for_device(
            state.source.as_ref(),
            &device_id,
            &Attribute::ALL,
            Some(&date),
        )
        .await;
    status_response(result)
}

async fn process_batch(
    State(state): State<AppState>,
    Json(rows): Json<Vec<RawReading>>,
) -> impl IntoResponse {
    // ---
    info!("POST /process_batch - {} rows", rows.len());

    let result = state
        .orchestrator
        .generate_from_batch(rows, &Attribute::ALL)
        .await;
    status_response(result)
}

/// Map a pipeline outcome to an HTTP response with the status message.
fn status_response(result: crate::Result<RunStatus>) -> axum::response::Response {
    // ---
    match result {
        Ok(status) => {
            let code = match &status {
                RunStatus::Success { .. } => StatusCode::OK,
                RunStatus::DeviceNotFound { .. } | RunStatus::DateNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                RunStatus::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (code, Json(json!({ "message": status.message() }))).into_response()
        }
        Err(PipelineError::Input(msg)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
        }
        Err(e) => {
            error!("Pipeline failure: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

// ---

#[derive(Debug, Deserialize)]
struct HeatmapDataRequest {
    device_id: Option<String>,
    date: Option<String>,
    attribute: Option<String>,
}

async fn get_heatmap_data(
    State(state): State<AppState>,
    Json(payload): Json<HeatmapDataRequest>,
) -> impl IntoResponse {
    // ---
    info!("POST /get_heatmap_data - {payload:?}");

    let (Some(device_id), Some(date), Some(attribute)) =
        (payload.device_id, payload.date, payload.attribute)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing device_id, date, or attribute parameter" })),
        )
            .into_response();
    };
    let Some(attribute) = Attribute::from_name(&attribute) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Unknown attribute '{attribute}'") })),
        )
            .into_response();
    };

    if !state.artifacts.exists(&device_id, &date, attribute).await {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "File not found" })),
        )
            .into_response();
    }

    match state.artifacts.read_records(&device_id, &date, attribute).await {
        Ok(records) => {
            let all_coordinates: Vec<[f64; 2]> = records
                .iter()
                .map(|r| [r.latitude, r.longitude])
                .collect();
            let data: Vec<serde_json::Value> = records
                .iter()
                .map(|r| {
                    json!({
                        "coordinates": [r.latitude, r.longitude],
                        "value": r.value,
                        "color": r.color,
                    })
                })
                .collect();
            (
                StatusCode::OK,
                Json(json!({ "all_coordinates": all_coordinates, "data": data })),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to read artifact: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
