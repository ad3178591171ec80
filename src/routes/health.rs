// src/routes/health.rs
//! API health check endpoint for the heatmap service.
//!
//! Defines the `/health` route used by container orchestrators and CI
//! pipelines to verify the service is up. Sibling module in the `routes`
//! directory following the Explicit Module Boundary Pattern (EMBP):
//! handlers stay internal, the gateway gets a subrouter.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
///
/// Deliberately lightweight: does not touch the catalog, the reading
/// store, or the artifact directory.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges cleanly with the
/// gateway router regardless of the state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
