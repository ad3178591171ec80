//! HTTP gateway for the heatmap service (EMBP).
//!
//! Sibling modules own their endpoints and export subrouters; this gateway
//! merges them so `main.rs` never sees individual routes.

use std::sync::Arc;

use axum::Router;

use crate::artifact::ArtifactStore;
use crate::catalog::Catalog;
use crate::pipeline::Orchestrator;
use crate::source::ReadingSource;
use crate::Config;

mod devices;
mod health;
mod heatmaps;

// ---

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub source: Arc<dyn ReadingSource>,
    pub catalog: Arc<dyn Catalog>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub orchestrator: Arc<Orchestrator>,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(heatmaps::router())
        .merge(devices::router())
        .merge(health::router())
        .with_state(state)
}
