//! Error taxonomy for the heatmap pipeline.
//!
//! Only hard failures live here. Soft halts (too few points, degenerate
//! geometry, empty clipped grid) are represented by
//! [`crate::models::SkipReason`] and reported as status values, never as
//! errors, so one attribute giving up does not disturb its siblings.

use thiserror::Error;

/// Errors that can occur while generating heatmaps.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing or malformed caller input (empty device id, empty batch).
    #[error("invalid input: {0}")]
    Input(String),

    /// The raw reading source failed or returned garbage.
    #[error("reading source error: {0}")]
    Source(String),

    /// Catalog or artifact store failure.
    #[error("store error: {0}")]
    Store(String),
}

impl PipelineError {
    /// Create an Input error.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Create a Store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        Self::Source(err.to_string())
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
