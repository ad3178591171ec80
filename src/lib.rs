//! Core library for the `soilgrid` backend service.
//!
//! Converts raw, geo-tagged soil sensor readings (nitrogen, phosphorus,
//! potassium, pH, conductivity, moisture) for one device on one day into a
//! filtered, interpolated, color-classified grid, persisted as a flat CSV
//! record set and indexed in a relational catalog.
//!
//! Module layout follows the Explicit Module Boundary Pattern (EMBP):
//! - `pipeline` holds the heatmap generation chain and its orchestrator
//! - `source`, `catalog`, and `artifact` are the narrow seams to the raw
//!   reading store, the Postgres catalog, and the filesystem artifact store
//! - `routes` is the HTTP gateway; `config` and `schema` support startup
//!
//! The binary (`main.rs`) wires concrete implementations of the seams into
//! the orchestrator; tests substitute in-memory doubles.

pub mod artifact;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod geometry;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod schema;
pub mod source;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use models::{Attribute, ClassifiedRecord, RawReading, RunStatus, SamplePoint, SkipReason};
