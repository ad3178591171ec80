//! Heatmap generation pipeline.
//!
//! Gateway module (EMBP): the stages live in sibling files and callers go
//! through the re-exports below. `filter` and `grid` are pure stages,
//! `attribute` composes one per-attribute chain, and `orchestrator` fans the
//! chains out per date and owns the artifact/catalog writes.

mod attribute;
mod filter;
mod grid;
mod orchestrator;

pub use attribute::{run_chain, ChainOutput};
pub use filter::{valid_samples, within_distance};
pub use grid::{interpolate, GRID_RESOLUTION};
pub use orchestrator::{Orchestrator, PipelineLimits};
