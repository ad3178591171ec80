//! One per-attribute chain: filter, boundary, interpolate, classify.
//!
//! The chain is pure: it takes an immutable snapshot of the batch and
//! returns either classified records or a skip reason. Writing the artifact
//! and upserting the catalog belong to the orchestrator, so sibling chains
//! never share mutable state.

use crate::classify::ClassifierRegistry;
use crate::geometry::{coordinate_spread, hull_polygon};
use crate::models::{Attribute, ClassifiedRecord, RawReading, SkipReason};
use crate::pipeline::filter::{valid_samples, within_distance};
use crate::pipeline::grid::interpolate;

// ---

/// Below this lat/lon spread (degrees) the geometry is considered
/// degenerate and the hull meaningless.
const SPREAD_TOLERANCE_DEG: f64 = 1e-5;

/// Result of one attribute chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutput {
    Records(Vec<ClassifiedRecord>),
    Skipped(SkipReason),
}

/// Run the full chain for one attribute over one date's batch.
pub fn run_chain(
    batch: &[RawReading],
    attribute: Attribute,
    registry: &ClassifierRegistry,
    distance_threshold_m: f64,
    min_points: usize,
) -> ChainOutput {
    // ---
    let samples = valid_samples(batch, attribute);
    let samples = within_distance(samples, distance_threshold_m);

    if samples.len() < min_points {
        return ChainOutput::Skipped(SkipReason::TooFewPoints {
            have: samples.len(),
            need: min_points,
        });
    }

    let (lat_range, lon_range) = coordinate_spread(&samples);
    if lat_range < SPREAD_TOLERANCE_DEG && lon_range < SPREAD_TOLERANCE_DEG {
        return ChainOutput::Skipped(SkipReason::PointsTooSimilar);
    }

    let Some(boundary) = hull_polygon(&samples) else {
        return ChainOutput::Skipped(SkipReason::EmptyGrid);
    };

    let grid = interpolate(&samples, &boundary);
    if grid.is_empty() {
        return ChainOutput::Skipped(SkipReason::EmptyGrid);
    }

    let records = grid
        .into_iter()
        .map(|cell| ClassifiedRecord {
            latitude: cell.lat,
            longitude: cell.lon,
            value: cell.value,
            color: registry.classify(attribute, cell.value).to_string(),
        })
        .collect();
    ChainOutput::Records(records)
}
