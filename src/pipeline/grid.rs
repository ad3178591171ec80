//! Lattice construction and nearest-neighbor interpolation.

use geo::Polygon;

use crate::geometry::boundary_contains;
use crate::models::SamplePoint;

// ---

/// Lattice resolution per axis (100x100 cells over the bounding box).
pub const GRID_RESOLUTION: usize = 100;

/// Interpolate the filtered samples onto a regular lattice clipped to the
/// boundary polygon.
///
/// Only lattice points strictly inside the boundary are retained, so no
/// value is ever extrapolated outside the sample convex hull. Each retained
/// point takes the value of its nearest sample (nearest-neighbor; the source
/// data is sparse and irregular, so blended methods would smear band edges).
/// Non-finite interpolated values are dropped.
pub fn interpolate(samples: &[SamplePoint], boundary: &Polygon<f64>) -> Vec<SamplePoint> {
    // ---
    if samples.is_empty() {
        return Vec::new();
    }

    let lat_axis = axis(samples.iter().map(|s| s.lat));
    let lon_axis = axis(samples.iter().map(|s| s.lon));

    let mut grid = Vec::new();
    for &lat in &lat_axis {
        for &lon in &lon_axis {
            if !boundary_contains(boundary, lat, lon) {
                continue;
            }
            let value = nearest_value(samples, lat, lon);
            if value.is_finite() {
                grid.push(SamplePoint { lat, lon, value });
            }
        }
    }
    grid
}

/// Evenly spaced axis over the min..max range of the iterator.
fn axis(values: impl Iterator<Item = f64> + Clone) -> Vec<f64> {
    // ---
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);
    let step = (max - min) / (GRID_RESOLUTION as f64 - 1.0);
    (0..GRID_RESOLUTION)
        .map(|i| min + step * i as f64)
        .collect()
}

/// Value of the sample closest to (lat, lon), Euclidean in degree space.
fn nearest_value(samples: &[SamplePoint], lat: f64, lon: f64) -> f64 {
    // ---
    let mut best = f64::INFINITY;
    let mut value = f64::NAN;
    for s in samples {
        let d = (s.lat - lat).powi(2) + (s.lon - lon).powi(2);
        if d < best {
            best = d;
            value = s.value;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::geometry::hull_polygon;

    fn square_samples() -> Vec<SamplePoint> {
        // Unit square; left edge valued 10, right edge valued 90.
        vec![
            SamplePoint { lat: 0.0, lon: 0.0, value: 10.0 },
            SamplePoint { lat: 1.0, lon: 0.0, value: 10.0 },
            SamplePoint { lat: 0.0, lon: 1.0, value: 90.0 },
            SamplePoint { lat: 1.0, lon: 1.0, value: 90.0 },
        ]
    }

    #[test]
    fn grid_points_stay_inside_hull() {
        // ---
        let samples = vec![
            SamplePoint { lat: 0.0, lon: 0.0, value: 1.0 },
            SamplePoint { lat: 1.0, lon: 0.2, value: 2.0 },
            SamplePoint { lat: 0.5, lon: 1.0, value: 3.0 },
            SamplePoint { lat: 0.1, lon: 0.5, value: 4.0 },
            SamplePoint { lat: 0.9, lon: 0.5, value: 5.0 },
        ];
        let hull = hull_polygon(&samples).unwrap();
        let grid = interpolate(&samples, &hull);
        assert!(!grid.is_empty());
        for cell in &grid {
            assert!(
                crate::geometry::boundary_contains(&hull, cell.lat, cell.lon),
                "cell ({}, {}) escaped the hull",
                cell.lat,
                cell.lon
            );
        }
    }

    #[test]
    fn nearest_neighbor_assigns_closest_sample_value() {
        // ---
        let samples = square_samples();
        let hull = hull_polygon(&samples).unwrap();
        let grid = interpolate(&samples, &hull);
        for cell in &grid {
            if cell.lon < 0.5 {
                assert_eq!(cell.value, 10.0);
            } else if cell.lon > 0.5 {
                assert_eq!(cell.value, 90.0);
            }
        }
        // Both source values survive into the grid.
        assert!(grid.iter().any(|c| c.value == 10.0));
        assert!(grid.iter().any(|c| c.value == 90.0));
    }

    #[test]
    fn collinear_samples_yield_empty_grid() {
        // ---
        let samples: Vec<SamplePoint> = (0..5)
            .map(|i| SamplePoint { lat: 0.0, lon: i as f64, value: 1.0 })
            .collect();
        let hull = hull_polygon(&samples).unwrap();
        assert!(interpolate(&samples, &hull).is_empty());
    }
}
