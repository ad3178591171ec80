//! Spatial primitives for the heatmap pipeline: great-circle distance,
//! centroid, coordinate spread, and the convex hull boundary used to clip
//! the interpolation lattice.

use geo::{Contains, ConvexHull, MultiPoint, Point, Polygon};

use crate::models::SamplePoint;

// ---

/// Earth radius in meters, as used by the distance filter.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two lat/lon pairs (haversine).
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    // ---
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = phi2 - phi1;
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Arithmetic mean of the sample coordinates, `(lat, lon)`.
pub fn centroid(samples: &[SamplePoint]) -> Option<(f64, f64)> {
    // ---
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let lat = samples.iter().map(|s| s.lat).sum::<f64>() / n;
    let lon = samples.iter().map(|s| s.lon).sum::<f64>() / n;
    Some((lat, lon))
}

/// Peak-to-peak range of latitude and longitude, `(lat_range, lon_range)`.
pub fn coordinate_spread(samples: &[SamplePoint]) -> (f64, f64) {
    // ---
    let mut lat_min = f64::INFINITY;
    let mut lat_max = f64::NEG_INFINITY;
    let mut lon_min = f64::INFINITY;
    let mut lon_max = f64::NEG_INFINITY;
    for s in samples {
        lat_min = lat_min.min(s.lat);
        lat_max = lat_max.max(s.lat);
        lon_min = lon_min.min(s.lon);
        lon_max = lon_max.max(s.lon);
    }
    if samples.is_empty() {
        (0.0, 0.0)
    } else {
        (lat_max - lat_min, lon_max - lon_min)
    }
}

/// Convex hull of the sample coordinates as a `geo` polygon.
///
/// Returns `None` for fewer than 3 points. Collinear inputs produce a
/// zero-area polygon whose containment test rejects everything, which the
/// interpolator reports as an empty grid.
pub fn hull_polygon(samples: &[SamplePoint]) -> Option<Polygon<f64>> {
    // ---
    if samples.len() < 3 {
        return None;
    }
    let points: Vec<Point<f64>> = samples.iter().map(|s| Point::new(s.lon, s.lat)).collect();
    Some(MultiPoint::from(points).convex_hull())
}

/// True when the coordinate lies strictly inside the boundary polygon.
pub fn boundary_contains(boundary: &Polygon<f64>, lat: f64, lon: f64) -> bool {
    boundary.contains(&Point::new(lon, lat))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn sample(lat: f64, lon: f64) -> SamplePoint {
        SamplePoint {
            lat,
            lon,
            value: 0.0,
        }
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        // ---
        // One degree of latitude is 2*pi*R/360 ~= 111.19 km
        let d = haversine_m(10.0, 77.0, 11.0, 77.0);
        assert!((d - 111_194.93).abs() < 1.0, "got {d}");
    }

    #[test]
    fn haversine_zero_for_identical_points() {
        assert_eq!(haversine_m(12.9716, 77.5946, 12.9716, 77.5946), 0.0);
    }

    #[test]
    fn centroid_is_coordinate_mean() {
        // ---
        let samples = vec![sample(10.0, 70.0), sample(12.0, 74.0)];
        assert_eq!(centroid(&samples), Some((11.0, 72.0)));
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn spread_is_peak_to_peak() {
        // ---
        let samples = vec![sample(10.0, 70.0), sample(10.5, 70.2), sample(9.8, 70.1)];
        let (lat_range, lon_range) = coordinate_spread(&samples);
        assert!((lat_range - 0.7).abs() < 1e-12);
        assert!((lon_range - 0.2).abs() < 1e-12);
    }

    #[test]
    fn hull_contains_interior_not_exterior() {
        // ---
        let samples = vec![
            sample(0.0, 0.0),
            sample(0.0, 1.0),
            sample(1.0, 1.0),
            sample(1.0, 0.0),
        ];
        let hull = hull_polygon(&samples).unwrap();
        assert!(boundary_contains(&hull, 0.5, 0.5));
        assert!(!boundary_contains(&hull, 1.5, 0.5));
        // boundary points are not strictly inside
        assert!(!boundary_contains(&hull, 0.0, 0.5));
    }

    #[test]
    fn hull_requires_three_points() {
        // ---
        assert!(hull_polygon(&[sample(0.0, 0.0), sample(1.0, 1.0)]).is_none());
    }

    #[test]
    fn collinear_hull_contains_nothing() {
        // ---
        let samples = vec![
            sample(0.0, 0.0),
            sample(0.0, 1.0),
            sample(0.0, 2.0),
            sample(0.0, 3.0),
        ];
        let hull = hull_polygon(&samples).unwrap();
        assert!(!boundary_contains(&hull, 0.0, 1.5));
    }
}
