//! Validity and distance filtering of raw readings.
//!
//! Validity runs first so the distance filter's centroid is computed only
//! from rows with usable coordinates.

use crate::geometry::{centroid, haversine_m};
use crate::models::{Attribute, RawReading, SamplePoint};

// ---

/// Coerce one batch into samples for an attribute.
///
/// Drops rows where latitude, longitude, or the attribute value is missing
/// or non-numeric, and rows at exactly (0, 0) - the "no GPS fix" sentinel.
pub fn valid_samples(batch: &[RawReading], attribute: Attribute) -> Vec<SamplePoint> {
    // ---
    batch
        .iter()
        .filter_map(|row| {
            let lat = row.latitude_f64()?;
            let lon = row.longitude_f64()?;
            let value = row.attribute_f64(attribute)?;
            if lat == 0.0 && lon == 0.0 {
                return None;
            }
            Some(SamplePoint { lat, lon, value })
        })
        .collect()
}

/// Keep samples within `threshold_m` meters of the batch centroid.
///
/// An empty result is not an error; downstream stages handle zero rows.
pub fn within_distance(samples: Vec<SamplePoint>, threshold_m: f64) -> Vec<SamplePoint> {
    // ---
    let Some((mean_lat, mean_lon)) = centroid(&samples) else {
        return samples;
    };
    samples
        .into_iter()
        .filter(|s| haversine_m(s.lat, s.lon, mean_lat, mean_lon) <= threshold_m)
        .collect()
}
