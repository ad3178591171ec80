//! Data models for the soil heatmap pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---

/// One raw reading as delivered by the realtime store or a CSV upload.
///
/// Latitude, longitude, and the soil attributes arrive as raw JSON values
/// because devices report them inconsistently (numbers or numeric strings).
/// Anything non-convertible is treated as missing, never coerced to zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReading {
    // ---
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
    #[serde(flatten)]
    pub attributes: HashMap<String, Value>,
}

/// Coerce a raw JSON value to a finite f64, or treat it as missing.
pub fn numeric(value: &Value) -> Option<f64> {
    // ---
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

impl RawReading {
    // ---
    pub fn latitude_f64(&self) -> Option<f64> {
        self.latitude.as_ref().and_then(numeric)
    }

    pub fn longitude_f64(&self) -> Option<f64> {
        self.longitude.as_ref().and_then(numeric)
    }

    /// Look up an attribute value under any of its known field names.
    pub fn attribute_f64(&self, attribute: Attribute) -> Option<f64> {
        // ---
        attribute
            .aliases()
            .iter()
            .find_map(|name| self.attributes.get(*name))
            .and_then(numeric)
    }

    /// True when both coordinates coerce to finite numbers. Used for the
    /// date-level minimum point count, before any attribute is considered.
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude_f64().is_some() && self.longitude_f64().is_some()
    }
}

// ---

/// The six soil attributes a device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Nitrogen,
    Phosphorus,
    Potassium,
    Ph,
    Conductivity,
    Moisture,
}

impl Attribute {
    // ---
    pub const ALL: [Attribute; 6] = [
        Attribute::Nitrogen,
        Attribute::Phosphorus,
        Attribute::Potassium,
        Attribute::Ph,
        Attribute::Conductivity,
        Attribute::Moisture,
    ];

    /// Canonical lowercase name, used for artifact paths and catalog rows.
    pub fn name(&self) -> &'static str {
        // ---
        match self {
            Attribute::Nitrogen => "nitrogen",
            Attribute::Phosphorus => "phosphorus",
            Attribute::Potassium => "potassium",
            Attribute::Ph => "ph",
            Attribute::Conductivity => "conductivity",
            Attribute::Moisture => "moisture",
        }
    }

    /// Field names this attribute appears under in device payloads.
    /// Older firmware reports `phosphor` and `pH`.
    pub fn aliases(&self) -> &'static [&'static str] {
        // ---
        match self {
            Attribute::Nitrogen => &["nitrogen"],
            Attribute::Phosphorus => &["phosphorus", "phosphor"],
            Attribute::Potassium => &["potassium"],
            Attribute::Ph => &["ph", "pH"],
            Attribute::Conductivity => &["conductivity"],
            Attribute::Moisture => &["moisture"],
        }
    }

    /// Parse an attribute name, accepting any alias case-insensitively.
    pub fn from_name(name: &str) -> Option<Attribute> {
        // ---
        let lowered = name.trim().to_ascii_lowercase();
        Attribute::ALL
            .into_iter()
            .find(|a| a.aliases().iter().any(|n| n.eq_ignore_ascii_case(&lowered)))
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---

/// A filtered sample: numeric coordinates plus one attribute value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    // ---
    pub lat: f64,
    pub lon: f64,
    pub value: f64,
}

/// The unit written to an artifact: one classified grid cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    // ---
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
    pub color: String,
}

// ---

/// Why an attribute chain halted without producing an artifact.
///
/// These are soft outcomes: the attribute is simply excluded from the date's
/// pass/fail aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer filtered points than the configured minimum.
    TooFewPoints { have: usize, need: usize },
    /// Latitude and longitude ranges both below the 1e-5 degree tolerance.
    PointsTooSimilar,
    /// No lattice points inside the hull (includes degenerate geometry).
    EmptyGrid,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // ---
        match self {
            SkipReason::TooFewPoints { have, need } => {
                write!(f, "not enough valid points ({have} of {need} required)")
            }
            SkipReason::PointsTooSimilar => write!(f, "points are too similar"),
            SkipReason::EmptyGrid => write!(f, "no grid points within the convex hull"),
        }
    }
}

// ---

/// Outcome of one generation request, rendered for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Success { device_id: String, date: String },
    DeviceNotFound { device_id: String },
    DateNotFound { device_id: String, date: String },
    InsufficientData { device_id: String, date: String },
}

impl RunStatus {
    /// Human-readable status message returned by the API.
    pub fn message(&self) -> String {
        // ---
        match self {
            RunStatus::Success { device_id, date } => {
                format!("Heatmap generated successfully for device {device_id} on date {date}.")
            }
            RunStatus::DeviceNotFound { device_id } => {
                format!("No timestamps found for device {device_id}.")
            }
            RunStatus::DateNotFound { device_id, date } => {
                format!("No data found for device {device_id} on date {date}.")
            }
            RunStatus::InsufficientData { device_id, date } => {
                format!("No valid data points available for device {device_id} on date {date}.")
            }
        }
    }
}
