//! Color classification of interpolated soil attribute values.
//!
//! One shared registry maps each attribute to an ordered list of threshold
//! bands. Both the device/date path and the raw-batch path classify through
//! this registry, so the tables exist in exactly one place.

use std::collections::HashMap;

use crate::models::Attribute;

// ---

/// Label for values not covered by any band (negative readings, table gaps).
pub const UNCLASSIFIED: &str = "gray";

/// One threshold band: a value interval with explicit bound inclusivity.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    lo: f64,
    lo_inclusive: bool,
    hi: f64,
    hi_inclusive: bool,
    color: &'static str,
}

impl Band {
    // ---
    const fn new(
        lo: f64,
        lo_inclusive: bool,
        hi: f64,
        hi_inclusive: bool,
        color: &'static str,
    ) -> Self {
        Band {
            lo,
            lo_inclusive,
            hi,
            hi_inclusive,
            color,
        }
    }

    fn contains(&self, value: f64) -> bool {
        // ---
        let above = if self.lo_inclusive {
            value >= self.lo
        } else {
            value > self.lo
        };
        let below = if self.hi_inclusive {
            value <= self.hi
        } else {
            value < self.hi
        };
        above && below
    }
}

// ---

const PHOSPHORUS_BANDS: [Band; 4] = [
    Band::new(0.0, true, 11.0, false, "lightyellow"),
    Band::new(11.0, true, 21.0, false, "lightblue"),
    Band::new(21.0, true, 40.0, true, "blue"),
    Band::new(40.0, false, f64::INFINITY, false, "darkblue"),
];

const NITROGEN_BANDS: [Band; 4] = [
    Band::new(0.0, true, 11.0, false, "lightyellow"),
    Band::new(11.0, true, 21.0, false, "lightgreen"),
    Band::new(21.0, true, 40.0, true, "green"),
    Band::new(40.0, false, f64::INFINITY, false, "darkgreen"),
];

const CONDUCTIVITY_BANDS: [Band; 5] = [
    Band::new(0.0, true, 200.0, true, "beige"),
    Band::new(200.0, false, 404.0, true, "purple"),
    Band::new(404.0, false, 800.0, true, "orange"),
    Band::new(800.0, false, 1600.0, true, "darkorange"),
    Band::new(1600.0, false, f64::INFINITY, false, "red"),
];

// pH reuses the conductivity thresholds. Inherited from the upstream data
// team's tables even though the pH domain is 0-14; kept for compatibility
// until agronomy supplies corrected bands.
const PH_BANDS: [Band; 5] = CONDUCTIVITY_BANDS;

const MOISTURE_BANDS: [Band; 5] = [
    Band::new(0.0, false, 15.0, false, "lightcyan"),
    Band::new(15.0, false, 31.0, false, "cyan"),
    Band::new(31.0, true, 61.0, false, "lightblue"),
    Band::new(61.0, true, 81.0, false, "blue"),
    Band::new(81.0, true, 100.0, true, "darkblue"),
];

const POTASSIUM_BANDS: [Band; 5] = [
    Band::new(0.0, true, 53.0, false, "white"),
    Band::new(53.0, true, 85.0, true, "peachpuff"),
    Band::new(85.0, false, 120.0, true, "orange"),
    Band::new(120.0, false, 155.0, true, "red"),
    Band::new(155.0, false, f64::INFINITY, false, "darkred"),
];

// ---

/// Registry mapping attributes to their threshold band tables.
///
/// Attributes without an entry have no registered classifier and are
/// excluded from orchestration fan-out.
#[derive(Debug, Clone)]
pub struct ClassifierRegistry {
    bands: HashMap<Attribute, &'static [Band]>,
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        // ---
        let mut bands: HashMap<Attribute, &'static [Band]> = HashMap::new();
        bands.insert(Attribute::Phosphorus, &PHOSPHORUS_BANDS);
        bands.insert(Attribute::Nitrogen, &NITROGEN_BANDS);
        bands.insert(Attribute::Conductivity, &CONDUCTIVITY_BANDS);
        bands.insert(Attribute::Ph, &PH_BANDS);
        bands.insert(Attribute::Moisture, &MOISTURE_BANDS);
        bands.insert(Attribute::Potassium, &POTASSIUM_BANDS);
        ClassifierRegistry { bands }
    }
}

impl ClassifierRegistry {
    // ---
    /// True when the attribute has a registered band table.
    pub fn has(&self, attribute: Attribute) -> bool {
        self.bands.contains_key(&attribute)
    }

    /// Map a value to its color label; first matching band wins.
    pub fn classify(&self, attribute: Attribute, value: f64) -> &'static str {
        // ---
        self.bands
            .get(&attribute)
            .and_then(|bands| bands.iter().find(|b| b.contains(value)))
            .map(|b| b.color)
            .unwrap_or(UNCLASSIFIED)
    }
}
