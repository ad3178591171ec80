//! Configuration loader for the `soilgrid` backend service.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `.env` file
//! support provided by the caller). By consolidating configuration logic
//! here, we avoid scattering `env::var` calls throughout the codebase.

use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional float environment variable with a default value.
macro_rules! parse_env_f64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent
/// configuration snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string for the heatmap catalog.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Base URL of the realtime reading store.
    pub source_url: String,

    /// Root directory for generated heatmap artifacts.
    pub artifact_root: String,

    /// Outlier radius (meters) for the device/date processing path.
    pub device_distance_threshold_m: f64,

    /// Outlier radius (meters) for the raw-batch processing path.
    pub batch_distance_threshold_m: f64,

    /// Minimum valid coordinate rows required before a date is processed.
    pub min_points_per_date: u32,

    /// Minimum filtered points required per attribute chain.
    pub min_points_per_attribute: u32,

    /// Maximum attribute chains processed in parallel for one date.
    pub attribute_workers: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
/// - `SENSOR_STORE_URL` – realtime reading store base URL
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `HEATMAP_ROOT` – artifact root directory (default: `heatmaps`)
/// - `DEVICE_DISTANCE_THRESHOLD_M` – device path outlier radius (default: 500)
/// - `BATCH_DISTANCE_THRESHOLD_M` – batch path outlier radius (default: 1000)
/// - `MIN_POINTS_PER_DATE` – date-level minimum point count (default: 4)
/// - `MIN_POINTS_PER_ATTRIBUTE` – attribute-level minimum (default: 5)
/// - `ATTRIBUTE_WORKERS` – parallel attribute chains per date (default: 4)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let source_url = require_env!("SENSOR_STORE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let artifact_root = env::var("HEATMAP_ROOT").unwrap_or_else(|_| "heatmaps".into());
    let device_distance_threshold_m = parse_env_f64!("DEVICE_DISTANCE_THRESHOLD_M", 500.0);
    let batch_distance_threshold_m = parse_env_f64!("BATCH_DISTANCE_THRESHOLD_M", 1000.0);
    let min_points_per_date = parse_env_u32!("MIN_POINTS_PER_DATE", 4);
    let min_points_per_attribute = parse_env_u32!("MIN_POINTS_PER_ATTRIBUTE", 5);
    let attribute_workers = parse_env_u32!("ATTRIBUTE_WORKERS", 4);

    Ok(Config {
        db_url,
        db_pool_max,
        source_url,
        artifact_root,
        device_distance_threshold_m,
        batch_distance_threshold_m,
        min_points_per_date,
        min_points_per_attribute,
        attribute_workers,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        // Mask the password in the database URL for security
        let masked_db_url = if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                format!(
                    "{}:****{}",
                    &self.db_url[..colon_pos],
                    &self.db_url[at_pos..]
                )
            } else {
                self.db_url.clone()
            }
        } else {
            self.db_url.clone()
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL                : {}", masked_db_url);
        tracing::info!("  SENSOR_STORE_URL            : {}", self.source_url);
        tracing::info!("  DB_POOL_MAX                 : {}", self.db_pool_max);
        tracing::info!("  HEATMAP_ROOT                : {}", self.artifact_root);
        tracing::info!(
            "  DEVICE_DISTANCE_THRESHOLD_M : {}",
            self.device_distance_threshold_m
        );
        tracing::info!(
            "  BATCH_DISTANCE_THRESHOLD_M  : {}",
            self.batch_distance_threshold_m
        );
        tracing::info!("  MIN_POINTS_PER_DATE         : {}", self.min_points_per_date);
        tracing::info!(
            "  MIN_POINTS_PER_ATTRIBUTE    : {}",
            self.min_points_per_attribute
        );
        tracing::info!("  ATTRIBUTE_WORKERS           : {}", self.attribute_workers);
    }
}
