//! Date-level orchestration: fans the per-attribute chains out over a
//! bounded worker pool, writes artifacts and catalog rows for the chains
//! that produce output, and aggregates a day-level status.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::artifact::ArtifactStore;
use crate::catalog::Catalog;
use crate::classify::ClassifierRegistry;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::models::{Attribute, RawReading, RunStatus};
use crate::source::{date_portion, group_by_date, ReadingSource};

use super::attribute::{run_chain, ChainOutput};

// ---

/// Tunable thresholds for one orchestrator instance.
#[derive(Debug, Clone, Copy)]
pub struct PipelineLimits {
    /// Outlier radius (meters) for batches fetched per device/date.
    pub device_distance_threshold_m: f64,
    /// Outlier radius (meters) for caller-supplied raw batches.
    pub batch_distance_threshold_m: f64,
    /// Minimum valid coordinate rows before a date is processed at all.
    pub min_points_per_date: usize,
    /// Minimum filtered points per attribute chain.
    pub min_points_per_attribute: usize,
    /// Maximum attribute chains in flight for one date.
    pub attribute_workers: usize,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        // ---
        PipelineLimits {
            device_distance_threshold_m: 500.0,
            batch_distance_threshold_m: 1000.0,
            min_points_per_date: 4,
            min_points_per_attribute: 5,
            attribute_workers: 4,
        }
    }
}

impl PipelineLimits {
    pub fn from_config(cfg: &Config) -> Self {
        // ---
        PipelineLimits {
            device_distance_threshold_m: cfg.device_distance_threshold_m,
            batch_distance_threshold_m: cfg.batch_distance_threshold_m,
            min_points_per_date: cfg.min_points_per_date as usize,
            min_points_per_attribute: cfg.min_points_per_attribute as usize,
            attribute_workers: cfg.attribute_workers as usize,
        }
    }
}

// ---

/// Lifecycle of one date's processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateState {
    Pending,
    Processing,
    Success,
    InsufficientData,
}

/// Owns one request's pipeline lifecycle. The catalog is the only durable
/// store; nothing here retains state across requests.
pub struct Orchestrator {
    catalog: Arc<dyn Catalog>,
    artifacts: Arc<dyn ArtifactStore>,
    registry: Arc<ClassifierRegistry>,
    limits: PipelineLimits,
}

impl Orchestrator {
    // ---
    pub fn new(
        catalog: Arc<dyn Catalog>,
        artifacts: Arc<dyn ArtifactStore>,
        registry: Arc<ClassifierRegistry>,
        limits: PipelineLimits,
    ) -> Self {
        Orchestrator {
            catalog,
            artifacts,
            registry,
            limits,
        }
    }

    /// Generate heatmaps for one device, optionally restricted to one date.
    ///
    /// Dates are discovered by grouping the device's recorded timestamps on
    /// their date portion. A device with no timestamps is reported as
    /// not-found, as is a requested date absent from the discovered set;
    /// both are distinct from insufficient data. Returns on the first date that
    /// succeeds; otherwise the last date's status.
    pub async fn generate_for_device(
        &self,
        source: &dyn ReadingSource,
        device_id: &str,
        attributes: &[Attribute],
        date: Option<&str>,
    ) -> Result<RunStatus> {
        // ---
        if device_id.trim().is_empty() {
            return Err(PipelineError::input("device_id must not be empty"));
        }
        if matches!(date, Some(d) if d.trim().is_empty()) {
            return Err(PipelineError::input("date must not be empty when given"));
        }

        let timestamps = source.list_timestamps(device_id).await?;
        if timestamps.is_empty() {
            return Ok(RunStatus::DeviceNotFound {
                device_id: device_id.to_string(),
            });
        }

        let mut groups = group_by_date(&timestamps);
        if let Some(requested) = date {
            let Some(ts_list) = groups.remove(requested) else {
                return Ok(RunStatus::DateNotFound {
                    device_id: device_id.to_string(),
                    date: requested.to_string(),
                });
            };
            groups = BTreeMap::from([(requested.to_string(), ts_list)]);
        }
        if groups.is_empty() {
            // Timestamps exist but none carries a parseable date.
            return Ok(RunStatus::DeviceNotFound {
                device_id: device_id.to_string(),
            });
        }

        let mut last = None;
        for (date, ts_list) in groups {
            let mut batch = Vec::new();
            for ts in &ts_list {
                batch.extend(source.fetch(device_id, ts).await?);
            }
            info!(
                "Processing {} readings for device {device_id} on {date}",
                batch.len()
            );

            let status = if batch.is_empty() {
                RunStatus::InsufficientData {
                    device_id: device_id.to_string(),
                    date: date.clone(),
                }
            } else {
                self.process_date(
                    device_id,
                    &date,
                    batch,
                    attributes,
                    self.limits.device_distance_threshold_m,
                )
                .await
            };

            if matches!(status, RunStatus::Success { .. }) {
                return Ok(status);
            }
            last = Some(status);
        }

        Ok(last.unwrap_or(RunStatus::DeviceNotFound {
            device_id: device_id.to_string(),
        }))
    }

    /// Generate heatmaps from a caller-supplied raw batch (CSV upload path).
    ///
    /// Rows are grouped by `device_id`, then by the date portion of their
    /// `timestamp`; rows missing either are ignored. Returns on the first
    /// (device, date) group that succeeds; otherwise the last status.
    pub async fn generate_from_batch(
        &self,
        rows: Vec<RawReading>,
        attributes: &[Attribute],
    ) -> Result<RunStatus> {
        // ---
        if rows.is_empty() {
            return Err(PipelineError::input("batch must not be empty"));
        }

        let mut by_device: BTreeMap<String, Vec<RawReading>> = BTreeMap::new();
        let mut skipped = 0usize;
        for row in rows {
            match row.device_id.clone() {
                Some(id) if !id.trim().is_empty() => by_device.entry(id).or_default().push(row),
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("Ignoring {skipped} rows without a device_id");
        }
        if by_device.is_empty() {
            return Err(PipelineError::input("no rows carry a device_id"));
        }

        let mut last: Option<RunStatus> = None;
        for (device_id, device_rows) in by_device {
            let mut by_date: BTreeMap<String, Vec<RawReading>> = BTreeMap::new();
            for row in device_rows {
                let Some(date) = row.timestamp.as_deref().and_then(date_portion) else {
                    continue;
                };
                by_date.entry(date).or_default().push(row);
            }
            if by_date.is_empty() {
                warn!("No datable rows for device {device_id}");
                last.get_or_insert(RunStatus::DeviceNotFound {
                    device_id: device_id.clone(),
                });
                continue;
            }
            for (date, batch) in by_date {
                let status = self
                    .process_date(
                        &device_id,
                        &date,
                        batch,
                        attributes,
                        self.limits.batch_distance_threshold_m,
                    )
                    .await;
                if matches!(status, RunStatus::Success { .. }) {
                    return Ok(status);
                }
                last = Some(status);
            }
        }

        last.ok_or_else(|| PipelineError::input("no processable rows in batch"))
    }

    /// Process one date's batch: the date-level short-circuit, the bounded
    /// fan-out over attribute chains, and the day-level aggregation.
    async fn process_date(
        &self,
        device_id: &str,
        date: &str,
        batch: Vec<RawReading>,
        attributes: &[Attribute],
        distance_threshold_m: f64,
    ) -> RunStatus {
        // ---
        let mut state = DateState::Pending;
        debug!("Date {device_id}/{date}: {state:?}");

        // Cheap short-circuit before fan-out: the whole date needs a
        // minimum of rows with usable coordinates, across all attributes.
        let valid_rows = batch.iter().filter(|r| r.has_valid_coordinates()).count();
        if valid_rows < self.limits.min_points_per_date {
            state = DateState::InsufficientData;
            info!(
                "Insufficient data for device {device_id} on {date} \
                 ({valid_rows} valid rows): {state:?}"
            );
            return RunStatus::InsufficientData {
                device_id: device_id.to_string(),
                date: date.to_string(),
            };
        }

        state = DateState::Processing;
        debug!("Date {device_id}/{date}: {state:?}");

        // Each chain works on the same immutable snapshot; chains share no
        // mutable state, so the pool needs no locking.
        let snapshot: Arc<[RawReading]> = Arc::from(batch);
        let semaphore = Arc::new(Semaphore::new(self.limits.attribute_workers.max(1)));
        let mut tasks: JoinSet<Option<Attribute>> = JoinSet::new();

        for &attr in attributes {
            if !self.registry.has(attr) {
                debug!("No classifier registered for {attr}; skipping");
                continue;
            }

            let snapshot = Arc::clone(&snapshot);
            let registry = Arc::clone(&self.registry);
            let catalog = Arc::clone(&self.catalog);
            let artifacts = Arc::clone(&self.artifacts);
            let semaphore = Arc::clone(&semaphore);
            let device_id = device_id.to_string();
            let date = date.to_string();
            let min_points = self.limits.min_points_per_attribute;

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return None,
                };

                match run_chain(&snapshot, attr, &registry, distance_threshold_m, min_points) {
                    ChainOutput::Skipped(reason) => {
                        info!("Skipping heatmap for {attr} on {device_id}/{date}: {reason}");
                        None
                    }
                    ChainOutput::Records(records) => {
                        let location = match artifacts
                            .write_records(&device_id, &date, attr, &records)
                            .await
                        {
                            Ok(location) => location,
                            Err(e) => {
                                error!(
                                    "Failed to write artifact for {attr} on \
                                     {device_id}/{date}: {e}"
                                );
                                return None;
                            }
                        };
                        if let Err(e) = catalog
                            .upsert_artifact(&device_id, &date, attr, &location)
                            .await
                        {
                            error!(
                                "Failed to upsert catalog for {attr} on {device_id}/{date}: {e}"
                            );
                            return None;
                        }
                        info!("Artifact written for {attr} on {device_id}/{date}: {location}");
                        Some(attr)
                    }
                }
            });
        }

        let mut produced = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(_)) => produced += 1,
                Ok(None) => {}
                Err(e) => error!("Attribute task failed for {device_id}/{date}: {e}"),
            }
        }

        if produced == 0 {
            state = DateState::InsufficientData;
            info!("No artifacts generated for device {device_id} on {date}: {state:?}");
            if let Err(e) = self.artifacts.delete_date_dir(device_id, date).await {
                warn!("Failed to remove date folder for {device_id}/{date}: {e}");
            }
            return RunStatus::InsufficientData {
                device_id: device_id.to_string(),
                date: date.to_string(),
            };
        }

        state = DateState::Success;
        debug!("Date {device_id}/{date}: {produced} artifacts, {state:?}");
        RunStatus::Success {
            device_id: device_id.to_string(),
            date: date.to_string(),
        }
    }
}
