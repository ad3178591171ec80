//! Artifact store: flat CSV files of classified records, one per
//! (device, date, attribute), addressed by a single path function.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::{Attribute, ClassifiedRecord};

// ---

/// Characters stripped from device ids and mapped to `-` in dates before
/// either is used as a path component.
const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', ' ', '-'];

fn sanitize_device(device_id: &str) -> String {
    device_id.chars().filter(|c| !UNSAFE_CHARS.contains(c)).collect()
}

fn sanitize_date(date: &str) -> String {
    date.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// The artifact address for one (device, date, attribute) triple.
///
/// Every call site goes through here; the resulting path doubles as the
/// catalog's location value.
pub fn artifact_path(root: &Path, device_id: &str, date: &str, attribute: Attribute) -> PathBuf {
    // ---
    root.join(sanitize_device(device_id))
        .join(sanitize_date(date))
        .join(format!("{}.csv", attribute.name()))
}

fn date_dir(root: &Path, device_id: &str, date: &str) -> PathBuf {
    root.join(sanitize_device(device_id)).join(sanitize_date(date))
}

// ---

/// Seam to the artifact store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write the classified records for one attribute; returns the location
    /// recorded in the catalog.
    async fn write_records(
        &self,
        device_id: &str,
        date: &str,
        attribute: Attribute,
        records: &[ClassifiedRecord],
    ) -> Result<String>;

    /// Read one artifact back (transport layer serves these to renderers).
    async fn read_records(
        &self,
        device_id: &str,
        date: &str,
        attribute: Attribute,
    ) -> Result<Vec<ClassifiedRecord>>;

    /// Whether an artifact exists for the triple.
    async fn exists(&self, device_id: &str, date: &str, attribute: Attribute) -> bool;

    /// Remove a date's directory. Used when no attribute produced an
    /// artifact; missing directories are not an error.
    async fn delete_date_dir(&self, device_id: &str, date: &str) -> Result<()>;
}

// ---

/// Filesystem-backed artifact store.
///
/// CSV columns, in order: `latitude, longitude, <attribute>, color`.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsArtifactStore { root: root.into() }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn write_records(
        &self,
        device_id: &str,
        date: &str,
        attribute: Attribute,
        records: &[ClassifiedRecord],
    ) -> Result<String> {
        // ---
        let path = artifact_path(&self.root, device_id, date, attribute);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["latitude", "longitude", attribute.name(), "color"])?;
        for r in records {
            writer.write_record([
                r.latitude.to_string(),
                r.longitude.to_string(),
                r.value.to_string(),
                r.color.clone(),
            ])?;
        }
        writer.flush()?;

        debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    async fn read_records(
        &self,
        device_id: &str,
        date: &str,
        attribute: Attribute,
    ) -> Result<Vec<ClassifiedRecord>> {
        // ---
        let path = artifact_path(&self.root, device_id, date, attribute);
        let mut reader = csv::Reader::from_path(&path)?;
        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let parse = |i: usize| -> Result<f64> {
                row.get(i)
                    .and_then(|v| v.parse::<f64>().ok())
                    .ok_or_else(|| {
                        PipelineError::store(format!("malformed artifact row in {}", path.display()))
                    })
            };
            records.push(ClassifiedRecord {
                latitude: parse(0)?,
                longitude: parse(1)?,
                value: parse(2)?,
                color: row.get(3).unwrap_or_default().to_string(),
            });
        }
        Ok(records)
    }

    async fn exists(&self, device_id: &str, date: &str, attribute: Attribute) -> bool {
        artifact_path(&self.root, device_id, date, attribute).exists()
    }

    async fn delete_date_dir(&self, device_id: &str, date: &str) -> Result<()> {
        // ---
        let dir = date_dir(&self.root, device_id, date);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn addressing_sanitizes_components() {
        // ---
        let path = artifact_path(
            Path::new("heatmaps"),
            "dev: 01/a",
            "2024-06-11 08:30",
            Attribute::Potassium,
        );
        assert_eq!(
            path,
            PathBuf::from("heatmaps/dev01a/2024-06-11-08-30/potassium.csv")
        );
    }

    #[tokio::test]
    async fn write_read_exists_delete() {
        // ---
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let records = vec![ClassifiedRecord {
            latitude: 12.97,
            longitude: 77.59,
            value: 60.0,
            color: "peachpuff".into(),
        }];

        assert!(!store.exists("dev1", "2024-06-11", Attribute::Potassium).await);
        let location = store
            .write_records("dev1", "2024-06-11", Attribute::Potassium, &records)
            .await
            .unwrap();
        assert!(location.ends_with("potassium.csv"));
        assert!(store.exists("dev1", "2024-06-11", Attribute::Potassium).await);

        let read = store
            .read_records("dev1", "2024-06-11", Attribute::Potassium)
            .await
            .unwrap();
        assert_eq!(read, records);

        store.delete_date_dir("dev1", "2024-06-11").await.unwrap();
        assert!(!store.exists("dev1", "2024-06-11", Attribute::Potassium).await);
        // Deleting again is a no-op.
        store.delete_date_dir("dev1", "2024-06-11").await.unwrap();
    }
}
