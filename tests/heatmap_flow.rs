//! End-to-end pipeline tests using an in-memory reading source and catalog
//! plus a tempdir-backed artifact store.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use soilgrid::artifact::{ArtifactStore, FsArtifactStore};
use soilgrid::catalog::Catalog;
use soilgrid::classify::ClassifierRegistry;
use soilgrid::models::{Attribute, RawReading, RunStatus};
use soilgrid::pipeline::{Orchestrator, PipelineLimits};
use soilgrid::source::ReadingSource;
use soilgrid::Result;

// ---

#[derive(Default)]
struct MemorySource {
    batches: HashMap<(String, String), Vec<RawReading>>,
}

impl MemorySource {
    fn insert(&mut self, device_id: &str, timestamp: &str, batch: Vec<RawReading>) {
        self.batches
            .insert((device_id.to_string(), timestamp.to_string()), batch);
    }
}

#[async_trait]
impl ReadingSource for MemorySource {
    async fn list_timestamps(&self, device_id: &str) -> Result<Vec<String>> {
        // ---
        let mut out: Vec<String> = self
            .batches
            .keys()
            .filter(|(d, _)| d == device_id)
            .map(|(_, ts)| ts.clone())
            .collect();
        out.sort();
        Ok(out)
    }

    async fn fetch(&self, device_id: &str, timestamp: &str) -> Result<Vec<RawReading>> {
        Ok(self
            .batches
            .get(&(device_id.to_string(), timestamp.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct MemoryCatalog {
    rows: Mutex<BTreeMap<(String, String, String), String>>,
}

impl MemoryCatalog {
    fn snapshot(&self) -> BTreeMap<(String, String, String), String> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn upsert_artifact(
        &self,
        device_id: &str,
        date: &str,
        attribute: Attribute,
        location: &str,
    ) -> Result<()> {
        // ---
        self.rows.lock().unwrap().insert(
            (
                device_id.to_string(),
                date.to_string(),
                attribute.name().to_string(),
            ),
            location.to_string(),
        );
        Ok(())
    }

    async fn devices(&self) -> Result<Vec<String>> {
        let mut out: Vec<String> = self
            .rows
            .lock()
            .unwrap()
            .keys()
            .map(|(d, _, _)| d.clone())
            .collect();
        out.dedup();
        Ok(out)
    }

    async fn dates_for(&self, device_id: &str) -> Result<Vec<String>> {
        let mut out: Vec<String> = self
            .rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(d, _, _)| d == device_id)
            .map(|(_, date, _)| date.clone())
            .collect();
        out.dedup();
        Ok(out)
    }
}

// ---

fn reading(lat: f64, lon: f64, attr: &str, value: f64) -> RawReading {
    RawReading {
        latitude: Some(json!(lat)),
        longitude: Some(json!(lon)),
        attributes: HashMap::from([(attr.to_string(), json!(value))]),
        ..Default::default()
    }
}

fn orchestrator(
    catalog: &Arc<MemoryCatalog>,
    root: &std::path::Path,
) -> Orchestrator {
    // ---
    Orchestrator::new(
        Arc::clone(catalog) as Arc<dyn Catalog>,
        Arc::new(FsArtifactStore::new(root)) as Arc<dyn ArtifactStore>,
        Arc::new(ClassifierRegistry::default()),
        PipelineLimits::default(),
    )
}

/// Ten potassium points: two rows of five columns spread over roughly
/// 200 m, column values covering all five potassium bands.
fn potassium_batch() -> Vec<RawReading> {
    // ---
    let values = [40.0, 60.0, 100.0, 130.0, 160.0];
    let mut batch = Vec::new();
    for (i, v) in values.iter().enumerate() {
        let lon = 77.5900 + i as f64 * 0.00045;
        batch.push(reading(10.0000, lon, "potassium", *v));
        batch.push(reading(10.0010, lon, "potassium", *v));
    }
    batch
}

// ---

#[tokio::test]
async fn tight_cluster_is_insufficient_data() {
    // ---
    // Scenario: six moisture points within about a meter of each other.
    // Point count is fine; the geometry is not.
    let mut source = MemorySource::default();
    let batch: Vec<RawReading> = (0..6)
        .map(|i| {
            reading(
                12.970000 + i as f64 * 1e-6,
                77.590000 + i as f64 * 1e-6,
                "moisture",
                45.0,
            )
        })
        .collect();
    source.insert("dev-a", "2024-06-11 10-00-00", batch);

    let catalog = Arc::new(MemoryCatalog::default());
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(&catalog, dir.path());

    let status = orch
        .generate_for_device(&source, "dev-a", &Attribute::ALL, Some("2024-06-11"))
        .await
        .unwrap();

    assert_eq!(
        status,
        RunStatus::InsufficientData {
            device_id: "dev-a".into(),
            date: "2024-06-11".into(),
        }
    );
    assert!(catalog.snapshot().is_empty());
    assert!(!dir.path().join("dev-a").exists());
}

#[tokio::test]
async fn spread_batch_produces_all_potassium_labels() {
    // ---
    let mut source = MemorySource::default();
    source.insert("dev-b", "2024-06-11 10-00-00", potassium_batch());

    let catalog = Arc::new(MemoryCatalog::default());
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(&catalog, dir.path());

    let status = orch
        .generate_for_device(&source, "dev-b", &Attribute::ALL, Some("2024-06-11"))
        .await
        .unwrap();

    assert_eq!(
        status,
        RunStatus::Success {
            device_id: "dev-b".into(),
            date: "2024-06-11".into(),
        }
    );

    // Catalog holds exactly the potassium row for the date.
    let rows = catalog.snapshot();
    assert_eq!(rows.len(), 1);
    let location = &rows[&("dev-b".into(), "2024-06-11".into(), "potassium".into())];
    assert!(location.ends_with("potassium.csv"));

    // The artifact covers every potassium color band.
    let store = FsArtifactStore::new(dir.path());
    let records = store
        .read_records("dev-b", "2024-06-11", Attribute::Potassium)
        .await
        .unwrap();
    assert!(!records.is_empty());
    for label in ["white", "peachpuff", "orange", "red", "darkred"] {
        assert!(
            records.iter().any(|r| r.color == label),
            "label {label} missing from artifact"
        );
    }
}

#[tokio::test]
async fn unknown_device_is_not_found() {
    // ---
    // Scenario: a device with zero recorded timestamps.
    let source = MemorySource::default();
    let catalog = Arc::new(MemoryCatalog::default());
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(&catalog, dir.path());

    let status = orch
        .generate_for_device(&source, "ghost", &Attribute::ALL, None)
        .await
        .unwrap();

    assert_eq!(
        status,
        RunStatus::DeviceNotFound {
            device_id: "ghost".into()
        }
    );
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_date_is_distinct_from_insufficient_data() {
    // ---
    let mut source = MemorySource::default();
    source.insert("dev-c", "2024-06-11 10-00-00", potassium_batch());

    let catalog = Arc::new(MemoryCatalog::default());
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(&catalog, dir.path());

    let status = orch
        .generate_for_device(&source, "dev-c", &Attribute::ALL, Some("2024-06-12"))
        .await
        .unwrap();

    assert_eq!(
        status,
        RunStatus::DateNotFound {
            device_id: "dev-c".into(),
            date: "2024-06-12".into(),
        }
    );
}

#[tokio::test]
async fn reprocessing_overwrites_catalog_location() {
    // ---
    let mut source = MemorySource::default();
    source.insert("dev-d", "2024-06-11 10-00-00", potassium_batch());

    let catalog = Arc::new(MemoryCatalog::default());
    let dir_one = tempfile::tempdir().unwrap();
    let dir_two = tempfile::tempdir().unwrap();

    let first = orchestrator(&catalog, dir_one.path());
    first
        .generate_for_device(&source, "dev-d", &Attribute::ALL, None)
        .await
        .unwrap();

    let second = orchestrator(&catalog, dir_two.path());
    second
        .generate_for_device(&source, "dev-d", &Attribute::ALL, None)
        .await
        .unwrap();

    let rows = catalog.snapshot();
    assert_eq!(rows.len(), 1, "reprocessing must not duplicate catalog rows");
    let location = &rows[&("dev-d".into(), "2024-06-11".into(), "potassium".into())];
    assert!(location.starts_with(dir_two.path().to_str().unwrap()));
}

#[tokio::test]
async fn batch_entry_point_groups_by_device_and_date() {
    // ---
    let rows: Vec<RawReading> = potassium_batch()
        .into_iter()
        .map(|mut r| {
            r.device_id = Some("dev-e".into());
            r.timestamp = Some("2024-06-12 09-00-00".into());
            r
        })
        .collect();

    let catalog = Arc::new(MemoryCatalog::default());
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(&catalog, dir.path());

    let status = orch
        .generate_from_batch(rows, &Attribute::ALL)
        .await
        .unwrap();

    assert_eq!(
        status,
        RunStatus::Success {
            device_id: "dev-e".into(),
            date: "2024-06-12".into(),
        }
    );
    assert_eq!(catalog.dates_for("dev-e").await.unwrap(), ["2024-06-12"]);
}

#[tokio::test]
async fn too_few_coordinate_rows_short_circuits_the_date() {
    // ---
    let rows: Vec<RawReading> = potassium_batch()
        .into_iter()
        .take(3)
        .map(|mut r| {
            r.device_id = Some("dev-f".into());
            r.timestamp = Some("2024-06-12 09-00-00".into());
            r
        })
        .collect();

    let catalog = Arc::new(MemoryCatalog::default());
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(&catalog, dir.path());

    let status = orch
        .generate_from_batch(rows, &Attribute::ALL)
        .await
        .unwrap();

    assert_eq!(
        status,
        RunStatus::InsufficientData {
            device_id: "dev-f".into(),
            date: "2024-06-12".into(),
        }
    );
    assert!(catalog.snapshot().is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn empty_batch_is_an_input_error() {
    // ---
    let catalog = Arc::new(MemoryCatalog::default());
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(&catalog, dir.path());

    let err = orch
        .generate_from_batch(Vec::new(), &Attribute::ALL)
        .await
        .unwrap_err();
    assert!(matches!(err, soilgrid::PipelineError::Input(_)));
}
