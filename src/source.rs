//! Raw reading source: the realtime store that holds per-timestamp point
//! batches for each device.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::models::RawReading;

// ---

/// Seam to the raw reading store. Implementations must tolerate devices and
/// timestamps with no data (empty results, not errors).
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// All recorded timestamps for a device, ordered.
    async fn list_timestamps(&self, device_id: &str) -> Result<Vec<String>>;

    /// The point batch recorded at one timestamp (may be empty).
    async fn fetch(&self, device_id: &str, timestamp: &str) -> Result<Vec<RawReading>>;
}

// ---

/// Extract the `YYYY-MM-DD` portion of a recorded timestamp.
///
/// Devices have reported `YYYY-MM-DD HH-MM-SS`, `YYYY-MM-DDTHH:MM:SS`, and
/// `YYYY-MM-DD-HH-MM-SS` over time; all reduce to the leading date, which is
/// validated before use.
pub fn date_portion(timestamp: &str) -> Option<String> {
    // ---
    let head = timestamp
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()?;
    let date = head.split('-').take(3).collect::<Vec<_>>().join("-");
    NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()?;
    Some(date)
}

/// Group timestamps by their date portion, dates in ascending order.
/// Timestamps with no parseable date are dropped.
pub fn group_by_date(timestamps: &[String]) -> BTreeMap<String, Vec<String>> {
    // ---
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for ts in timestamps {
        if let Some(date) = date_portion(ts) {
            groups.entry(date).or_default().push(ts.clone());
        } else {
            debug!("Ignoring timestamp with no date portion: {ts}");
        }
    }
    groups
}

// ---

/// Reading source backed by the realtime store's REST interface.
///
/// Layout: `{base}/realtimedevices/{device}.json` returns a map of
/// timestamp to reading (or batch of readings); appending `/{timestamp}`
/// narrows to one batch. Absent nodes come back as JSON `null`.
pub struct HttpReadingSource {
    client: Client,
    base_url: String,
}

impl HttpReadingSource {
    // ---
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpReadingSource {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn device_url(&self, device_id: &str) -> String {
        format!("{}/realtimedevices/{}.json", self.base_url, device_id)
    }

    fn batch_url(&self, device_id: &str, timestamp: &str) -> String {
        format!(
            "{}/realtimedevices/{}/{}.json",
            self.base_url, device_id, timestamp
        )
    }
}

#[async_trait]
impl ReadingSource for HttpReadingSource {
    async fn list_timestamps(&self, device_id: &str) -> Result<Vec<String>> {
        // ---
        let url = self.device_url(device_id);
        debug!("Listing timestamps from: {url}");
        let body: Value = self.client.get(&url).send().await?.json().await?;
        let mut timestamps: Vec<String> = match body {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        timestamps.sort();
        Ok(timestamps)
    }

    async fn fetch(&self, device_id: &str, timestamp: &str) -> Result<Vec<RawReading>> {
        // ---
        let url = self.batch_url(device_id, timestamp);
        debug!("Fetching batch from: {url}");
        let body: Value = self.client.get(&url).send().await?.json().await?;
        let items = match body {
            Value::Array(items) => items,
            Value::Object(_) => vec![body],
            _ => Vec::new(),
        };

        let mut readings = Vec::new();
        for (i, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<RawReading>(item) {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    debug!("Failed to parse reading {i} at {timestamp} for {device_id}: {e}");
                }
            }
        }
        Ok(readings)
    }
}
