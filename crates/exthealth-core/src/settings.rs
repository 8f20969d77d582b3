//! Persisted monitor settings.
//!
//! Layout of the stored blob:
//!
//! ```json
//! { "enableAutoScan": true, "autoScanIntervalHours": 24, "cachedSnapshot": null }
//! ```
//!
//! Decoding is lenient: missing keys take defaults, a non-numeric interval
//! falls back to the default, and an unreadable snapshot is dropped. The
//! interval is stored as given and clamped only when a timer is armed.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::domain::{HealthError, Result, Snapshot};

pub const DEFAULT_INTERVAL_HOURS: f64 = 24.0;
pub const MIN_INTERVAL_HOURS: f64 = 1.0;
pub const MAX_INTERVAL_HOURS: f64 = 168.0;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// User-editable monitor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthSettings {
    pub enable_auto_scan: bool,
    #[serde(deserialize_with = "lenient_hours")]
    pub auto_scan_interval_hours: f64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            enable_auto_scan: true,
            auto_scan_interval_hours: DEFAULT_INTERVAL_HOURS,
        }
    }
}

impl HealthSettings {
    /// Period a timer armed from these settings would use.
    pub fn effective_interval(&self) -> Duration {
        interval_duration(self.auto_scan_interval_hours)
    }
}

/// Pull an hour count into `[MIN_INTERVAL_HOURS, MAX_INTERVAL_HOURS]`.
pub fn clamp_interval_hours(hours: f64) -> f64 {
    if hours.is_nan() {
        return MIN_INTERVAL_HOURS;
    }
    hours.clamp(MIN_INTERVAL_HOURS, MAX_INTERVAL_HOURS)
}

/// Clamp an hour count and convert it to a timer period.
pub fn interval_duration(hours: f64) -> Duration {
    let ms = (clamp_interval_hours(hours) * MS_PER_HOUR).round();
    Duration::from_millis(ms as u64)
}

fn lenient_hours<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let hours = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(hours.filter(|h| h.is_finite()).unwrap_or_else(|| {
        warn!(value = %value, "non-numeric scan interval, using default");
        DEFAULT_INTERVAL_HOURS
    }))
}

fn lenient_snapshot<'de, D>(deserializer: D) -> std::result::Result<Option<Snapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value::<Snapshot>(value) {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(e) => {
            warn!(error = %e, "discarding unreadable cached snapshot");
            Ok(None)
        }
    }
}

/// Everything that goes into the settings store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(flatten)]
    pub settings: HealthSettings,
    #[serde(default, deserialize_with = "lenient_snapshot")]
    pub cached_snapshot: Option<Snapshot>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedView<'a> {
    #[serde(flatten)]
    settings: &'a HealthSettings,
    cached_snapshot: Option<&'a Snapshot>,
}

/// Decode a stored blob. A snapshot whose order or counts disagree with
/// its records is rebuilt from the records.
pub fn decode_state(blob: serde_json::Value) -> Result<PersistedState> {
    if !blob.is_object() {
        return Err(HealthError::InvalidSettings(format!(
            "expected a JSON object, found {blob}"
        )));
    }
    let mut state: PersistedState = serde_json::from_value(blob)
        .map_err(|e| HealthError::InvalidSettings(e.to_string()))?;
    if let Some(snapshot) = state.cached_snapshot.take() {
        state.cached_snapshot = Some(if snapshot.is_consistent() {
            snapshot
        } else {
            warn!("cached snapshot out of order or miscounted, rebuilding");
            snapshot.normalized()
        });
    }
    Ok(state)
}

pub fn encode_state(settings: &HealthSettings, snapshot: Option<&Snapshot>) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(PersistedView {
        settings,
        cached_snapshot: snapshot,
    })?)
}
