//! Probe result database model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::ProbeResult;

/// One stored probe attempt (`stream_data` row).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ProbeResultDbModel {
    /// Insertion order. The highest id per stream is its latest status.
    pub id: i64,
    pub source_id: i64,
    pub stream_name: String,
    /// Unix epoch milliseconds (UTC) when the probe finished.
    pub timestamp: i64,
    pub is_available: bool,
    /// Video height in pixels, 0 when unknown.
    pub resolution_h: i64,
    pub frame_rate: f64,
    pub load_time_ms: f64,
    pub logo_url: Option<String>,
}

impl ProbeResultDbModel {
    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    /// Convert back to the domain value, dropping the row id.
    pub fn into_result(self) -> ProbeResult {
        ProbeResult {
            source_id: self.source_id,
            timestamp: self.timestamp(),
            stream_name: self.stream_name,
            is_available: self.is_available,
            resolution_height: u32::try_from(self.resolution_h).unwrap_or(0),
            frame_rate: self.frame_rate,
            load_time_ms: self.load_time_ms,
            logo_url: self.logo_url,
        }
    }
}

/// Run counts for one source over a time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AvailabilitySummary {
    pub total_runs: i64,
    pub successful_runs: i64,
}

impl AvailabilitySummary {
    /// Fraction of successful runs, `None` when nothing ran.
    pub fn ratio(&self) -> Option<f64> {
        (self.total_runs > 0).then(|| self.successful_runs as f64 / self.total_runs as f64)
    }
}
