//! Probe result value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::StreamDescriptor;

/// The measurement recorded for a single probe attempt.
///
/// Exactly one is produced per attempt, whatever the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub source_id: i64,
    pub stream_name: String,
    pub timestamp: DateTime<Utc>,
    pub is_available: bool,
    pub resolution_height: u32,
    pub frame_rate: f64,
    /// Wall-clock time spent in the probe tool, in milliseconds.
    pub load_time_ms: f64,
    pub logo_url: Option<String>,
}

impl ProbeResult {
    /// A reachable stream with its measured video properties.
    pub fn available(
        source_id: i64,
        stream: &StreamDescriptor,
        resolution_height: u32,
        frame_rate: f64,
        elapsed: Duration,
    ) -> Self {
        Self {
            source_id,
            stream_name: stream.name.clone(),
            timestamp: Utc::now(),
            is_available: true,
            resolution_height,
            frame_rate,
            load_time_ms: duration_ms(elapsed),
            logo_url: stream.logo_url.clone(),
        }
    }

    /// A stream that failed, timed out, or could not be probed.
    pub fn unavailable(source_id: i64, stream: &StreamDescriptor, elapsed: Duration) -> Self {
        Self {
            source_id,
            stream_name: stream.name.clone(),
            timestamp: Utc::now(),
            is_available: false,
            resolution_height: 0,
            frame_rate: 0.0,
            load_time_ms: duration_ms(elapsed),
            logo_url: stream.logo_url.clone(),
        }
    }
}

fn duration_ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}
