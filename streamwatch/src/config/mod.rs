//! Runtime configuration.
//!
//! Everything the monitor needs is carried by [`MonitorConfig`] and handed to
//! each component at construction. Values come from the process environment
//! (after `.env` is loaded by the binary) with defaults for every key.

use std::path::PathBuf;
use std::time::Duration;

use crate::probe::ProbeConfig;
use crate::scheduler::SchedulerConfig;
use crate::{Error, Result};

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_SWEEP_INTERVAL: &str = "TEST_RATE";
pub const ENV_PROBE_TIMEOUT: &str = "FFPROBE_TIMEOUT";
pub const ENV_FETCH_TIMEOUT: &str = "PLAYLIST_FETCH_TIMEOUT";
pub const ENV_FFPROBE_PATH: &str = "FFPROBE_PATH";
pub const ENV_FFMPEG_PATH: &str = "FFMPEG_PATH";
pub const ENV_FRAMES_DIR: &str = "FRAMES_DIR";
pub const ENV_DIAGNOSTIC_LOG: &str = "FFMPEG_LOG_PATH";
pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_MAX_ON_DEMAND: &str = "MAX_ON_DEMAND_SWEEPS";

const DEFAULT_DATABASE_URL: &str = "sqlite:data/streams.db?mode=rwc";
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 15;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FRAMES_DIR: &str = "static/frames";
const DEFAULT_DIAGNOSTIC_LOG: &str = "data/ffmpeg.log";
const DEFAULT_MAX_ON_DEMAND_SWEEPS: usize = 4;

/// Top-level monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// SQLite database URL.
    pub database_url: String,
    /// Delay between the end of one full sweep and the start of the next.
    pub sweep_interval: Duration,
    /// Deadline for each ffprobe and ffmpeg invocation.
    pub probe_timeout: Duration,
    /// Deadline for downloading a playlist.
    pub fetch_timeout: Duration,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    /// Directory frame snapshots are written to.
    pub frames_dir: PathBuf,
    /// Append-only file receiving tool diagnostics.
    pub diagnostic_log_path: PathBuf,
    /// Directory for rolling application logs. Console only when unset.
    pub log_dir: Option<PathBuf>,
    /// Upper bound on concurrently running on-demand sweeps.
    pub max_on_demand_sweeps: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            frames_dir: PathBuf::from(DEFAULT_FRAMES_DIR),
            diagnostic_log_path: PathBuf::from(DEFAULT_DIAGNOSTIC_LOG),
            log_dir: None,
            max_on_demand_sweeps: DEFAULT_MAX_ON_DEMAND_SWEEPS,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let sweep_interval = match get(ENV_SWEEP_INTERVAL) {
            Some(raw) => Duration::from_secs(parse_positive(ENV_SWEEP_INTERVAL, &raw)?),
            None => defaults.sweep_interval,
        };
        let probe_timeout = match get(ENV_PROBE_TIMEOUT) {
            Some(raw) => Duration::from_secs(parse_positive(ENV_PROBE_TIMEOUT, &raw)?),
            None => defaults.probe_timeout,
        };
        let fetch_timeout = match get(ENV_FETCH_TIMEOUT) {
            Some(raw) => Duration::from_secs(parse_positive(ENV_FETCH_TIMEOUT, &raw)?),
            None => defaults.fetch_timeout,
        };
        let max_on_demand_sweeps = match get(ENV_MAX_ON_DEMAND) {
            Some(raw) => parse_positive(ENV_MAX_ON_DEMAND, &raw)? as usize,
            None => defaults.max_on_demand_sweeps,
        };

        Ok(Self {
            database_url: get(ENV_DATABASE_URL).unwrap_or(defaults.database_url),
            sweep_interval,
            probe_timeout,
            fetch_timeout,
            ffprobe_path: get(ENV_FFPROBE_PATH).unwrap_or(defaults.ffprobe_path),
            ffmpeg_path: get(ENV_FFMPEG_PATH).unwrap_or(defaults.ffmpeg_path),
            frames_dir: get(ENV_FRAMES_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.frames_dir),
            diagnostic_log_path: get(ENV_DIAGNOSTIC_LOG)
                .map(PathBuf::from)
                .unwrap_or(defaults.diagnostic_log_path),
            log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
            max_on_demand_sweeps,
        })
    }

    /// Settings for the prober and frame capturer.
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            ffprobe_path: self.ffprobe_path.clone(),
            ffmpeg_path: self.ffmpeg_path.clone(),
            timeout: self.probe_timeout,
            frames_dir: self.frames_dir.clone(),
        }
    }

    /// Settings for the sweep scheduler.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            sweep_interval: self.sweep_interval,
            max_on_demand_sweeps: self.max_on_demand_sweeps,
        }
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    let value: u64 = raw
        .parse()
        .map_err(|_| Error::config(format!("{key} must be a positive integer, got '{raw}'")))?;
    if value == 0 {
        return Err(Error::config(format!("{key} must be greater than zero")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = MonitorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.sweep_interval, Duration::from_secs(600));
        assert_eq!(config.probe_timeout, Duration::from_secs(15));
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.ffprobe_path, "ffprobe");
        assert_eq!(config.max_on_demand_sweeps, 4);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = MonitorConfig::from_lookup(lookup(&[
            (ENV_SWEEP_INTERVAL, "30"),
            (ENV_PROBE_TIMEOUT, " 5 "),
            (ENV_FFMPEG_PATH, "/opt/ffmpeg/bin/ffmpeg"),
            (ENV_FRAMES_DIR, "/srv/frames"),
            (ENV_LOG_DIR, "logs"),
        ]))
        .unwrap();

        assert_eq!(config.sweep_interval, Duration::from_secs(30));
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.ffmpeg_path, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.frames_dir, PathBuf::from("/srv/frames"));
        assert_eq!(config.log_dir, Some(PathBuf::from("logs")));

        let probe = config.probe_config();
        assert_eq!(probe.timeout, Duration::from_secs(5));
        assert_eq!(config.scheduler_config().sweep_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_empty_value_falls_back_to_default() {
        let config = MonitorConfig::from_lookup(lookup(&[(ENV_DATABASE_URL, "")])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let err = MonitorConfig::from_lookup(lookup(&[(ENV_SWEEP_INTERVAL, "ten")])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = MonitorConfig::from_lookup(lookup(&[(ENV_PROBE_TIMEOUT, "0")])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }
}
