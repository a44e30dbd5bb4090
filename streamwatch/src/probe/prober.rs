//! ffprobe-based availability and quality probe.

use process_utils::{BoundedRun, run_with_timeout, tokio_command};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::ProbeConfig;
use crate::diagnostics::{DiagnosticKind, DiagnosticLog};
use crate::domain::{ProbeResult, StreamDescriptor};

/// Why a probe classified a stream as unavailable.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to run probe tool: {0}")]
    Spawn(#[from] std::io::Error),

    /// The tool exited non-zero.
    #[error("probe tool exited with {code:?}")]
    Failure { code: Option<i32>, stderr: String },

    /// The tool exited cleanly but its output could not be used.
    #[error("unusable probe output: {reason}")]
    InvalidOutput { reason: String, stderr: String },
}

impl ProbeError {
    /// Raw tool output worth keeping in the diagnostic log.
    fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Failure { stderr, .. } | Self::InvalidOutput { stderr, .. } => Some(stderr),
            Self::Timeout(_) | Self::Spawn(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    avg_frame_rate: Option<String>,
}

/// Video properties read from a successful probe.
#[derive(Debug, Clone, Copy, PartialEq)]
struct VideoInfo {
    height: u32,
    frame_rate: f64,
}

/// Runs ffprobe against single streams.
#[derive(Debug, Clone)]
pub struct StreamProber {
    ffprobe_path: String,
    timeout: Duration,
    diagnostics: DiagnosticLog,
}

impl StreamProber {
    pub fn new(config: &ProbeConfig, diagnostics: DiagnosticLog) -> Self {
        Self {
            ffprobe_path: config.ffprobe_path.clone(),
            timeout: config.timeout,
            diagnostics,
        }
    }

    /// Probe one stream. Always yields exactly one result.
    ///
    /// The elapsed time is measured around the tool run on every path, so a
    /// timed out probe reports roughly the configured deadline.
    pub async fn probe(&self, source_id: i64, stream: &StreamDescriptor) -> ProbeResult {
        let started = Instant::now();
        let outcome = self.run(&stream.url).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(info) => {
                info!(
                    source_id,
                    stream = %stream.name,
                    height = info.height,
                    frame_rate = info.frame_rate,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Stream available"
                );
                ProbeResult::available(source_id, stream, info.height, info.frame_rate, elapsed)
            }
            Err(e) => {
                if let Some(output) = e.diagnostic() {
                    warn!(
                        source_id,
                        stream = %stream.name,
                        error = %e,
                        log = %self.diagnostics.path().display(),
                        "Stream unavailable, tool output written to diagnostic log"
                    );
                    self.diagnostics
                        .append(DiagnosticKind::Probe, &stream.name, output)
                        .await;
                } else {
                    warn!(
                        source_id,
                        stream = %stream.name,
                        error = %e,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Probe did not complete"
                    );
                }
                ProbeResult::unavailable(source_id, stream, elapsed)
            }
        }
    }

    async fn run(&self, url: &str) -> Result<VideoInfo, ProbeError> {
        let mut cmd = tokio_command(&self.ffprobe_path);
        cmd.args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-select_streams",
            "v:0",
            "-i",
            url,
        ])
        .env("LC_ALL", "C");

        let output = match run_with_timeout(&mut cmd, self.timeout).await? {
            BoundedRun::Completed(output) => output,
            BoundedRun::TimedOut => return Err(ProbeError::Timeout(self.timeout)),
        };

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(ProbeError::Failure {
                code: output.status.code(),
                stderr,
            });
        }

        parse_probe_output(&output.stdout)
            .map_err(|reason| ProbeError::InvalidOutput { reason, stderr })
    }
}

fn parse_probe_output(stdout: &[u8]) -> Result<VideoInfo, String> {
    let parsed: FfprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| format!("invalid JSON: {e}"))?;
    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| "no video stream reported".to_string())?;

    let frame_rate = match stream.avg_frame_rate.as_deref() {
        None => 0.0,
        Some(raw) => parse_frame_rate(raw)
            .ok_or_else(|| format!("unrecognized avg_frame_rate '{raw}'"))?,
    };

    Ok(VideoInfo {
        height: stream.height.unwrap_or(0),
        frame_rate,
    })
}

/// Parse an ffprobe frame rate, either `"num/den"` or a plain decimal.
///
/// A zero denominator yields `0.0`. Anything else unparseable is `None`.
///
/// ```
/// use streamwatch::probe::parse_frame_rate;
///
/// assert_eq!(parse_frame_rate("30000/1001").map(|r| (r * 100.0).round()), Some(2997.0));
/// assert_eq!(parse_frame_rate("0/0"), Some(0.0));
/// assert_eq!(parse_frame_rate("25"), Some(25.0));
/// assert_eq!(parse_frame_rate("n/a"), None);
/// ```
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let rate = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 { 0.0 } else { num / den }
        }
        None => raw.parse().ok()?,
    };
    rate.is_finite().then_some(rate)
}
