//! Single-frame snapshots with ffmpeg.

use process_utils::{BoundedRun, run_with_timeout, tokio_command};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use super::ProbeConfig;
use crate::diagnostics::{DiagnosticKind, DiagnosticLog};
use crate::domain::StreamDescriptor;
use crate::utils::filename::frame_path;

/// Why a frame capture did not produce an image.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to prepare frames directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run capture tool: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("capture timed out after {0:?}")]
    Timeout(Duration),

    #[error("capture tool exited with {code:?}")]
    Failure { code: Option<i32>, stderr: String },
}

/// Writes one still frame per stream to `frames_dir`.
#[derive(Debug, Clone)]
pub struct FrameCapturer {
    ffmpeg_path: String,
    timeout: Duration,
    frames_dir: PathBuf,
    diagnostics: DiagnosticLog,
}

impl FrameCapturer {
    pub fn new(config: &ProbeConfig, diagnostics: DiagnosticLog) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            timeout: config.timeout,
            frames_dir: config.frames_dir.clone(),
            diagnostics,
        }
    }

    /// Capture a frame, recording any failure in the diagnostic log.
    ///
    /// Never fails. The frame file is overwritten on every success.
    pub async fn capture_best_effort(&self, source_id: i64, stream: &StreamDescriptor) {
        match self.capture(source_id, stream).await {
            Ok(path) => debug!(
                source_id,
                stream = %stream.name,
                path = %path.display(),
                "Frame captured"
            ),
            Err(e) => {
                warn!(source_id, stream = %stream.name, error = %e, "Frame capture failed");
                let body = match &e {
                    CaptureError::Failure { stderr, .. } if !stderr.trim().is_empty() => {
                        stderr.clone()
                    }
                    other => other.to_string(),
                };
                self.diagnostics
                    .append(DiagnosticKind::Capture, &stream.name, &body)
                    .await;
            }
        }
    }

    /// Capture a frame and return the path it was written to.
    pub async fn capture(
        &self,
        source_id: i64,
        stream: &StreamDescriptor,
    ) -> Result<PathBuf, CaptureError> {
        tokio::fs::create_dir_all(&self.frames_dir)
            .await
            .map_err(|source| CaptureError::Directory {
                path: self.frames_dir.clone(),
                source,
            })?;

        let output_path = frame_path(&self.frames_dir, source_id, &stream.name);

        let mut cmd = tokio_command(&self.ffmpeg_path);
        cmd.args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(&stream.url)
            .args(["-vframes", "1"])
            .arg(&output_path)
            .env("LC_ALL", "C");

        match run_with_timeout(&mut cmd, self.timeout).await? {
            BoundedRun::TimedOut => Err(CaptureError::Timeout(self.timeout)),
            BoundedRun::Completed(output) if output.status.success() => Ok(output_path),
            BoundedRun::Completed(output) => Err(CaptureError::Failure {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn capturer(dir: &Path, ffmpeg: String, timeout: Duration) -> FrameCapturer {
        let config = ProbeConfig {
            ffmpeg_path: ffmpeg,
            timeout,
            frames_dir: dir.join("frames"),
            ..ProbeConfig::default()
        };
        FrameCapturer::new(&config, DiagnosticLog::new(dir.join("ffmpeg.log")))
    }

    #[tokio::test]
    async fn test_capture_writes_to_deterministic_path() {
        let dir = tempfile::tempdir().unwrap();
        // The output path is the last argument.
        let ffmpeg = script(dir.path(), "ffmpeg", r#"for last; do :; done; echo frame > "$last""#);
        let stream = StreamDescriptor::new("News: 24/7 ", "http://example.com/news.m3u8");

        let path = capturer(dir.path(), ffmpeg, Duration::from_secs(5))
            .capture(2, &stream)
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("frames").join("s2_News 247.jpg"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_failed_capture_is_logged_and_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = script(dir.path(), "ffmpeg", "echo 'Invalid data found' >&2; exit 1");
        let stream = StreamDescriptor::new("Broken", "http://example.com/broken.m3u8");
        let capturer = capturer(dir.path(), ffmpeg, Duration::from_secs(5));

        capturer.capture_best_effort(1, &stream).await;

        let log = std::fs::read_to_string(dir.path().join("ffmpeg.log")).unwrap();
        assert!(log.contains("--- FFMPEG CAPTURE LOG:"));
        assert!(log.contains("Invalid data found"));
        assert!(!dir.path().join("frames").join("s1_Broken.jpg").exists());
    }

    #[tokio::test]
    async fn test_capture_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = script(dir.path(), "ffmpeg", "exec sleep 10");
        let stream = StreamDescriptor::new("Slow", "http://example.com/slow.m3u8");

        let err = capturer(dir.path(), ffmpeg, Duration::from_millis(200))
            .capture(1, &stream)
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Timeout(_)));
    }
}
