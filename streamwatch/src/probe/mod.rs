//! External media tool invocations.
//!
//! [`StreamProber`] runs ffprobe against a stream and turns whatever happens
//! into a [`ProbeResult`](crate::domain::ProbeResult). [`FrameCapturer`]
//! runs ffmpeg to snapshot one frame of a stream that probed successfully.
//! Both share a single deadline and never fail the caller.

mod capture;
mod prober;

pub use capture::{CaptureError, FrameCapturer};
pub use prober::{ProbeError, StreamProber, parse_frame_rate};

use std::path::PathBuf;
use std::time::Duration;

/// Tool locations and limits shared by probing and capture.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    /// Deadline for each tool run. The child is killed when it passes.
    pub timeout: Duration,
    pub frames_dir: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            timeout: Duration::from_secs(15),
            frames_dir: PathBuf::from("static/frames"),
        }
    }
}
