//! Append-only diagnostic log for external tool output.
//!
//! Failed probes and captures leave a timestamped block with the tool's raw
//! stderr. The file is for humans only and is never read back. Writers are
//! not coordinated; each block goes out in a single append so concurrent
//! sweeps interleave whole blocks at worst.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Which tool a diagnostic block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Probe,
    Capture,
}

impl DiagnosticKind {
    fn header(&self) -> &'static str {
        match self {
            Self::Probe => "FFPROBE LOG",
            Self::Capture => "FFMPEG CAPTURE LOG",
        }
    }
}

/// Handle to the shared diagnostic log file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: Arc<PathBuf>,
}

impl DiagnosticLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one block. Write errors are logged and dropped.
    pub async fn append(&self, kind: DiagnosticKind, stream_name: &str, body: &str) {
        let block = format_block(kind, stream_name, body);
        if let Err(e) = self.write(block.as_bytes()).await {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to write diagnostic log"
            );
        }
    }

    async fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_path())
            .await?;
        file.write_all(bytes).await?;
        file.flush().await
    }
}

fn format_block(kind: DiagnosticKind, stream_name: &str, body: &str) -> String {
    format!(
        "\n--- {}: {} for {} ---\n{}\n",
        kind.header(),
        Utc::now().format("%Y-%m-%d %H:%M:%S%.6f"),
        stream_name,
        body.trim_end()
    )
}
