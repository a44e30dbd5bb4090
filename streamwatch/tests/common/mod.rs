//! Shared fixtures: a file-backed database, fake media tools and a local
//! playlist server.

#![allow(dead_code)]

use axum::Router;
use axum::routing::get;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use streamwatch::database::repositories::{
    ProbeResultRepository, SourceRepository, SqlxProbeResultRepository, SqlxSourceRepository,
};
use streamwatch::database::{DbPool, init_pool, run_migrations};
use streamwatch::diagnostics::DiagnosticLog;
use streamwatch::playlist::PlaylistFetcher;
use streamwatch::probe::{FrameCapturer, ProbeConfig, StreamProber};
use streamwatch::scheduler::SweepRunner;

/// Fake ffprobe. Behaviour is picked from the stream URL (last argument):
/// `fail` exits 1 with stderr, `hang` sleeps past any deadline, `slow` takes
/// 600ms. Anything else reports 720p at 30/1 right away.
const FAKE_FFPROBE: &str = r#"#!/bin/sh
for last; do :; done
case "$last" in
  *hang*) exec sleep 10 ;;
  *fail*) echo "Server returned 404 Not Found for $last" >&2; exit 1 ;;
  *slow*) sleep 0.6 ;;
esac
echo '{"streams":[{"index":0,"codec_type":"video","height":720,"avg_frame_rate":"30/1"}]}'
"#;

/// Wall-clock time the fake ffprobe spends on a `slow` stream.
pub const SLOW_PROBE: std::time::Duration = std::time::Duration::from_millis(600);

/// Fake ffmpeg. Records each output path in `captures.log` and writes it.
const FAKE_FFMPEG: &str = r#"#!/bin/sh
for last; do :; done
echo "$last" >> "$(dirname "$0")/captures.log"
echo frame > "$last"
"#;

pub struct TestEnv {
    pub dir: TempDir,
    pub pool: DbPool,
    pub probe_config: ProbeConfig,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5)).await
    }

    pub async fn with_timeout(timeout: Duration) -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("streams.db");
        let pool = init_pool(&format!("sqlite:{}?mode=rwc", db_path.display()))
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let probe_config = ProbeConfig {
            ffprobe_path: write_script(&bin, "ffprobe", FAKE_FFPROBE),
            ffmpeg_path: write_script(&bin, "ffmpeg", FAKE_FFMPEG),
            timeout,
            frames_dir: dir.path().join("frames"),
        };

        Self {
            dir,
            pool,
            probe_config,
        }
    }

    pub fn diagnostic_log_path(&self) -> PathBuf {
        self.dir.path().join("ffmpeg.log")
    }

    pub fn diagnostic_log(&self) -> String {
        std::fs::read_to_string(self.diagnostic_log_path()).unwrap_or_default()
    }

    /// Output paths the fake ffmpeg was invoked with, in call order.
    pub fn captures(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("bin").join("captures.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn sources(&self) -> Arc<dyn SourceRepository> {
        Arc::new(SqlxSourceRepository::new(self.pool.clone()))
    }

    pub fn results(&self) -> Arc<dyn ProbeResultRepository> {
        Arc::new(SqlxProbeResultRepository::new(self.pool.clone()))
    }

    pub fn runner(&self) -> Arc<SweepRunner> {
        let diagnostics = DiagnosticLog::new(self.diagnostic_log_path());
        Arc::new(SweepRunner::new(
            self.sources(),
            self.results(),
            PlaylistFetcher::new(Duration::from_secs(5)),
            StreamProber::new(&self.probe_config, diagnostics.clone()),
            FrameCapturer::new(&self.probe_config, diagnostics),
        ))
    }

    pub async fn add_source(&self, name: &str, url: &str) -> i64 {
        sqlx::query("INSERT INTO m3u_sources (name, url) VALUES (?, ?)")
            .bind(name)
            .bind(url)
            .execute(&self.pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    pub async fn row_count(&self) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stream_data")
            .fetch_one(&self.pool)
            .await
            .unwrap();
        count
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

/// Build an extended M3U playlist from `(name, url)` pairs.
pub fn playlist(entries: &[(&str, &str)]) -> String {
    let mut text = String::from("#EXTM3U\n");
    for (name, url) in entries {
        text.push_str(&format!(
            "#EXTINF:-1 tvg-logo=\"http://logos.example/{name}.png\",{name}\n{url}\n"
        ));
    }
    text
}

/// Serve fixed playlists on a loopback port. Returns the base URL.
///
/// Unknown paths answer 404.
pub async fn serve_playlists(routes: Vec<(&'static str, String)>) -> String {
    let mut app = Router::new();
    for (path, body) in routes {
        app = app.route(
            path,
            get(move || {
                let body = body.clone();
                async move { body }
            }),
        );
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
