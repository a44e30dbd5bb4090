//! Service container for dependency injection.
//!
//! Builds the repositories, tools and scheduler from one [`MonitorConfig`]
//! and owns their lifecycle.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::Result;
use crate::config::MonitorConfig;
use crate::database::repositories::{
    ProbeResultRepository, SourceRepository, SqlxProbeResultRepository, SqlxSourceRepository,
};
use crate::diagnostics::DiagnosticLog;
use crate::playlist::PlaylistFetcher;
use crate::probe::{FrameCapturer, StreamProber};
use crate::scheduler::{Scheduler, SweepRunner};

/// Default shutdown timeout.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Holds every long-lived component of the monitor.
pub struct ServiceContainer {
    /// Database connection pool.
    pub pool: SqlitePool,
    pub sources: Arc<dyn SourceRepository>,
    pub results: Arc<dyn ProbeResultRepository>,
    pub scheduler: Arc<Scheduler>,
    cancellation_token: CancellationToken,
    loop_handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl ServiceContainer {
    pub fn new(pool: SqlitePool, config: &MonitorConfig) -> Self {
        info!("Initializing service container");

        let sources: Arc<dyn SourceRepository> =
            Arc::new(SqlxSourceRepository::new(pool.clone()));
        let results: Arc<dyn ProbeResultRepository> =
            Arc::new(SqlxProbeResultRepository::new(pool.clone()));

        let diagnostics = DiagnosticLog::new(config.diagnostic_log_path.clone());
        let probe_config = config.probe_config();
        let runner = Arc::new(SweepRunner::new(
            sources.clone(),
            results.clone(),
            PlaylistFetcher::new(config.fetch_timeout),
            StreamProber::new(&probe_config, diagnostics.clone()),
            FrameCapturer::new(&probe_config, diagnostics),
        ));

        let cancellation_token = CancellationToken::new();
        let scheduler = Arc::new(Scheduler::with_cancellation(
            runner,
            config.scheduler_config(),
            cancellation_token.child_token(),
        ));

        Self {
            pool,
            sources,
            results,
            scheduler,
            cancellation_token,
            loop_handle: parking_lot::Mutex::new(None),
        }
    }

    /// Start the periodic sweep loop. Calling it twice has no effect.
    pub fn start(&self) {
        let mut handle = self.loop_handle.lock();
        if handle.is_some() {
            warn!("Sweep loop already started");
            return;
        }
        *handle = Some(self.scheduler.start());
        info!("Sweep loop started");
    }

    /// Trigger a background sweep of a newly registered source.
    pub fn on_source_registered(&self, source_id: i64) -> bool {
        self.scheduler.spawn_source_sweep(source_id)
    }

    /// Shutdown all services gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Shutdown all services gracefully with a custom timeout.
    ///
    /// A sweep still running when the timeout passes is abandoned. Its tool
    /// processes are killed once the runtime drops the task.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<()> {
        info!("Shutting down services (timeout: {:?})", timeout);
        self.cancellation_token.cancel();

        let loop_handle = self.loop_handle.lock().take();
        let drained = tokio::time::timeout(timeout, async {
            self.scheduler.shutdown().await;
            if let Some(handle) = loop_handle {
                if let Err(e) = handle.await {
                    warn!("Sweep loop task ended abnormally: {}", e);
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Shutdown timeout reached, forcing shutdown");
        }

        info!("Closing database pool...");
        self.pool.close().await;

        info!("Services shut down");
        Ok(())
    }

    /// Get the cancellation token for external use.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
