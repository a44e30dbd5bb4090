//! Periodic sweep loop and on-demand sweep launcher.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::sweep::{SweepReport, SweepRunner};
use crate::Result;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Delay between the end of one full sweep and the start of the next.
    pub sweep_interval: Duration,
    /// Maximum number of on-demand sweeps running at once.
    pub max_on_demand_sweeps: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(600),
            max_on_demand_sweeps: 4,
        }
    }
}

/// Phase of the periodic loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Sweeping,
    Idle,
}

impl fmt::Display for SweepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sweeping => write!(f, "sweeping"),
            Self::Idle => write!(f, "idle"),
        }
    }
}

/// Drives the periodic full sweep and launches single-source sweeps.
///
/// The two never coordinate: a source may be swept by the loop and by an
/// on-demand task at the same time.
pub struct Scheduler {
    runner: Arc<SweepRunner>,
    config: SchedulerConfig,
    state: Mutex<SweepState>,
    cancellation_token: CancellationToken,
    /// Caps concurrently running on-demand sweeps.
    on_demand: Arc<Semaphore>,
    tasks: Mutex<JoinSet<()>>,
}

impl Scheduler {
    pub fn new(runner: Arc<SweepRunner>, config: SchedulerConfig) -> Self {
        Self::with_cancellation(runner, config, CancellationToken::new())
    }

    pub fn with_cancellation(
        runner: Arc<SweepRunner>,
        config: SchedulerConfig,
        cancellation_token: CancellationToken,
    ) -> Self {
        let permits = config.max_on_demand_sweeps.max(1);
        Self {
            runner,
            config,
            state: Mutex::new(SweepState::Sweeping),
            cancellation_token,
            on_demand: Arc::new(Semaphore::new(permits)),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn state(&self) -> SweepState {
        *self.state.lock()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.cancellation_token.is_cancelled()
    }

    /// Run one full sweep now, on the caller's task.
    pub async fn sweep_all(&self) -> Result<SweepReport> {
        self.runner.sweep_all(&self.cancellation_token).await
    }

    /// Sweep one source now, on the caller's task.
    pub async fn sweep_source(&self, source_id: i64) -> Result<SweepReport> {
        self.runner.sweep_source(source_id).await
    }

    /// Launch a single-source sweep in the background and return immediately.
    ///
    /// Meant to be called right after a source is registered. When all
    /// on-demand permits are taken the task waits for one. Returns `false`
    /// once the scheduler has been shut down.
    pub fn spawn_source_sweep(&self, source_id: i64) -> bool {
        // Checked under the lock. `shutdown` cancels before it takes the set,
        // so every task pushed here is drained.
        let mut tasks = self.tasks.lock();
        if self.cancellation_token.is_cancelled() {
            warn!(source_id, "Scheduler is shut down, ignoring sweep request");
            return false;
        }

        let runner = self.runner.clone();
        let semaphore = self.on_demand.clone();
        let cancellation_token = self.cancellation_token.clone();

        // Reap finished tasks so the set does not grow without bound.
        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                error!("On-demand sweep task panicked: {}", e);
            }
        }

        tasks.spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => {
                    debug!(source_id, "On-demand sweep dropped before start");
                    return;
                }
                permit = semaphore.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };

            if let Err(e) = runner.sweep_source(source_id).await {
                error!(source_id, error = %e, "On-demand sweep failed");
            }
        });
        debug!(source_id, in_flight = tasks.len(), "On-demand sweep launched");
        true
    }

    /// Number of on-demand sweeps not yet reaped.
    pub fn on_demand_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run the periodic loop until cancelled.
    ///
    /// Sweeps once immediately, then waits `sweep_interval` after each sweep
    /// finishes before starting the next. Sweep errors are logged and never
    /// end the loop.
    pub async fn run(&self) {
        info!(
            interval_secs = self.config.sweep_interval.as_secs(),
            "Starting sweep scheduler"
        );

        loop {
            self.set_state(SweepState::Sweeping);
            if let Err(e) = self.runner.sweep_all(&self.cancellation_token).await {
                error!(error = %e, "Full sweep failed");
            }
            self.set_state(SweepState::Idle);

            tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    info!("Sweep scheduler received cancellation signal");
                    break;
                }
                _ = tokio::time::sleep(self.config.sweep_interval) => {}
            }
        }

        info!("Sweep scheduler stopped");
    }

    /// Spawn [`run`](Self::run) onto the runtime.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run().await })
    }

    /// Cancel the loop and wait for in-flight on-demand sweeps.
    pub async fn shutdown(&self) {
        info!("Shutting down sweep scheduler");
        self.cancellation_token.cancel();

        // Take the set out of the mutex before awaiting.
        let mut join_set = std::mem::take(&mut *self.tasks.lock());
        while let Some(result) = join_set.join_next().await {
            if let Err(e) = result {
                error!("On-demand sweep task panicked: {}", e);
            }
        }
    }

    fn set_state(&self, state: SweepState) {
        let mut current = self.state.lock();
        if *current != state {
            debug!(from = %*current, to = %state, "Scheduler state changed");
            *current = state;
        }
    }
}
