//! One pass of fetch, parse, probe and record.

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::database::models::SourceDbModel;
use crate::database::repositories::{ProbeResultRepository, SourceRepository};
use crate::domain::StreamDescriptor;
use crate::playlist::{PlaylistFetcher, parse_playlist};
use crate::probe::{FrameCapturer, StreamProber};

/// Counters for a finished sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Sources visited.
    pub sources: usize,
    /// Probe attempts made.
    pub streams: usize,
    /// Attempts that found the stream available.
    pub available: usize,
    /// Results that could not be stored.
    pub persist_failures: usize,
}

impl SweepReport {
    pub fn merge(&mut self, other: SweepReport) {
        self.sources += other.sources;
        self.streams += other.streams;
        self.available += other.available;
        self.persist_failures += other.persist_failures;
    }

    /// Results actually written to the store.
    pub fn recorded(&self) -> usize {
        self.streams - self.persist_failures
    }
}

/// Executes sweeps. Shared by the periodic loop and on-demand tasks.
///
/// Holds no per-sweep state, so any number of sweeps may run on one runner
/// at the same time.
pub struct SweepRunner {
    sources: Arc<dyn SourceRepository>,
    results: Arc<dyn ProbeResultRepository>,
    fetcher: PlaylistFetcher,
    prober: StreamProber,
    capturer: FrameCapturer,
}

impl SweepRunner {
    pub fn new(
        sources: Arc<dyn SourceRepository>,
        results: Arc<dyn ProbeResultRepository>,
        fetcher: PlaylistFetcher,
        prober: StreamProber,
        capturer: FrameCapturer,
    ) -> Self {
        Self {
            sources,
            results,
            fetcher,
            prober,
            capturer,
        }
    }

    /// Sweep every source in id order.
    ///
    /// Only a failure to list sources is returned. `cancel` is checked between
    /// sources; a source already being swept is finished first.
    pub async fn sweep_all(&self, cancel: &CancellationToken) -> Result<SweepReport> {
        let sources = self.sources.list_sources().await?;
        let mut report = SweepReport::default();

        if sources.is_empty() {
            info!("No sources configured, nothing to sweep");
            return Ok(report);
        }

        let started = Instant::now();
        info!(sources = sources.len(), "Starting full sweep");

        for source in &sources {
            if cancel.is_cancelled() {
                info!("Full sweep interrupted by shutdown");
                break;
            }
            report.merge(self.sweep(source).await);
        }

        info!(
            sources = report.sources,
            streams = report.streams,
            available = report.available,
            persist_failures = report.persist_failures,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Full sweep finished"
        );
        Ok(report)
    }

    /// Sweep a single source by id.
    ///
    /// An unknown id is logged and yields an empty report.
    pub async fn sweep_source(&self, source_id: i64) -> Result<SweepReport> {
        let source = match self.sources.get_source(source_id).await {
            Ok(source) => source,
            Err(crate::Error::NotFound { .. }) => {
                warn!(source_id, "Sweep requested for unknown source");
                return Ok(SweepReport::default());
            }
            Err(e) => return Err(e),
        };

        let report = self.sweep(&source).await;
        info!(
            source_id,
            source = %source.name,
            streams = report.streams,
            available = report.available,
            "Source sweep finished"
        );
        Ok(report)
    }

    async fn sweep(&self, source: &SourceDbModel) -> SweepReport {
        let mut report = SweepReport {
            sources: 1,
            ..SweepReport::default()
        };

        let content = self.fetcher.fetch(&source.url).await;
        let streams = parse_playlist(content.as_deref());
        debug!(
            source_id = source.id,
            source = %source.name,
            streams = streams.len(),
            "Playlist parsed"
        );

        for stream in &streams {
            self.probe_stream(source.id, stream, &mut report).await;
        }
        report
    }

    async fn probe_stream(&self, source_id: i64, stream: &StreamDescriptor, report: &mut SweepReport) {
        let result = self.prober.probe(source_id, stream).await;
        report.streams += 1;

        if result.is_available {
            report.available += 1;
            self.capturer.capture_best_effort(source_id, stream).await;
        }

        if let Err(e) = self.results.insert(&result).await {
            report.persist_failures += 1;
            error!(
                source_id,
                stream = %stream.name,
                data_loss = e.is_data_loss(),
                error = %e,
                "Probe result was not recorded"
            );
        }
    }
}
