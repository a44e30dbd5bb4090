//! Probe result repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::database::models::{AvailabilitySummary, ProbeResultDbModel};
use crate::database::retry::with_busy_retry;
use crate::domain::ProbeResult;
use crate::{Error, Result};

/// Append and query access to the probe time series.
#[async_trait]
pub trait ProbeResultRepository: Send + Sync {
    /// Append one result and return its row id.
    ///
    /// Each call is an independent statement. Failures come back as
    /// [`Error::Persist`].
    async fn insert(&self, result: &ProbeResult) -> Result<i64>;

    /// Results for one stream with `from <= timestamp <= to`, oldest first.
    async fn query_range(
        &self,
        source_id: i64,
        stream_name: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ProbeResultDbModel>>;

    /// The highest-id row of every stream seen for a source, ordered by name.
    async fn latest_per_stream(&self, source_id: i64) -> Result<Vec<ProbeResultDbModel>>;

    /// Total and successful runs for a source since `since`.
    async fn availability_since(
        &self,
        source_id: i64,
        since: DateTime<Utc>,
    ) -> Result<AvailabilitySummary>;

    async fn count_for_source(&self, source_id: i64) -> Result<i64>;
}

/// SQLx implementation of ProbeResultRepository.
pub struct SqlxProbeResultRepository {
    pool: SqlitePool,
}

impl SqlxProbeResultRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProbeResultRepository for SqlxProbeResultRepository {
    async fn insert(&self, result: &ProbeResult) -> Result<i64> {
        let pool = &self.pool;
        let timestamp = result.timestamp.timestamp_millis();

        with_busy_retry("insert_probe_result", || {
            let query = sqlx::query(
                r#"
                INSERT INTO stream_data
                    (source_id, timestamp, stream_name, is_available, resolution_h, frame_rate, load_time_ms, logo_url)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(result.source_id)
            .bind(timestamp)
            .bind(&result.stream_name)
            .bind(result.is_available)
            .bind(i64::from(result.resolution_height))
            .bind(result.frame_rate)
            .bind(result.load_time_ms)
            .bind(&result.logo_url);

            async move { query.execute(pool).await.map(|done| done.last_insert_rowid()) }
        })
        .await
        .map_err(|source| Error::Persist {
            source_id: result.source_id,
            stream_name: result.stream_name.clone(),
            source,
        })
    }

    async fn query_range(
        &self,
        source_id: i64,
        stream_name: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ProbeResultDbModel>> {
        let rows = sqlx::query_as::<_, ProbeResultDbModel>(
            r#"
            SELECT * FROM stream_data
            WHERE source_id = ? AND stream_name = ? AND timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp, id
            "#,
        )
        .bind(source_id)
        .bind(stream_name)
        .bind(from.timestamp_millis())
        .bind(to.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn latest_per_stream(&self, source_id: i64) -> Result<Vec<ProbeResultDbModel>> {
        let rows = sqlx::query_as::<_, ProbeResultDbModel>(
            r#"
            SELECT * FROM stream_data
            WHERE id IN (
                SELECT MAX(id) FROM stream_data WHERE source_id = ? GROUP BY stream_name
            )
            ORDER BY stream_name
            "#,
        )
        .bind(source_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn availability_since(
        &self,
        source_id: i64,
        since: DateTime<Utc>,
    ) -> Result<AvailabilitySummary> {
        let summary = sqlx::query_as::<_, AvailabilitySummary>(
            r#"
            SELECT COUNT(id) AS total_runs, COALESCE(SUM(is_available), 0) AS successful_runs
            FROM stream_data
            WHERE source_id = ? AND timestamp >= ?
            "#,
        )
        .bind(source_id)
        .bind(since.timestamp_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }

    async fn count_for_source(&self, source_id: i64) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM stream_data WHERE source_id = ?")
                .bind(source_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
