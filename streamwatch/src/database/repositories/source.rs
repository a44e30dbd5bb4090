//! Source repository (read side only).

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::SourceDbModel;
use crate::{Error, Result};

/// Read access to the playlist sources.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// All sources, in id order.
    async fn list_sources(&self) -> Result<Vec<SourceDbModel>>;
    async fn get_source(&self, id: i64) -> Result<SourceDbModel>;
}

/// SQLx implementation of SourceRepository.
pub struct SqlxSourceRepository {
    pool: SqlitePool,
}

impl SqlxSourceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceRepository for SqlxSourceRepository {
    async fn list_sources(&self) -> Result<Vec<SourceDbModel>> {
        let sources = sqlx::query_as::<_, SourceDbModel>(
            "SELECT id, name, url FROM m3u_sources ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sources)
    }

    async fn get_source(&self, id: i64) -> Result<SourceDbModel> {
        sqlx::query_as::<_, SourceDbModel>("SELECT id, name, url FROM m3u_sources WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("Source", id))
    }
}
