use async_trait::async_trait;
use chrono::Utc;
use hnscout_core::{DiscoveryRecord, ProcessedRecord, RunRecord, StoredDiscovery, StoredRun};
use sqlx::PgPool;

use crate::store::{window_cutoff, StateStore};
use crate::{discoveries, pipeline_runs, processed_items, ping, DbError};

/// Postgres-backed [`StateStore`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StateStore for PgStore {
    async fn exists(&self, item_id: i64) -> Result<bool, DbError> {
        processed_items::processed_item_exists(&self.pool, item_id).await
    }

    async fn put_processed(&self, record: &ProcessedRecord) -> Result<bool, DbError> {
        processed_items::insert_processed_item(&self.pool, record).await
    }

    async fn put_discovery(&self, record: &DiscoveryRecord) -> Result<(), DbError> {
        discoveries::insert_discovery(&self.pool, record).await
    }

    async fn put_accepted(
        &self,
        processed: &ProcessedRecord,
        discovery: &DiscoveryRecord,
    ) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;

        if !processed_items::insert_processed_item(&mut *tx, processed).await? {
            tx.rollback().await?;
            return Ok(false);
        }
        discoveries::insert_discovery(&mut *tx, discovery).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn latest_processed_timestamp(&self) -> Result<Option<i64>, DbError> {
        processed_items::latest_created_time(&self.pool).await
    }

    async fn append_run(&self, run: &RunRecord) -> Result<i64, DbError> {
        pipeline_runs::insert_pipeline_run(&self.pool, run).await
    }

    async fn top_discoveries(
        &self,
        limit: u32,
        since_days: u32,
    ) -> Result<Vec<StoredDiscovery>, DbError> {
        let cutoff = window_cutoff(Utc::now().timestamp(), since_days);
        discoveries::list_top_discoveries(&self.pool, i64::from(limit), cutoff).await
    }

    async fn list_runs(&self, limit: u32) -> Result<Vec<StoredRun>, DbError> {
        pipeline_runs::list_pipeline_runs(&self.pool, i64::from(limit)).await
    }

    async fn health_check(&self) -> Result<(), DbError> {
        ping(&self.pool).await?;
        Ok(())
    }
}
