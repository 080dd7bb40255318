use async_trait::async_trait;
use hnscout_core::{DiscoveryRecord, ProcessedRecord, RunRecord, StoredDiscovery, StoredRun};

use crate::DbError;

/// Read/write contract for pipeline state.
///
/// The pipeline is the only writer; the report and API layers only read.
/// Implementations must keep the pairing invariant: a discovery exists only
/// for an item whose processed record has exactly one of `is_startup` /
/// `is_innovation` set.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Whether `item_id` has a processed record.
    async fn exists(&self, item_id: i64) -> Result<bool, DbError>;

    /// Insert a processed record. Returns `false` and changes nothing if the
    /// id is already present.
    async fn put_processed(&self, record: &ProcessedRecord) -> Result<bool, DbError>;

    /// Insert a discovery for an already-accepted processed record.
    ///
    /// Fails with [`DbError::PairingViolation`] if there is no such record or
    /// the item already has a discovery.
    async fn put_discovery(&self, record: &DiscoveryRecord) -> Result<(), DbError>;

    /// Write a processed record and its discovery atomically.
    ///
    /// Returns `false` and writes nothing if the item is already processed.
    async fn put_accepted(
        &self,
        processed: &ProcessedRecord,
        discovery: &DiscoveryRecord,
    ) -> Result<bool, DbError>;

    /// Creation time (epoch seconds) of the newest processed item.
    async fn latest_processed_timestamp(&self) -> Result<Option<i64>, DbError>;

    /// Append a run record and return its id.
    async fn append_run(&self, run: &RunRecord) -> Result<i64, DbError>;

    /// Discoveries whose item was created in the last `since_days` days,
    /// best `innovation_score` first (ties by item id).
    async fn top_discoveries(
        &self,
        limit: u32,
        since_days: u32,
    ) -> Result<Vec<StoredDiscovery>, DbError>;

    /// Most recent runs first.
    async fn list_runs(&self, limit: u32) -> Result<Vec<StoredRun>, DbError>;

    async fn health_check(&self) -> Result<(), DbError>;
}

/// Exclusive lower bound (epoch seconds) for the `since_days` window.
pub(crate) fn window_cutoff(now: i64, since_days: u32) -> i64 {
    now - i64::from(since_days) * 86_400
}
