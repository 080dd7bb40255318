//! In-process [`StateStore`] for tests and `HNSCOUT_STORE=memory`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use hnscout_core::{DiscoveryRecord, ProcessedRecord, RunRecord, StoredDiscovery, StoredRun};
use tokio::sync::RwLock;

use crate::store::{window_cutoff, StateStore};
use crate::DbError;

#[derive(Debug, Default)]
struct Tables {
    processed: BTreeMap<i64, ProcessedRecord>,
    discoveries: BTreeMap<i64, DiscoveryRecord>,
    runs: Vec<StoredRun>,
}

impl Tables {
    fn discovery_allowed(&self, item_id: i64) -> bool {
        !self.discoveries.contains_key(&item_id)
            && self
                .processed
                .get(&item_id)
                .is_some_and(ProcessedRecord::is_discovery)
    }
}

/// Map-backed store with the same semantics as the Postgres one.
///
/// `set_unavailable(true)` makes every operation fail, for exercising
/// persistence-error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of a processed record, for assertions.
    pub async fn processed(&self, item_id: i64) -> Option<ProcessedRecord> {
        self.tables.read().await.processed.get(&item_id).cloned()
    }

    /// Snapshot of a discovery, for assertions.
    pub async fn discovery(&self, item_id: i64) -> Option<DiscoveryRecord> {
        self.tables.read().await.discoveries.get(&item_id).cloned()
    }

    pub async fn processed_count(&self) -> usize {
        self.tables.read().await.processed.len()
    }

    pub async fn discovery_count(&self) -> usize {
        self.tables.read().await.discoveries.len()
    }

    fn check(&self) -> Result<(), DbError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn exists(&self, item_id: i64) -> Result<bool, DbError> {
        self.check()?;
        Ok(self.tables.read().await.processed.contains_key(&item_id))
    }

    async fn put_processed(&self, record: &ProcessedRecord) -> Result<bool, DbError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.processed.contains_key(&record.item_id) {
            return Ok(false);
        }
        tables.processed.insert(record.item_id, record.clone());
        Ok(true)
    }

    async fn put_discovery(&self, record: &DiscoveryRecord) -> Result<(), DbError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if !tables.discovery_allowed(record.item_id) {
            return Err(DbError::PairingViolation {
                item_id: record.item_id,
            });
        }
        tables.discoveries.insert(record.item_id, record.clone());
        Ok(())
    }

    async fn put_accepted(
        &self,
        processed: &ProcessedRecord,
        discovery: &DiscoveryRecord,
    ) -> Result<bool, DbError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.processed.contains_key(&processed.item_id) {
            return Ok(false);
        }
        if !processed.is_discovery()
            || processed.item_id != discovery.item_id
            || tables.discoveries.contains_key(&discovery.item_id)
        {
            return Err(DbError::PairingViolation {
                item_id: discovery.item_id,
            });
        }
        tables.processed.insert(processed.item_id, processed.clone());
        tables.discoveries.insert(discovery.item_id, discovery.clone());
        Ok(true)
    }

    async fn latest_processed_timestamp(&self) -> Result<Option<i64>, DbError> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .await
            .processed
            .values()
            .map(|r| r.created_time)
            .max())
    }

    async fn append_run(&self, run: &RunRecord) -> Result<i64, DbError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let id = i64::try_from(tables.runs.len()).unwrap_or(i64::MAX - 1) + 1;
        tables.runs.push(StoredRun {
            id,
            run: run.clone(),
        });
        Ok(id)
    }

    async fn top_discoveries(
        &self,
        limit: u32,
        since_days: u32,
    ) -> Result<Vec<StoredDiscovery>, DbError> {
        self.check()?;
        let cutoff = window_cutoff(Utc::now().timestamp(), since_days);
        let tables = self.tables.read().await;

        let mut rows: Vec<StoredDiscovery> = tables
            .discoveries
            .values()
            .filter_map(|discovery| {
                let item = tables.processed.get(&discovery.item_id)?;
                (item.created_time > cutoff).then(|| StoredDiscovery {
                    item: item.clone(),
                    discovery: discovery.clone(),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.discovery
                .innovation_score
                .total_cmp(&a.discovery.innovation_score)
                .then(a.item.item_id.cmp(&b.item.item_id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn list_runs(&self, limit: u32) -> Result<Vec<StoredRun>, DbError> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut runs = tables.runs.clone();
        runs.sort_by(|a, b| {
            b.run
                .started_at
                .cmp(&a.run.started_at)
                .then(b.id.cmp(&a.id))
        });
        runs.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(runs)
    }

    async fn health_check(&self) -> Result<(), DbError> {
        self.check()
    }
}
