//! Durable state for the discovery pipeline.
//!
//! [`StateStore`] is the only interface the pipeline and the API see.
//! [`PgStore`] persists to Postgres through the workspace `migrations/`;
//! [`MemoryStore`] keeps everything in process for tests and throwaway runs.

use std::sync::Arc;
use std::time::Duration;

use hnscout_core::{AppConfig, StoreBackend};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/hnscout-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

pub mod discoveries;
pub mod memory;
pub mod pg_store;
pub mod pipeline_runs;
pub mod processed_items;
pub mod store;

pub use memory::MemoryStore;
pub use pg_store::PgStore;
pub use store::StateStore;

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    /// A discovery was written for an item that has no accepted processed
    /// record, or that already has a discovery.
    #[error("discovery for item {item_id} has no matching accepted record or already exists")]
    PairingViolation { item_id: i64 },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // The _sqlx_migrations table does not exist on a fresh database; count that as zero.
    let applied_before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = applied_migrations(pool).await;

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

async fn applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Open the store selected by `HNSCOUT_STORE`.
///
/// For Postgres this connects, applies pending migrations, and pings once so
/// an unreachable database fails here rather than mid-run.
///
/// # Errors
///
/// - [`DbError::MissingDatabaseUrl`] for the Postgres backend without a URL.
/// - [`DbError::Sqlx`] / [`DbError::Migration`] if connecting or migrating fails.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn StateStore>, DbError> {
    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; nothing will be persisted");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(DbError::MissingDatabaseUrl)?;
            let pool = connect_pool(url, PoolConfig::from_app_config(config)).await?;
            let applied = run_migrations(&pool).await?;
            if applied > 0 {
                tracing::info!(applied, "applied database migrations");
            }
            ping(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}
