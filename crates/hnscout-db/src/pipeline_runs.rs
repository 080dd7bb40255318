//! Database operations for `pipeline_runs`.

use chrono::{DateTime, Utc};
use hnscout_core::{RunMode, RunRecord, RunStatus, StoredRun};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `pipeline_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PipelineRunRow {
    pub id: i64,
    pub mode: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub items_fetched: i64,
    pub candidates: i64,
    pub processed: i64,
    pub accepted: i64,
    pub status: String,
    pub error_message: Option<String>,
}

impl From<PipelineRunRow> for StoredRun {
    fn from(row: PipelineRunRow) -> Self {
        Self {
            id: row.id,
            run: RunRecord {
                mode: RunMode::from_label(&row.mode),
                started_at: row.started_at,
                finished_at: row.finished_at,
                items_fetched: row.items_fetched,
                candidates: row.candidates,
                processed: row.processed,
                accepted: row.accepted,
                status: RunStatus::from_label(&row.status),
                error_message: row.error_message,
            },
        }
    }
}

/// Appends a run record and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_pipeline_run(pool: &PgPool, run: &RunRecord) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO pipeline_runs \
             (mode, started_at, finished_at, items_fetched, candidates, processed, \
              accepted, status, error_message) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(run.mode.as_str())
    .bind(run.started_at)
    .bind(run.finished_at)
    .bind(run.items_fetched)
    .bind(run.candidates)
    .bind(run.processed)
    .bind(run.accepted)
    .bind(run.status.as_str())
    .bind(run.error_message.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_pipeline_runs(pool: &PgPool, limit: i64) -> Result<Vec<StoredRun>, DbError> {
    let rows = sqlx::query_as::<_, PipelineRunRow>(
        "SELECT id, mode, started_at, finished_at, items_fetched, candidates, processed, \
                accepted, status, error_message \
         FROM pipeline_runs \
         ORDER BY started_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StoredRun::from).collect())
}
