//! Database operations for `processed_items`.

use chrono::{DateTime, Utc};
use hnscout_core::{ItemKind, ProcessedRecord};
use sqlx::{PgExecutor, PgPool};

use crate::DbError;

/// A row from the `processed_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProcessedItemRow {
    pub item_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub author: Option<String>,
    pub score: i64,
    pub comments: i64,
    pub created_time: i64,
    pub is_startup: bool,
    pub is_innovation: bool,
    pub item_type: String,
    pub processed_at: DateTime<Utc>,
}

impl From<ProcessedItemRow> for ProcessedRecord {
    fn from(row: ProcessedItemRow) -> Self {
        Self {
            item_id: row.item_id,
            title: row.title,
            url: row.url,
            author: row.author,
            score: row.score,
            comments: row.comments,
            created_time: row.created_time,
            is_startup: row.is_startup,
            is_innovation: row.is_innovation,
            item_type: ItemKind::from_label(&row.item_type),
            processed_at: row.processed_at,
        }
    }
}

/// Returns `true` if `item_id` has been processed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn processed_item_exists(pool: &PgPool, item_id: i64) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM processed_items WHERE item_id = $1)",
    )
    .bind(item_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Inserts a processed record unless the id is already present.
///
/// Returns `true` when a row was written. Accepts any executor so it can run
/// inside a transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_processed_item<'e>(
    executor: impl PgExecutor<'e>,
    record: &ProcessedRecord,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO processed_items \
             (item_id, title, url, author, score, comments, created_time, \
              is_startup, is_innovation, item_type, processed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (item_id) DO NOTHING",
    )
    .bind(record.item_id)
    .bind(&record.title)
    .bind(record.url.as_deref())
    .bind(record.author.as_deref())
    .bind(record.score)
    .bind(record.comments)
    .bind(record.created_time)
    .bind(record.is_startup)
    .bind(record.is_innovation)
    .bind(record.item_type.as_str())
    .bind(record.processed_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Fetches one processed record.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_processed_item(
    pool: &PgPool,
    item_id: i64,
) -> Result<Option<ProcessedRecord>, DbError> {
    let row = sqlx::query_as::<_, ProcessedItemRow>(
        "SELECT item_id, title, url, author, score, comments, created_time, \
                is_startup, is_innovation, item_type, processed_at \
         FROM processed_items \
         WHERE item_id = $1",
    )
    .bind(item_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(ProcessedRecord::from))
}

/// Largest `created_time` across all processed items, `None` when empty.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_created_time(pool: &PgPool) -> Result<Option<i64>, DbError> {
    let latest = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT MAX(created_time) FROM processed_items",
    )
    .fetch_one(pool)
    .await?;

    Ok(latest)
}
