//! Database operations for `discoveries`.

use chrono::{DateTime, Utc};
use hnscout_core::{DiscoveryRecord, ItemKind, ProcessedRecord, StoredDiscovery, Verdict};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use crate::DbError;

/// One discovery joined with its processed item.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DiscoveryRow {
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
    pub innovation_score: f64,
    pub category: String,
    pub summary: String,
    pub verdict: Json<Verdict>,
    pub created_at: DateTime<Utc>,
}

impl From<DiscoveryRow> for StoredDiscovery {
    fn from(row: DiscoveryRow) -> Self {
        Self {
            item: ProcessedRecord {
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
            },
            discovery: DiscoveryRecord {
                item_id: row.item_id,
                innovation_score: row.innovation_score,
                category: row.category,
                summary: row.summary,
                verdict: row.verdict.0,
                created_at: row.created_at,
            },
        }
    }
}

/// Inserts a discovery if its item has an accepted processed record and no
/// discovery yet.
///
/// # Errors
///
/// Returns [`DbError::PairingViolation`] when nothing was inserted, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_discovery<'e>(
    executor: impl PgExecutor<'e>,
    record: &DiscoveryRecord,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "INSERT INTO discoveries \
             (item_id, innovation_score, category, summary, verdict, created_at) \
         SELECT $1, $2, $3, $4, $5, $6 \
         WHERE EXISTS ( \
             SELECT 1 FROM processed_items \
             WHERE item_id = $1 AND is_startup <> is_innovation \
         ) \
         ON CONFLICT (item_id) DO NOTHING",
    )
    .bind(record.item_id)
    .bind(record.innovation_score)
    .bind(&record.category)
    .bind(&record.summary)
    .bind(Json(&record.verdict))
    .bind(record.created_at)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::PairingViolation {
            item_id: record.item_id,
        });
    }

    Ok(())
}

/// Best discoveries for items created after `created_after` (epoch seconds).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_top_discoveries(
    pool: &PgPool,
    limit: i64,
    created_after: i64,
) -> Result<Vec<StoredDiscovery>, DbError> {
    let rows = sqlx::query_as::<_, DiscoveryRow>(
        "SELECT p.item_id, p.title, p.url, p.author, p.score, p.comments, p.created_time, \
                p.is_startup, p.is_innovation, p.item_type, p.processed_at, \
                d.innovation_score, d.category, d.summary, d.verdict, d.created_at \
         FROM discoveries d \
         JOIN processed_items p ON p.item_id = d.item_id \
         WHERE p.created_time > $1 \
         ORDER BY d.innovation_score DESC, p.item_id ASC \
         LIMIT $2",
    )
    .bind(created_after)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StoredDiscovery::from).collect())
}
