//! Read-only snapshot consumed by the report renderers and the API.

use chrono::{DateTime, Utc};
use hnscout_core::{ItemKind, StoredDiscovery, HN_WEB_BASE};
use hnscout_db::{DbError, StateStore};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub since_days: u32,
    pub total_discoveries: usize,
    pub total_startups: usize,
    pub total_innovations: usize,
}

/// One discovery flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoverySummary {
    pub id: i64,
    pub kind: ItemKind,
    pub name: String,
    pub title: String,
    pub url: Option<String>,
    pub hn_url: String,
    pub innovation_score: f64,
    pub summary: String,
    pub category: String,
    pub stage: String,
    pub key_features: Vec<String>,
    pub why_interesting: String,
    /// Item creation time, epoch seconds.
    pub timestamp: i64,
    pub score: i64,
    pub comments: i64,
}

impl DiscoverySummary {
    /// The verdict's name, or the item title when the model gave none.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.title
        } else {
            &self.name
        }
    }
}

impl From<StoredDiscovery> for DiscoverySummary {
    fn from(row: StoredDiscovery) -> Self {
        let StoredDiscovery { item, discovery } = row;
        let verdict = discovery.verdict;
        Self {
            id: item.item_id,
            kind: verdict.kind,
            name: verdict.name,
            title: item.title,
            url: item.url,
            hn_url: format!("{HN_WEB_BASE}/item?id={}", item.item_id),
            innovation_score: discovery.innovation_score,
            summary: discovery.summary,
            category: discovery.category,
            stage: verdict.stage,
            key_features: verdict.key_features,
            why_interesting: verdict.why_interesting,
            timestamp: item.created_time,
            score: item.score,
            comments: item.comments,
        }
    }
}

/// Metadata plus discoveries ordered by `innovation_score`, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSnapshot {
    pub metadata: ReportMetadata,
    pub discoveries: Vec<DiscoverySummary>,
}

impl ReportSnapshot {
    /// Assemble a snapshot from store rows. Rows are re-sorted so the
    /// ordering holds regardless of the source.
    #[must_use]
    pub fn from_rows(
        rows: Vec<StoredDiscovery>,
        since_days: u32,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut discoveries: Vec<DiscoverySummary> =
            rows.into_iter().map(DiscoverySummary::from).collect();
        discoveries.sort_by(|a, b| {
            b.innovation_score
                .total_cmp(&a.innovation_score)
                .then(a.id.cmp(&b.id))
        });

        let count_kind = |kind: ItemKind| discoveries.iter().filter(|d| d.kind == kind).count();
        let metadata = ReportMetadata {
            generated_at,
            since_days,
            total_discoveries: discoveries.len(),
            total_startups: count_kind(ItemKind::Startup),
            total_innovations: count_kind(ItemKind::Innovation),
        };

        Self {
            metadata,
            discoveries,
        }
    }
}

/// Read the top discoveries from `store` into a snapshot.
///
/// # Errors
///
/// Returns [`DbError`] if the store query fails.
pub async fn build_snapshot(
    store: &dyn StateStore,
    limit: u32,
    since_days: u32,
) -> Result<ReportSnapshot, DbError> {
    let rows = store.top_discoveries(limit, since_days).await?;
    Ok(ReportSnapshot::from_rows(rows, since_days, Utc::now()))
}
