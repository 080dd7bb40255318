//! Persisted entity shapes owned by the state store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::items::Item;
use crate::verdict::{ItemKind, Verdict};

/// One row per item that has been through a classification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub item_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub author: Option<String>,
    pub score: i64,
    pub comments: i64,
    /// Item creation time, seconds since the Unix epoch.
    pub created_time: i64,
    pub is_startup: bool,
    pub is_innovation: bool,
    pub item_type: ItemKind,
    pub processed_at: DateTime<Utc>,
}

impl ProcessedRecord {
    /// Record for an item whose verdict passed the acceptance threshold.
    /// Flags follow the verdict kind.
    #[must_use]
    pub fn accepted(item: &Item, kind: ItemKind, processed_at: DateTime<Utc>) -> Self {
        Self::from_item(
            item,
            kind,
            kind == ItemKind::Startup,
            kind == ItemKind::Innovation,
            processed_at,
        )
    }

    /// Record for an item that was classified but not accepted. Both flags
    /// are cleared; `item_type` still reflects what the classifier said.
    #[must_use]
    pub fn rejected(item: &Item, kind: ItemKind, processed_at: DateTime<Utc>) -> Self {
        Self::from_item(item, kind, false, false, processed_at)
    }

    fn from_item(
        item: &Item,
        item_type: ItemKind,
        is_startup: bool,
        is_innovation: bool,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id: item.id,
            title: item.title.clone(),
            url: item.url.clone(),
            author: item.author.clone(),
            score: item.score,
            comments: item.comments,
            created_time: item.created_at,
            is_startup,
            is_innovation,
            item_type,
            processed_at,
        }
    }

    /// `true` when exactly one discovery flag is set.
    #[must_use]
    pub fn is_discovery(&self) -> bool {
        self.is_startup != self.is_innovation
    }
}

/// One row per accepted verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    pub item_id: i64,
    pub innovation_score: f64,
    pub category: String,
    pub summary: String,
    pub verdict: Verdict,
    pub created_at: DateTime<Utc>,
}

impl DiscoveryRecord {
    #[must_use]
    pub fn from_verdict(item_id: i64, verdict: &Verdict, created_at: DateTime<Utc>) -> Self {
        Self {
            item_id,
            innovation_score: verdict.innovation_score,
            category: verdict.category.clone(),
            summary: verdict.summary.clone(),
            verdict: verdict.clone(),
            created_at,
        }
    }
}

/// A discovery joined with the processed item it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDiscovery {
    pub item: ProcessedRecord,
    pub discovery: DiscoveryRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Historical,
    Incremental,
}

impl RunMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Historical => "historical",
            RunMode::Incremental => "incremental",
        }
    }

    /// Parse a stored mode label; unknown labels are treated as incremental.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == "historical" {
            RunMode::Historical
        } else {
            RunMode::Incremental
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// Finished the batch, but some items hit store write failures.
    CompletedWithErrors,
    /// Stopped between items on request.
    Cancelled,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::CompletedWithErrors => "completed_with_errors",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
        }
    }

    /// Parse a stored status label; unknown labels map to [`RunStatus::Failed`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "completed" => RunStatus::Completed,
            "completed_with_errors" => RunStatus::CompletedWithErrors,
            "cancelled" => RunStatus::Cancelled,
            _ => RunStatus::Failed,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit entry for one pipeline execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub items_fetched: i64,
    pub candidates: i64,
    /// Items that received a classification verdict (accepted + rejected).
    pub processed: i64,
    /// New discoveries created by this run.
    pub accepted: i64,
    pub status: RunStatus,
    pub error_message: Option<String>,
}

impl RunRecord {
    /// A failed run with no work recorded.
    #[must_use]
    pub fn failed(
        mode: RunMode,
        started_at: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            started_at,
            finished_at: Utc::now(),
            items_fetched: 0,
            candidates: 0,
            processed: 0,
            accepted: 0,
            status: RunStatus::Failed,
            error_message: Some(error.into()),
        }
    }
}

/// A run record with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRun {
    pub id: i64,
    #[serde(flatten)]
    pub run: RunRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Item {
        Item {
            id: 7,
            title: "Show HN: Widget".to_string(),
            url: Some("https://widget.io".to_string()),
            author: Some("dang".to_string()),
            score: 12,
            comments: 3,
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn accepted_startup_sets_only_startup_flag() {
        let record = ProcessedRecord::accepted(&item(), ItemKind::Startup, Utc::now());
        assert!(record.is_startup);
        assert!(!record.is_innovation);
        assert_eq!(record.item_type, ItemKind::Startup);
        assert!(record.is_discovery());
    }

    #[test]
    fn accepted_innovation_sets_only_innovation_flag() {
        let record = ProcessedRecord::accepted(&item(), ItemKind::Innovation, Utc::now());
        assert!(!record.is_startup);
        assert!(record.is_innovation);
    }

    #[test]
    fn rejected_clears_flags_but_keeps_kind() {
        let record = ProcessedRecord::rejected(&item(), ItemKind::Startup, Utc::now());
        assert!(!record.is_startup);
        assert!(!record.is_innovation);
        assert_eq!(record.item_type, ItemKind::Startup);
        assert!(!record.is_discovery());
    }

    #[test]
    fn record_copies_denormalized_item_fields() {
        let record = ProcessedRecord::rejected(&item(), ItemKind::Other, Utc::now());
        assert_eq!(record.item_id, 7);
        assert_eq!(record.url.as_deref(), Some("https://widget.io"));
        assert_eq!(record.created_time, 1_700_000_000);
        assert_eq!(record.comments, 3);
    }

    #[test]
    fn run_status_labels_round_trip() {
        for status in [
            RunStatus::Completed,
            RunStatus::CompletedWithErrors,
            RunStatus::Cancelled,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::from_label(status.as_str()), status);
        }
    }
}
