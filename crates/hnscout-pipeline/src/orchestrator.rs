//! Per-item state machine: candidate gate, idempotence check, classification,
//! and the accept/reject write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hnscout_core::{
    DetectionThresholds, DiscoveryRecord, Item, ProcessedRecord, RunMode, RunRecord, RunStatus,
    StoredDiscovery,
};
use hnscout_db::StateStore;
use hnscout_detect::{Candidate, CandidateFilter, Classifier};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Terminal state of one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    AlreadyProcessed,
    /// Not written; the item stays eligible for a later run.
    ClassificationFailed,
    Rejected,
    Accepted(Box<StoredDiscovery>),
    /// A store read or write failed for this item.
    PersistenceFailed(String),
}

/// Counts for one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub fetched: usize,
    pub candidates: usize,
    pub skipped: usize,
    pub already_processed: usize,
    pub classification_failed: usize,
    pub rejected: usize,
    pub accepted: usize,
    pub persistence_errors: usize,
    pub cancelled: bool,
    /// Messages for each persistence error, in order.
    pub errors: Vec<String>,
    #[serde(skip)]
    pub discoveries: Vec<StoredDiscovery>,
}

impl RunSummary {
    /// Items that cost a classification call and were recorded.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.accepted + self.rejected
    }

    #[must_use]
    pub fn status(&self) -> RunStatus {
        if self.cancelled {
            RunStatus::Cancelled
        } else if self.persistence_errors > 0 {
            RunStatus::CompletedWithErrors
        } else {
            RunStatus::Completed
        }
    }

    #[must_use]
    pub fn to_run_record(&self, mode: RunMode, started_at: DateTime<Utc>) -> RunRecord {
        let error_message = (!self.errors.is_empty()).then(|| self.errors.join("; "));
        RunRecord {
            mode,
            started_at,
            finished_at: Utc::now(),
            items_fetched: count(self.fetched),
            candidates: count(self.candidates),
            processed: count(self.processed()),
            accepted: count(self.accepted),
            status: self.status(),
            error_message,
        }
    }

    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::AlreadyProcessed => self.already_processed += 1,
            ItemOutcome::ClassificationFailed => self.classification_failed += 1,
            ItemOutcome::Rejected => self.rejected += 1,
            ItemOutcome::Accepted(discovery) => {
                self.accepted += 1;
                self.discoveries.push(*discovery);
            }
            ItemOutcome::PersistenceFailed(message) => {
                self.persistence_errors += 1;
                self.errors.push(message);
            }
        }
    }
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Drives items through filter, classifier, and store.
///
/// Candidates are handled one at a time in filter order. Each item's write
/// is independent, so a run can stop between items without leaving partial
/// state behind.
pub struct Pipeline {
    store: Arc<dyn StateStore>,
    classifier: Arc<dyn Classifier>,
    filter: CandidateFilter,
    thresholds: DetectionThresholds,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn StateStore>,
        classifier: Arc<dyn Classifier>,
        thresholds: DetectionThresholds,
    ) -> Self {
        Self {
            store,
            classifier,
            filter: CandidateFilter::new(),
            thresholds,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    #[must_use]
    pub fn thresholds(&self) -> &DetectionThresholds {
        &self.thresholds
    }

    /// Run a batch of fetched items through the state machine.
    ///
    /// `cancel` is checked before each candidate; once it fires, remaining
    /// candidates are left untouched and the summary is marked cancelled.
    pub async fn process(&self, items: &[Item], cancel: &CancellationToken) -> RunSummary {
        let candidates = self.filter.filter(items, &self.thresholds);
        let mut summary = RunSummary {
            fetched: items.len(),
            candidates: candidates.len(),
            skipped: items.len() - candidates.len(),
            ..RunSummary::default()
        };

        tracing::info!(
            fetched = summary.fetched,
            candidates = summary.candidates,
            skipped = summary.skipped,
            "candidate filter applied"
        );

        for (index, candidate) in candidates.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(
                    remaining = candidates.len() - index,
                    "run cancelled; stopping before next item"
                );
                summary.cancelled = true;
                break;
            }
            let outcome = self.process_candidate(candidate).await;
            summary.record(outcome);
        }

        summary
    }

    /// Take one candidate to a terminal state.
    pub async fn process_candidate(&self, candidate: &Candidate) -> ItemOutcome {
        let item = &candidate.item;

        match self.store.exists(item.id).await {
            Ok(true) => {
                tracing::debug!(item_id = item.id, "already processed");
                return ItemOutcome::AlreadyProcessed;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(item_id = item.id, error = %e, "idempotence check failed");
                return ItemOutcome::PersistenceFailed(format!("item {}: {e}", item.id));
            }
        }

        tracing::debug!(
            item_id = item.id,
            filter_score = candidate.signal.score,
            reasons = ?candidate.signal.reasons,
            "classifying candidate"
        );

        let verdict = match self.classifier.classify(item).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(item_id = item.id, error = %e, "classification failed; will retry next run");
                return ItemOutcome::ClassificationFailed;
            }
        };

        let now = Utc::now();
        if verdict.is_accepted(self.thresholds.accept_threshold) {
            let processed = ProcessedRecord::accepted(item, verdict.kind, now);
            let discovery = DiscoveryRecord::from_verdict(item.id, &verdict, now);
            match self.store.put_accepted(&processed, &discovery).await {
                Ok(true) => {
                    tracing::info!(
                        item_id = item.id,
                        kind = %verdict.kind,
                        name = %verdict.name,
                        innovation_score = verdict.innovation_score,
                        "discovery accepted"
                    );
                    ItemOutcome::Accepted(Box::new(StoredDiscovery {
                        item: processed,
                        discovery,
                    }))
                }
                Ok(false) => ItemOutcome::AlreadyProcessed,
                Err(e) => {
                    tracing::error!(item_id = item.id, error = %e, "failed to persist discovery");
                    ItemOutcome::PersistenceFailed(format!("item {}: {e}", item.id))
                }
            }
        } else {
            let processed = ProcessedRecord::rejected(item, verdict.kind, now);
            match self.store.put_processed(&processed).await {
                Ok(true) => {
                    tracing::debug!(
                        item_id = item.id,
                        kind = %verdict.kind,
                        innovation_score = verdict.innovation_score,
                        "candidate rejected"
                    );
                    ItemOutcome::Rejected
                }
                Ok(false) => ItemOutcome::AlreadyProcessed,
                Err(e) => {
                    tracing::error!(item_id = item.id, error = %e, "failed to record rejection");
                    ItemOutcome::PersistenceFailed(format!("item {}: {e}", item.id))
                }
            }
        }
    }
}
