//! Historical and incremental runs over a [`ContentSource`].

use chrono::{DateTime, Utc};
use hnscout_core::{Item, RunMode, RunRecord};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;
use crate::orchestrator::{Pipeline, RunSummary};
use crate::source::ContentSource;

const SECS_PER_DAY: i64 = 86_400;

/// Result of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Id of the appended run record; `None` if appending it failed.
    pub run_id: Option<i64>,
    pub record: RunRecord,
    pub summary: RunSummary,
}

impl Pipeline {
    /// Scan the last `days` days of stories.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the store is unreachable or the content
    /// source fails as a whole. A failed run record is appended when the store
    /// allows it.
    pub async fn run_historical(
        &self,
        source: &dyn ContentSource,
        days: u32,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        tracing::info!(days, "starting historical run");

        if let Err(e) = self.store().health_check().await {
            return Err(self.fail(RunMode::Historical, started_at, e.into()).await);
        }

        let end = started_at.timestamp();
        let start = end - i64::from(days) * SECS_PER_DAY;
        self.execute(RunMode::Historical, started_at, source, start, end, cancel)
            .await
    }

    /// Fetch stories created since the newest processed item.
    ///
    /// An empty store has no such item; the run then becomes a historical run
    /// over `default_lookback_days`.
    ///
    /// # Errors
    ///
    /// Same as [`Pipeline::run_historical`].
    pub async fn run_incremental(
        &self,
        source: &dyn ContentSource,
        default_lookback_days: u32,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();

        let latest = match self.store().latest_processed_timestamp().await {
            Ok(latest) => latest,
            Err(e) => return Err(self.fail(RunMode::Incremental, started_at, e.into()).await),
        };

        let Some(since) = latest else {
            tracing::info!(
                days = default_lookback_days,
                "no processed items yet; falling back to historical run"
            );
            return self
                .run_historical(source, default_lookback_days, cancel)
                .await;
        };

        tracing::info!(since, "starting incremental run");
        self.execute(
            RunMode::Incremental,
            started_at,
            source,
            since,
            started_at.timestamp(),
            cancel,
        )
        .await
    }

    async fn execute(
        &self,
        mode: RunMode,
        started_at: DateTime<Utc>,
        source: &dyn ContentSource,
        start: i64,
        end: i64,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let items = match source.fetch_between(start, end).await {
            Ok(items) => items,
            Err(e) => return Err(self.fail(mode, started_at, e.into()).await),
        };

        let fetched = items.len();
        let eligible = self.apply_engagement_floor(items);
        let below_floor = fetched - eligible.len();

        let mut summary = self.process(&eligible, cancel).await;
        summary.fetched = fetched;
        summary.skipped += below_floor;

        let record = summary.to_run_record(mode, started_at);
        let run_id = match self.store().append_run(&record).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(error = %e, "failed to append run record");
                None
            }
        };

        tracing::info!(
            mode = %mode,
            status = %record.status,
            fetched = summary.fetched,
            candidates = summary.candidates,
            processed = summary.processed(),
            accepted = summary.accepted,
            classification_failed = summary.classification_failed,
            persistence_errors = summary.persistence_errors,
            "run finished"
        );

        Ok(RunReport {
            run_id,
            record,
            summary,
        })
    }

    fn apply_engagement_floor(&self, items: Vec<Item>) -> Vec<Item> {
        let floor = self.thresholds().min_engagement;
        items.into_iter().filter(|item| item.score >= floor).collect()
    }

    /// Record a failed run (best effort) and hand the error back.
    async fn fail(
        &self,
        mode: RunMode,
        started_at: DateTime<Utc>,
        error: PipelineError,
    ) -> PipelineError {
        tracing::error!(mode = %mode, error = %error, "run failed");
        let record = RunRecord::failed(mode, started_at, error.to_string());
        if let Err(e) = self.store().append_run(&record).await {
            tracing::error!(error = %e, "could not record failed run");
        }
        error
    }
}
