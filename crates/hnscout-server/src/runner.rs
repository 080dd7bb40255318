//! Incremental runs shared by the API and the scheduler.
//!
//! At most one run executes at a time. Manual triggers are refused while a
//! run holds the lock; scheduled ticks are skipped.

use std::sync::Arc;

use hnscout_pipeline::{ContentSource, Pipeline};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct RunService {
    pipeline: Pipeline,
    source: Arc<dyn ContentSource>,
    lookback_days: u32,
    lock: Arc<Mutex<()>>,
    cancel: CancellationToken,
}

impl RunService {
    #[must_use]
    pub fn new(
        pipeline: Pipeline,
        source: Arc<dyn ContentSource>,
        lookback_days: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pipeline,
            source,
            lookback_days,
            lock: Arc::new(Mutex::new(())),
            cancel,
        }
    }

    /// Take the run lock if nobody holds it.
    pub(crate) fn try_acquire(&self) -> Option<OwnedMutexGuard<()>> {
        Arc::clone(&self.lock).try_lock_owned().ok()
    }

    /// Start a run in the background. `None` if one is already running.
    pub fn try_start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let guard = self.try_acquire()?;
        let service = Arc::clone(self);
        Some(tokio::spawn(async move {
            let _guard = guard;
            service.run_locked("api").await;
        }))
    }

    /// Run in the foreground unless a run is already in progress.
    pub async fn run_if_idle(&self, trigger: &'static str) -> bool {
        let Some(_guard) = self.try_acquire() else {
            tracing::warn!(trigger, "previous run still in progress; skipping");
            return false;
        };
        self.run_locked(trigger).await;
        true
    }

    /// Wait until no run holds the lock.
    #[cfg(test)]
    pub(crate) async fn wait_idle(&self) {
        drop(Arc::clone(&self.lock).lock_owned().await);
    }

    async fn run_locked(&self, trigger: &'static str) {
        if self.cancel.is_cancelled() {
            tracing::info!(trigger, "shutdown in progress; not starting run");
            return;
        }

        match self
            .pipeline
            .run_incremental(self.source.as_ref(), self.lookback_days, &self.cancel)
            .await
        {
            Ok(report) => tracing::info!(
                trigger,
                run_id = ?report.run_id,
                status = %report.record.status,
                accepted = report.summary.accepted,
                "run complete"
            ),
            Err(e) => tracing::error!(trigger, error = %e, "run failed"),
        }
    }
}
