//! Background job scheduler.
//!
//! Registers the recurring incremental run at server startup.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::runner::RunService;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    runner: Arc<RunService>,
    schedule: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_incremental_job(&scheduler, runner, schedule).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the incremental run on `schedule` (six-field cron, UTC).
///
/// A tick that lands while a manual run is in progress is skipped.
async fn register_incremental_job(
    scheduler: &JobScheduler,
    runner: Arc<RunService>,
    schedule: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let runner = Arc::clone(&runner);

        Box::pin(async move {
            tracing::info!("scheduler: starting incremental run");
            runner.run_if_idle("scheduler").await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(schedule, "scheduler: incremental run registered");
    Ok(())
}
