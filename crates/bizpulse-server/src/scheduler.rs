//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! session maintenance job.

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(pool: PgPool) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_session_prune_job(&scheduler, pool).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Registers the daily session-prune job.
///
/// Runs at 03:00 UTC (`0 0 3 * * *`) and deletes `active_sessions` rows
/// belonging to deactivated users. Logins already overwrite sessions in
/// place, so this only has to clean up after account deactivation.
async fn register_session_prune_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 0 3 * * *", move |_uuid, _lock| {
        let pool = pool.clone();

        Box::pin(async move {
            match bizpulse_db::prune_inactive_user_sessions(&pool).await {
                Ok(0) => tracing::debug!("scheduler: no stale sessions to prune"),
                Ok(n) => tracing::info!(pruned = n, "scheduler: pruned stale sessions"),
                Err(e) => tracing::error!(error = %e, "scheduler: session prune failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
