//! Background scan scheduler.
//!
//! Registers a recurring job that re-runs the scrape cycle for the default
//! country and feeds the results to the change detector, so sale-start
//! notifications fire even when no client is polling.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use salewatch_scraper::{ChangeDetector, CycleRunner};

use crate::directory::DirectoryClient;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    runner: Arc<CycleRunner>,
    detector: Arc<ChangeDetector<DirectoryClient>>,
    default_country: String,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let runner = Arc::clone(&runner);
        let detector = Arc::clone(&detector);
        let country = default_country.clone();

        Box::pin(async move {
            tracing::info!(country = %country, "scheduler: starting scan cycle");
            let outcome = runner.run_cycle(Some(&country), None).await;
            let written = detector.process_cycle(&outcome.results).await;
            tracing::info!(
                results = outcome.results.len(),
                sales = outcome.categorized.total(),
                notifications = written,
                "scheduler: scan cycle complete"
            );
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}
