//! Job detail loading.

use crate::error::{ListError, Result};
use jobdeck_api::JobsApi;
use jobdeck_core::{Job, JobId, JobStatus};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A job with its status history, newest entry first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetail {
    /// The job itself
    pub job: Job,
    /// Status changes, most recent first
    pub history: Vec<JobStatus>,
}

/// Fetch a job and its history concurrently.
///
/// Fails with [`ListError::Cancelled`] if `cancel` fires before both
/// requests finish, so a view that was closed never receives stale data.
pub async fn load_job_detail(
    api: &dyn JobsApi,
    id: JobId,
    cancel: &CancellationToken,
) -> Result<JobDetail> {
    let requests = async { tokio::try_join!(api.get_job(id), api.job_history(id)) };

    let (job, history) = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!(job_id = %id, "job detail load cancelled");
            return Err(ListError::Cancelled);
        }
        result = requests => result?,
    };

    let mut history = history.results;
    history.reverse();
    Ok(JobDetail { job, history })
}
