//! The jobs API contract.

use crate::error::Result;
use async_trait::async_trait;
use jobdeck_core::{Job, JobHistory, JobId, JobName, Paginated, StatusKind};

/// Trait for backends serving the jobs endpoints.
///
/// Implementations should be thread-safe (Send + Sync) so a controller can
/// share one instance across tasks.
#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Fetch one list page.
    ///
    /// `path` is relative to [`JobsApi::base_url`] and may carry cursor and
    /// page-size parameters. A non-empty `query` is set as the `q` prefix
    /// filter, replacing any `q` already in the path.
    async fn list_jobs(&self, path: &str, query: Option<&str>) -> Result<Paginated<Job>>;

    /// Create a job.
    async fn create_job(&self, name: &JobName) -> Result<Job>;

    /// Set a job's status, returning the updated job.
    async fn update_status(&self, id: JobId, status: StatusKind) -> Result<Job>;

    /// Delete a job.
    async fn delete_job(&self, id: JobId) -> Result<()>;

    /// Fetch a single job.
    async fn get_job(&self, id: JobId) -> Result<Job>;

    /// Fetch a job and its status history (ascending by time).
    async fn job_history(&self, id: JobId) -> Result<JobHistory>;

    /// Base URL the backend is mounted at, including its path prefix.
    fn base_url(&self) -> &str;
}
