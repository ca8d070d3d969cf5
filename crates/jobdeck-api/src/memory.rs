//! In-memory jobs backend with cursor pagination.
//!
//! Behaves like the real server for the purposes of list reconciliation:
//! jobs are ordered by id, pages are addressed by exclusive `after`/`before`
//! id cursors, `q` is a case-insensitive name prefix, and links come back as
//! absolute URLs. Every list request is recorded so callers can check which
//! pages were actually fetched.

use crate::client::JobsApi;
use crate::error::{ApiError, Result};
use crate::query::{path_and_query, set_query_param};
use async_trait::async_trait;
use chrono::Utc;
use jobdeck_core::config::MAX_PAGE_SIZE;
use jobdeck_core::{
    CurrentStatus, Job, JobHistory, JobId, JobName, JobStatus, Paginated, StatusKind,
};
use std::collections::BTreeMap;
use std::sync::Mutex;
use url::Url;

const DEFAULT_PAGE_SIZE: usize = 15;

#[derive(Debug, Default)]
struct Store {
    jobs: BTreeMap<JobId, Job>,
    history: Vec<JobStatus>,
    next_job_id: i64,
    next_status_id: i64,
}

/// Cursor-paginated jobs backend held entirely in memory.
#[derive(Debug)]
pub struct InMemoryJobsApi {
    base_url: String,
    store: Mutex<Store>,
    requests: Mutex<Vec<String>>,
    failures: Mutex<Vec<ArmedFailure>>,
}

/// A list failure waiting for a request containing `fragment`.
#[derive(Debug)]
struct ArmedFailure {
    fragment: String,
    skip: usize,
}

impl InMemoryJobsApi {
    /// Create an empty backend that pretends to live at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store: Mutex::new(Store {
                next_job_id: 1,
                next_status_id: 1,
                ..Store::default()
            }),
            requests: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Insert one job per name, each starting as `PENDING`.
    pub fn seed<I, S>(&self, names: I) -> Vec<JobId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = self.store.lock().expect("store lock poisoned");
        names
            .into_iter()
            .map(|name| insert_job(&mut store, name.into()))
            .collect()
    }

    /// Number of jobs currently stored.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.store.lock().expect("store lock poisoned").jobs.len()
    }

    /// List requests received so far, as `path?query` strings.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }

    /// Forget recorded list requests.
    pub fn clear_requests(&self) {
        self.requests.lock().expect("requests lock poisoned").clear();
    }

    /// Fail the next list request whose path contains `fragment`.
    ///
    /// Each call arms exactly one failure.
    pub fn fail_next_list_matching(&self, fragment: impl Into<String>) {
        self.fail_list_matching_after(fragment, 0);
    }

    /// Let `skip` list requests containing `fragment` through, then fail the
    /// one after.
    pub fn fail_list_matching_after(&self, fragment: impl Into<String>, skip: usize) {
        self.failures
            .lock()
            .expect("failures lock poisoned")
            .push(ArmedFailure {
                fragment: fragment.into(),
                skip,
            });
    }

    fn take_failure(&self, request: &str) -> bool {
        let mut failures = self.failures.lock().expect("failures lock poisoned");
        let Some(pos) = failures
            .iter()
            .position(|f| request.contains(f.fragment.as_str()))
        else {
            return false;
        };
        if failures[pos].skip > 0 {
            failures[pos].skip -= 1;
            return false;
        }
        failures.remove(pos);
        true
    }

    fn link(&self, cursor: (&str, JobId), page_size: usize, query: Option<&str>) -> String {
        let mut link = format!(
            "{}/jobs/?{}={}&page_size={page_size}",
            self.base_url, cursor.0, cursor.1
        );
        if let Some(q) = query {
            if let Ok(mut url) = Url::parse(&link) {
                set_query_param(&mut url, "q", q);
                link = url.to_string();
            }
        }
        link
    }

    fn not_found() -> ApiError {
        ApiError::Status {
            status: 404,
            message: "Not found.".to_string(),
        }
    }
}

fn insert_job(store: &mut Store, name: String) -> JobId {
    let now = Utc::now();
    let id = JobId(store.next_job_id);
    store.next_job_id += 1;

    store.jobs.insert(
        id,
        Job {
            id,
            name,
            created_at: now,
            updated_at: now,
            current_status: Some(CurrentStatus {
                status_type: Some(StatusKind::Pending),
                timestamp: Some(now),
            }),
        },
    );
    store.history.push(JobStatus {
        id: store.next_status_id,
        job: id,
        status_type: StatusKind::Pending,
        timestamp: now,
    });
    store.next_status_id += 1;
    id
}

struct ListParams {
    page_size: usize,
    after: Option<i64>,
    before: Option<i64>,
    query: Option<String>,
}

fn parse_params(url: &Url) -> ListParams {
    let mut params = ListParams {
        page_size: DEFAULT_PAGE_SIZE,
        after: None,
        before: None,
        query: None,
    };
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "page_size" => {
                if let Ok(size) = value.parse::<usize>() {
                    params.page_size = size.clamp(1, MAX_PAGE_SIZE);
                }
            }
            "after" => params.after = value.parse().ok(),
            "before" => params.before = value.parse().ok(),
            "q" if !value.is_empty() => params.query = Some(value.into_owned()),
            _ => {}
        }
    }
    params
}

#[async_trait]
impl JobsApi for InMemoryJobsApi {
    async fn list_jobs(&self, path: &str, query: Option<&str>) -> Result<Paginated<Job>> {
        let mut url = Url::parse("http://memory")
            .and_then(|base| base.join(path))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))?;
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            set_query_param(&mut url, "q", q);
        }

        let request = path_and_query(&url);
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(request.clone());

        if self.take_failure(&request) {
            return Err(ApiError::Status {
                status: 500,
                message: "Failed to list jobs".to_string(),
            });
        }

        let params = parse_params(&url);
        let prefix = params.query.as_deref().map(str::to_lowercase);
        let store = self.store.lock().expect("store lock poisoned");
        let matching = store.jobs.values().filter(|job| {
            prefix
                .as_deref()
                .map_or(true, |p| job.name.to_lowercase().starts_with(p))
        });

        let size = params.page_size;
        let q = params.query.as_deref();

        let page = if let Some(before) = params.before {
            let mut window: Vec<Job> = matching
                .filter(|job| job.id.get() < before)
                .rev()
                .take(size + 1)
                .cloned()
                .collect();
            let has_more = window.len() > size;
            window.truncate(size);
            window.reverse();

            let previous = has_more
                .then(|| window.first().map(|j| self.link(("before", j.id), size, q)))
                .flatten();
            let next = match window.last() {
                Some(last) => self.link(("after", last.id), size, q),
                None => self.link(("after", JobId(before - 1)), size, q),
            };
            Paginated {
                results: window,
                next: Some(next),
                previous,
            }
        } else {
            let after = params.after;
            let mut window: Vec<Job> = matching
                .filter(|job| after.map_or(true, |a| job.id.get() > a))
                .take(size + 1)
                .cloned()
                .collect();
            let has_more = window.len() > size;
            window.truncate(size);

            let next = has_more
                .then(|| window.last().map(|j| self.link(("after", j.id), size, q)))
                .flatten();
            let previous = after.map(|a| match window.first() {
                Some(first) => self.link(("before", first.id), size, q),
                None => self.link(("before", JobId(a + 1)), size, q),
            });
            Paginated {
                results: window,
                next,
                previous,
            }
        };

        Ok(page)
    }

    async fn create_job(&self, name: &JobName) -> Result<Job> {
        let mut store = self.store.lock().expect("store lock poisoned");
        let id = insert_job(&mut store, name.as_str().to_string());
        store
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::Internal("created job vanished".to_string()))
    }

    async fn update_status(&self, id: JobId, status: StatusKind) -> Result<Job> {
        let mut store = self.store.lock().expect("store lock poisoned");
        let status_id = store.next_status_id;
        let job = store.jobs.get_mut(&id).ok_or_else(Self::not_found)?;

        if job.status() == Some(status) {
            return Ok(job.clone());
        }

        let now = Utc::now();
        job.current_status = Some(CurrentStatus {
            status_type: Some(status),
            timestamp: Some(now),
        });
        job.updated_at = now;
        let updated = job.clone();

        store.history.push(JobStatus {
            id: status_id,
            job: id,
            status_type: status,
            timestamp: now,
        });
        store.next_status_id += 1;
        Ok(updated)
    }

    async fn delete_job(&self, id: JobId) -> Result<()> {
        let mut store = self.store.lock().expect("store lock poisoned");
        store.jobs.remove(&id).ok_or_else(Self::not_found)?;
        store.history.retain(|s| s.job != id);
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<Job> {
        let store = self.store.lock().expect("store lock poisoned");
        store.jobs.get(&id).cloned().ok_or_else(Self::not_found)
    }

    async fn job_history(&self, id: JobId) -> Result<JobHistory> {
        let store = self.store.lock().expect("store lock poisoned");
        let job = store.jobs.get(&id).cloned().ok_or_else(Self::not_found)?;
        let results = store
            .history
            .iter()
            .filter(|s| s.job == id)
            .cloned()
            .collect();
        Ok(JobHistory { job, results })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_with(count: usize) -> InMemoryJobsApi {
        let api = InMemoryJobsApi::new("http://testserver/api");
        api.seed((1..=count).map(|i| format!("Job {i}")));
        api
    }

    fn ids(page: &Paginated<Job>) -> Vec<i64> {
        page.results.iter().map(|j| j.id.get()).collect()
    }

    #[tokio::test]
    async fn test_first_page_links() {
        let api = backend_with(31);
        let page = api
            .list_jobs("/jobs/?page_size=15", None)
            .await
            .expect("list");

        assert_eq!(ids(&page), (1..=15).collect::<Vec<_>>());
        assert_eq!(
            page.next.as_deref(),
            Some("http://testserver/api/jobs/?after=15&page_size=15")
        );
        assert!(page.previous.is_none());
    }

    #[tokio::test]
    async fn test_forward_then_backward() {
        let api = backend_with(30);
        let second = api
            .list_jobs("/jobs/?after=15&page_size=15", None)
            .await
            .expect("list");
        assert_eq!(ids(&second), (16..=30).collect::<Vec<_>>());
        assert!(second.next.is_none());
        assert_eq!(
            second.previous.as_deref(),
            Some("http://testserver/api/jobs/?before=16&page_size=15")
        );

        let first = api
            .list_jobs("/jobs/?before=16&page_size=15", None)
            .await
            .expect("list");
        assert_eq!(ids(&first), (1..=15).collect::<Vec<_>>());
        assert!(first.previous.is_none());
        assert!(first.next.is_some());
    }

    #[tokio::test]
    async fn test_prefix_filter_is_case_insensitive() {
        let api = InMemoryJobsApi::new("http://testserver/api");
        api.seed(["hello", "Helium", "shell", "helsinki", "world"]);

        let page = api.list_jobs("/jobs/", Some("he")).await.expect("list");
        let names: Vec<&str> = page.results.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["hello", "Helium", "helsinki"]);
    }

    #[tokio::test]
    async fn test_links_carry_query() {
        let api = InMemoryJobsApi::new("http://testserver/api");
        api.seed((0..20).map(|i| format!("he-{i}")));

        let page = api
            .list_jobs("/jobs/?page_size=15", Some("he"))
            .await
            .expect("list");
        let next = page.next.expect("next link");
        assert!(next.contains("q=he"));
        assert!(api.requests()[0].contains("q=he"));
    }

    #[tokio::test]
    async fn test_status_update_and_history() {
        let api = backend_with(1);
        let id = JobId(1);

        let job = api
            .update_status(id, StatusKind::Completed)
            .await
            .expect("update");
        assert_eq!(job.status(), Some(StatusKind::Completed));

        // Same status again is a no-op
        api.update_status(id, StatusKind::Completed)
            .await
            .expect("update");

        let history = api.job_history(id).await.expect("history");
        let kinds: Vec<StatusKind> = history.results.iter().map(|s| s.status_type).collect();
        assert_eq!(kinds, vec![StatusKind::Pending, StatusKind::Completed]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let api = backend_with(1);
        api.delete_job(JobId(1)).await.expect("delete");
        let err = api.delete_job(JobId(1)).await.expect_err("already gone");
        assert!(err.is_not_found());
        assert_eq!(api.job_count(), 0);
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let api = backend_with(3);
        api.fail_next_list_matching("after=");

        assert!(api.list_jobs("/jobs/", None).await.is_ok());
        assert!(api.list_jobs("/jobs/?after=1", None).await.is_err());
        assert!(api.list_jobs("/jobs/?after=1", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_failure_after_skips() {
        let api = backend_with(20);
        api.fail_list_matching_after("after=15", 1);

        assert!(api.list_jobs("/jobs/?after=15", None).await.is_ok());
        assert!(api.list_jobs("/jobs/?before=16", None).await.is_ok());
        assert!(api.list_jobs("/jobs/?after=15", None).await.is_err());
        assert!(api.list_jobs("/jobs/?after=15", None).await.is_ok());
    }
}
