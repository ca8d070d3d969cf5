//! The jobs list controller.
//!
//! [`ListController`] owns the displayed jobs, the pagination state and the
//! transient UI flags, and exposes every entry point a front end needs:
//! initial load, search, next/previous navigation, status changes, creation
//! and deletion. Jobs and cursor links are always replaced together under
//! one lock so the two never disagree.
//!
//! Concurrency rules:
//! - next and previous navigation each allow one request in flight; a
//!   second call in the same direction fails fast with [`ListError::Busy`]
//! - reconciliations are queued and run one at a time
//! - a first-page load supersedes any older load, navigation or
//!   reconciliation still outstanding
//! - results fetched for a search query that has since changed are dropped

use crate::cache::PageCache;
use crate::cursor::CursorCodec;
use crate::error::{ListError, NavLane, Result};
use crate::fetch::PageFetcher;
use crate::reconcile::{Outcome, ReconcileInput, Reconciler};
use crate::session::NavigationSnapshot;
use crate::state::{Direction, PaginationState};
use jobdeck_api::JobsApi;
use jobdeck_core::{Job, JobId, JobName, Paginated, PaginationConfig, StatusKind};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const JOBS_PATH: &str = "/jobs/";

/// Everything the list displays, plus in-flight counters.
#[derive(Debug)]
struct ViewState {
    jobs: Vec<Job>,
    pagination: PaginationState,
    current_path: String,
    query: String,
    loading: u32,
    loading_more: u32,
    creating: u32,
    updating: BTreeSet<JobId>,
    deleting: BTreeSet<JobId>,
    error: Option<String>,
    name_error: Option<String>,
    notice: Option<String>,
}

impl ViewState {
    fn new(current_path: String) -> Self {
        Self {
            jobs: Vec::new(),
            pagination: PaginationState::new(),
            current_path,
            query: String::new(),
            loading: 0,
            loading_more: 0,
            creating: 0,
            updating: BTreeSet::new(),
            deleting: BTreeSet::new(),
            error: None,
            name_error: None,
            notice: None,
        }
    }

    /// Replace the displayed page and its links in one step.
    fn show(&mut self, page: &Paginated<Job>, path: String, direction: Option<Direction>) {
        self.jobs.clone_from(&page.results);
        self.pagination.update_from(page, direction);
        self.current_path = path;
    }

    fn mark(&mut self, activity: Activity, active: bool) {
        fn bump(counter: &mut u32, active: bool) {
            *counter = if active {
                counter.saturating_add(1)
            } else {
                counter.saturating_sub(1)
            };
        }
        fn toggle(set: &mut BTreeSet<JobId>, id: JobId, active: bool) {
            if active {
                set.insert(id);
            } else {
                set.remove(&id);
            }
        }

        match activity {
            Activity::Loading => bump(&mut self.loading, active),
            Activity::LoadingMore => bump(&mut self.loading_more, active),
            Activity::Creating => bump(&mut self.creating, active),
            Activity::Updating(id) => toggle(&mut self.updating, id, active),
            Activity::Deleting(id) => toggle(&mut self.deleting, id, active),
        }
    }
}

/// What a fetch was started against. Its result only applies while both
/// still hold.
#[derive(Debug, Clone)]
struct LoadStamp {
    generation: u64,
    query: String,
}

/// Read-only snapshot of the list for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    /// Displayed jobs, ascending by id
    pub jobs: Vec<Job>,
    /// 1-based page counter
    pub page: u32,
    /// Whether a following page is known
    pub has_next: bool,
    /// Whether a preceding page is known
    pub has_previous: bool,
    /// Whether pagination controls should be shown
    pub has_multi_page: bool,
    /// A first-page load is running
    pub loading: bool,
    /// A navigation or reconciliation is running
    pub loading_more: bool,
    /// A create is running
    pub creating: bool,
    /// Jobs with a status change in flight
    pub updating: BTreeSet<JobId>,
    /// Jobs with a delete in flight
    pub deleting: BTreeSet<JobId>,
    /// Last failure, until dismissed or the next operation starts
    pub error: Option<String>,
    /// Validation message for the new-job name field
    pub name_error: Option<String>,
    /// Last success message
    pub notice: Option<String>,
    /// Active search query
    pub query: String,
    /// Normalized path of the displayed page
    pub current_path: String,
}

#[derive(Debug, Clone, Copy)]
enum Activity {
    Loading,
    LoadingMore,
    Creating,
    Updating(JobId),
    Deleting(JobId),
}

/// Marks an activity as running until dropped.
struct ActivityGuard {
    view: Arc<RwLock<ViewState>>,
    activity: Activity,
}

impl ActivityGuard {
    fn start(view: &Arc<RwLock<ViewState>>, activity: Activity) -> Self {
        view.write()
            .expect("list view lock poisoned")
            .mark(activity, true);
        Self {
            view: Arc::clone(view),
            activity,
        }
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.view
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .mark(self.activity, false);
    }
}

/// Holds a navigation lane until dropped.
struct LaneGuard<'a>(&'a AtomicBool);

impl<'a> LaneGuard<'a> {
    fn acquire(flag: &'a AtomicBool, lane: NavLane) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ListError::Busy(lane))?;
        Ok(Self(flag))
    }
}

impl Drop for LaneGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Inner {
    fetcher: PageFetcher,
    max_backfill_rounds: u32,
    view: Arc<RwLock<ViewState>>,
    next_lane: AtomicBool,
    prev_lane: AtomicBool,
    reconcile_queue: Mutex<()>,
    load_generation: AtomicU64,
}

/// Paginated jobs list with post-mutation reconciliation.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct ListController {
    inner: Arc<Inner>,
}

impl ListController {
    /// Create a controller over `api`. Nothing is fetched until
    /// [`Self::fetch_jobs`] is called.
    #[must_use]
    pub fn new(api: Arc<dyn JobsApi>, config: &PaginationConfig) -> Self {
        let codec = CursorCodec::new(api.base_url(), config.page_size);
        let cache = PageCache::new(config.cache_ttl());
        let first_page = codec.ensure_page_size(JOBS_PATH);
        let fetcher = PageFetcher::new(api, codec, cache);

        Self {
            inner: Arc::new(Inner {
                fetcher,
                max_backfill_rounds: config.max_backfill_rounds,
                view: Arc::new(RwLock::new(ViewState::new(first_page))),
                next_lane: AtomicBool::new(false),
                prev_lane: AtomicBool::new(false),
                reconcile_queue: Mutex::new(()),
                load_generation: AtomicU64::new(0),
            }),
        }
    }

    fn api(&self) -> &dyn JobsApi {
        self.inner.fetcher.api()
    }

    fn codec(&self) -> &CursorCodec {
        self.inner.fetcher.codec()
    }

    /// Page cache shared by navigation and prefetching.
    #[must_use]
    pub fn cache(&self) -> &PageCache {
        self.inner.fetcher.cache()
    }

    fn read(&self) -> RwLockReadGuard<'_, ViewState> {
        self.inner.view.read().expect("list view lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, ViewState> {
        self.inner.view.write().expect("list view lock poisoned")
    }

    fn start(&self, activity: Activity) -> ActivityGuard {
        ActivityGuard::start(&self.inner.view, activity)
    }

    /// Stamp a fetch about to start from `state`.
    fn stamp(&self, state: &ViewState) -> LoadStamp {
        LoadStamp {
            generation: self.inner.load_generation.load(Ordering::Acquire),
            query: state.query.clone(),
        }
    }

    /// Apply `update` unless a first-page load started or the search query
    /// changed since `stamp` was taken.
    fn commit(&self, stamp: &LoadStamp, update: impl FnOnce(&mut ViewState)) -> bool {
        let mut state = self.write();
        let generation = self.inner.load_generation.load(Ordering::Acquire);
        if generation != stamp.generation {
            debug!(
                fetched_at = stamp.generation,
                current = generation,
                "dropping result superseded by a first-page load"
            );
            return false;
        }
        if state.query != stamp.query {
            debug!(fetched_for = %stamp.query, current = %state.query, "dropping result for stale query");
            return false;
        }
        update(&mut state);
        true
    }

    /// Record a reportable failure in the error slot and pass it on.
    fn settle<T>(&self, result: Result<T>, fallback: &str) -> Result<T> {
        if let Err(e) = &result {
            if e.is_reportable() {
                let message = e.user_message();
                warn!(error = %e, "{fallback}");
                self.write().error = Some(if message.trim().is_empty() {
                    fallback.to_string()
                } else {
                    message
                });
            }
        }
        result
    }

    fn clear_error(&self) {
        self.write().error = None;
    }

    /// Current view of the list.
    #[must_use]
    pub fn snapshot(&self) -> ListView {
        let page_size = self.codec().page_size();
        let state = self.read();
        ListView {
            jobs: state.jobs.clone(),
            page: state.pagination.page(),
            has_next: state.pagination.next().is_some(),
            has_previous: state.pagination.previous().is_some(),
            has_multi_page: state.pagination.has_multi_page(state.jobs.len(), page_size),
            loading: state.loading > 0,
            loading_more: state.loading_more > 0,
            creating: state.creating > 0,
            updating: state.updating.clone(),
            deleting: state.deleting.clone(),
            error: state.error.clone(),
            name_error: state.name_error.clone(),
            notice: state.notice.clone(),
            query: state.query.clone(),
            current_path: state.current_path.clone(),
        }
    }

    /// Active search query.
    #[must_use]
    pub fn query(&self) -> String {
        self.read().query.clone()
    }

    /// Clear the error message.
    pub fn dismiss_error(&self) {
        self.clear_error();
    }

    /// Clear the success message.
    pub fn dismiss_notice(&self) {
        self.write().notice = None;
    }

    /// Load the first page for the current query and reset the counter.
    pub async fn fetch_jobs(&self) -> Result<()> {
        let _activity = self.start(Activity::Loading);
        self.clear_error();
        let result = self.reload().await;
        self.settle(result, "Failed to load jobs")
    }

    /// Reload from the first page.
    pub async fn refresh(&self) -> Result<()> {
        self.fetch_jobs().await
    }

    /// Change the search query and reload from the first page.
    ///
    /// Setting the query it already has is a no-op.
    pub async fn set_query(&self, query: impl Into<String>) -> Result<()> {
        let query = query.into();
        {
            let mut state = self.write();
            if state.query == query {
                return Ok(());
            }
            state.query.clone_from(&query);
        }
        debug!(%query, "search query changed");
        self.fetch_jobs().await
    }

    async fn reload(&self) -> Result<()> {
        let stamp = LoadStamp {
            generation: self.inner.load_generation.fetch_add(1, Ordering::AcqRel) + 1,
            query: self.query(),
        };
        let path = self.codec().ensure_page_size(JOBS_PATH);
        let page = self.inner.fetcher.fetch(&path, &stamp.query).await?;

        if self.commit(&stamp, |state| state.show(&page, path, Some(Direction::Reset))) {
            self.inner.fetcher.prefetch_neighbors(&page, &stamp.query).await;
        }
        Ok(())
    }

    /// Move to the following page. No-op when there is none.
    ///
    /// An empty following page clears `next` without changing what is
    /// displayed.
    pub async fn go_next(&self) -> Result<()> {
        let _lane = LaneGuard::acquire(&self.inner.next_lane, NavLane::Next)?;
        let (link, stamp) = {
            let state = self.read();
            (state.pagination.next().map(str::to_string), self.stamp(&state))
        };
        let Some(link) = link else {
            debug!("no next page");
            return Ok(());
        };

        let _activity = self.start(Activity::LoadingMore);
        self.clear_error();
        let result = self.advance(&link, &stamp).await;
        self.settle(result, "Failed to load page")
    }

    async fn advance(&self, link: &str, stamp: &LoadStamp) -> Result<()> {
        let path = self.codec().to_relative(link);
        let page = self.inner.fetcher.fetch_cached(&path, &stamp.query).await?;

        if page.results.is_empty() {
            debug!(%path, "next page is empty; clearing link");
            self.commit(stamp, |state| state.pagination.clear_next());
            return Ok(());
        }

        if self.commit(stamp, |state| state.show(&page, path, Some(Direction::Next))) {
            self.inner.fetcher.prefetch_neighbors(&page, &stamp.query).await;
        }
        Ok(())
    }

    /// Move to the preceding page. No-op when there is none.
    pub async fn go_prev(&self) -> Result<()> {
        let _lane = LaneGuard::acquire(&self.inner.prev_lane, NavLane::Prev)?;
        let _activity = self.start(Activity::LoadingMore);
        self.clear_error();
        let result = self.step_back(false).await;
        self.settle(result, "Failed to load page")
    }

    /// Navigate to the stored previous page. With `validate_next`, the new
    /// page's `next` link is checked and dropped if it leads nowhere.
    async fn step_back(&self, validate_next: bool) -> Result<()> {
        let (link, stamp) = {
            let state = self.read();
            (state.pagination.previous().map(str::to_string), self.stamp(&state))
        };
        let Some(link) = link else {
            debug!("no previous page");
            return Ok(());
        };

        let path = self.codec().to_relative(&link);
        let mut page = self.inner.fetcher.fetch_cached(&path, &stamp.query).await?;

        if validate_next {
            if let Some(next) = page.next.clone() {
                if self.inner.fetcher.is_exhausted(&next, &stamp.query).await {
                    debug!(%path, "page after the previous one is empty; clearing next");
                    page.next = None;
                }
            }
        }

        if self.commit(&stamp, |state| state.show(&page, path, Some(Direction::Prev))) {
            self.inner.fetcher.prefetch_neighbors(&page, &stamp.query).await;
        }
        Ok(())
    }

    /// Bring the displayed page back in line with the server.
    ///
    /// Runs automatically after creates and deletes; call it directly after
    /// mutations made elsewhere. Concurrent calls are queued.
    pub async fn reconcile(&self) -> Result<()> {
        let _queue = self.inner.reconcile_queue.lock().await;
        let _activity = self.start(Activity::LoadingMore);
        let (input, stamp) = {
            let state = self.read();
            let input = ReconcileInput {
                current_path: state.current_path.clone(),
                query: state.query.clone(),
                page: state.pagination.page(),
                previous: state.pagination.previous().map(str::to_string),
            };
            (input, self.stamp(&state))
        };
        let result = self.apply_reconciliation(&input, &stamp).await;
        self.settle(result, "Failed to refresh page")
    }

    async fn apply_reconciliation(&self, input: &ReconcileInput, stamp: &LoadStamp) -> Result<()> {
        let reconciler = Reconciler::new(&self.inner.fetcher, self.inner.max_backfill_rounds);
        match reconciler.run(input).await? {
            Outcome::Show { page, path } => {
                if self.commit(stamp, |state| state.show(&page, path, None)) {
                    self.inner.fetcher.prefetch_neighbors(&page, &input.query).await;
                }
                Ok(())
            }
            Outcome::StepBack => self.step_back(true).await,
            Outcome::Reset => {
                let _activity = self.start(Activity::Loading);
                self.reload().await
            }
        }
    }

    /// Change a job's status and patch it into the displayed page.
    pub async fn handle_status_change(&self, id: JobId, status: StatusKind) -> Result<()> {
        let _activity = self.start(Activity::Updating(id));
        self.clear_error();
        let result = self.update_status(id, status).await;
        self.settle(result, "Failed to update status")
    }

    async fn update_status(&self, id: JobId, status: StatusKind) -> Result<()> {
        let updated = self.api().update_status(id, status).await?;
        self.cache().invalidate_all();
        debug!(job_id = %id, status = status.as_str(), "job status updated");

        let mut state = self.write();
        if let Some(slot) = state.jobs.iter_mut().find(|job| job.id == id) {
            *slot = updated;
        }
        Ok(())
    }

    /// Delete a job, then reconcile the displayed page.
    ///
    /// Succeeds once the server has deleted the job; a failed
    /// reconciliation afterwards only shows up in the error slot.
    pub async fn handle_delete(&self, id: JobId) -> Result<()> {
        let _activity = self.start(Activity::Deleting(id));
        self.clear_error();
        let name = self
            .read()
            .jobs
            .iter()
            .find(|job| job.id == id)
            .map(|job| job.name.clone());

        let deleted = self.api().delete_job(id).await.map_err(ListError::from);
        self.settle(deleted, "Failed to delete job")?;
        self.cache().invalidate_all();
        info!(job_id = %id, "job deleted");

        self.write().notice = Some(match name {
            Some(name) => format!("Job \"{name}\" deleted"),
            None => "Job deleted".to_string(),
        });
        if let Err(e) = self.reconcile().await {
            debug!(error = %e, "reconciliation after delete failed");
        }
        Ok(())
    }

    /// Validate `raw_name`, create the job, then reconcile the page.
    ///
    /// An invalid name sets the name error and never reaches the server.
    /// Once the server has created the job this returns it, even if the
    /// reconciliation afterwards fails.
    pub async fn create_job(&self, raw_name: &str) -> Result<Job> {
        let name = match JobName::new(raw_name) {
            Ok(name) => {
                self.write().name_error = None;
                name
            }
            Err(e) => {
                self.write().name_error = Some(e.user_message());
                return Err(e.into());
            }
        };

        let _activity = self.start(Activity::Creating);
        self.clear_error();
        let created = self.api().create_job(&name).await.map_err(ListError::from);
        let job = self.settle(created, "Failed to create job")?;
        self.cache().invalidate_all();
        info!(job_id = %job.id, name = %job.name, "job created");

        self.write().notice = Some(format!("Job \"{}\" created", job.name));
        if let Err(e) = self.reconcile().await {
            debug!(error = %e, "reconciliation after create failed");
        }
        Ok(job)
    }

    /// Capture where the list is, for returning to it later.
    #[must_use]
    pub fn navigation_snapshot(&self) -> NavigationSnapshot {
        let state = self.read();
        NavigationSnapshot {
            page: state.pagination.page(),
            next: state.pagination.next().map(str::to_string),
            previous: state.pagination.previous().map(str::to_string),
            query: state.query.clone(),
            current_path: state.current_path.clone(),
        }
    }

    /// Return to a captured position and re-fetch that page.
    pub async fn restore(&self, snapshot: NavigationSnapshot) -> Result<()> {
        {
            let mut state = self.write();
            state.query = snapshot.query;
            state.current_path = self.codec().ensure_page_size(&snapshot.current_path);
            state.pagination =
                PaginationState::from_parts(snapshot.next, snapshot.previous, snapshot.page);
        }
        debug!("restored navigation snapshot");
        self.reconcile().await
    }
}
