//! Short-lived cache of list pages.
//!
//! Entries are keyed by the normalized relative path and the search query,
//! and are only served while younger than the configured TTL. Cached pages
//! are shared as `Arc` snapshots so readers never see a half-written page.

use jobdeck_api::JobsApi;
use jobdeck_core::{Job, Paginated};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Cache key: normalized path plus search query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: String,
    query: String,
}

impl CacheKey {
    fn new(path: &str, query: &str) -> Self {
        Self {
            path: path.to_string(),
            query: query.to_string(),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    page: Arc<Paginated<Job>>,
    stored_at: Instant,
}

/// TTL-bounded page cache, cheap to clone.
#[derive(Debug, Clone)]
pub struct PageCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    ttl: Duration,
}

impl PageCache {
    /// Create an empty cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Entry lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the page stored for `(path, query)` if it is still fresh.
    #[must_use]
    pub fn get(&self, path: &str, query: &str) -> Option<Arc<Paginated<Job>>> {
        let entries = self.entries.read().expect("page cache lock poisoned");
        entries
            .get(&CacheKey::new(path, query))
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.page))
    }

    /// Store a page, replacing any previous entry and dropping expired ones.
    pub fn set(&self, path: &str, query: &str, page: Paginated<Job>) -> Arc<Paginated<Job>> {
        let page = Arc::new(page);
        let mut entries = self.entries.write().expect("page cache lock poisoned");
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.insert(
            CacheKey::new(path, query),
            CacheEntry {
                page: Arc::clone(&page),
                stored_at: Instant::now(),
            },
        );
        page
    }

    /// Fetch a page in the background of a navigation and cache it.
    ///
    /// Skips the request when a fresh entry already exists. Failures are
    /// logged and otherwise ignored.
    pub async fn prefetch(&self, api: &dyn JobsApi, path: &str, query: &str) {
        if self.get(path, query).is_some() {
            return;
        }
        let q = Some(query).filter(|q| !q.is_empty());
        match api.list_jobs(path, q).await {
            Ok(mut page) => {
                crate::fetch::sort_by_id(&mut page.results);
                self.set(path, query, page);
            }
            Err(e) => debug!(path, error = %e, "prefetch failed"),
        }
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write().expect("page cache lock poisoned");
        if !entries.is_empty() {
            debug!(count = entries.len(), "invalidating page cache");
        }
        entries.clear();
    }

    /// Number of stored entries, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().expect("page cache lock poisoned").len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
