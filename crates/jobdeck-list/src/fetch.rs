//! Page fetching shared by navigation and reconciliation.

use crate::cache::PageCache;
use crate::cursor::CursorCodec;
use jobdeck_api::{JobsApi, Result};
use jobdeck_core::{Job, Paginated};
use std::sync::Arc;
use tracing::{debug, warn};

/// Sort jobs ascending by id, the order every page is displayed in.
pub fn sort_by_id(jobs: &mut [Job]) {
    jobs.sort_by_key(|job| job.id);
}

/// Fetches list pages, sorted, optionally through the [`PageCache`].
#[derive(Clone)]
pub struct PageFetcher {
    api: Arc<dyn JobsApi>,
    codec: CursorCodec,
    cache: PageCache,
}

impl PageFetcher {
    /// Bundle an API with the codec and cache it should use.
    #[must_use]
    pub fn new(api: Arc<dyn JobsApi>, codec: CursorCodec, cache: PageCache) -> Self {
        Self { api, codec, cache }
    }

    /// Underlying API.
    #[must_use]
    pub fn api(&self) -> &dyn JobsApi {
        self.api.as_ref()
    }

    /// Link normalizer.
    #[must_use]
    pub fn codec(&self) -> &CursorCodec {
        &self.codec
    }

    /// Page cache.
    #[must_use]
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Fetch a page from the network, bypassing the cache.
    pub async fn fetch(&self, path: &str, query: &str) -> Result<Paginated<Job>> {
        let q = Some(query).filter(|q| !q.is_empty());
        let mut page = self.api.list_jobs(path, q).await?;
        sort_by_id(&mut page.results);
        Ok(page)
    }

    /// Serve a fresh cached page, or fetch and cache it.
    pub async fn fetch_cached(&self, path: &str, query: &str) -> Result<Paginated<Job>> {
        if let Some(page) = self.cache.get(path, query) {
            debug!(path, "page cache hit");
            return Ok(page.as_ref().clone());
        }
        let page = self.fetch(path, query).await?;
        self.cache.set(path, query, page.clone());
        Ok(page)
    }

    /// Whether the page behind `link` is empty.
    ///
    /// Always hits the network. A failed check counts as not exhausted so
    /// the link is kept.
    pub async fn is_exhausted(&self, link: &str, query: &str) -> bool {
        let path = self.codec.to_relative(link);
        match self.fetch(&path, query).await {
            Ok(page) => page.results.is_empty(),
            Err(e) => {
                warn!(path, error = %e, "next-page check failed; keeping link");
                false
            }
        }
    }

    /// Warm the cache with the pages adjacent to `page`, concurrently.
    pub async fn prefetch_neighbors(&self, page: &Paginated<Job>, query: &str) {
        let next = page.next.as_deref().map(|link| self.codec.to_relative(link));
        let previous = page
            .previous
            .as_deref()
            .map(|link| self.codec.to_relative(link));

        let api = self.api.as_ref();
        tokio::join!(
            async {
                if let Some(path) = &next {
                    self.cache.prefetch(api, path, query).await;
                }
            },
            async {
                if let Some(path) = &previous {
                    self.cache.prefetch(api, path, query).await;
                }
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobdeck_api::memory::InMemoryJobsApi;
    use std::time::Duration;

    fn fetcher(count: usize) -> (Arc<InMemoryJobsApi>, PageFetcher) {
        let api = Arc::new(InMemoryJobsApi::new("http://testserver/api"));
        api.seed((0..count).map(|i| format!("job-{i}")));
        let codec = CursorCodec::new("http://testserver/api", 5);
        let cache = PageCache::new(Duration::from_secs(30));
        let fetcher = PageFetcher::new(api.clone(), codec, cache);
        (api, fetcher)
    }

    #[tokio::test]
    async fn test_fetch_cached_hits_network_once() {
        let (api, fetcher) = fetcher(7);
        let first = fetcher.fetch_cached("/jobs/?page_size=5", "").await.expect("fetch");
        let second = fetcher.fetch_cached("/jobs/?page_size=5", "").await.expect("fetch");
        assert_eq!(first, second);
        assert_eq!(api.requests().len(), 1);

        fetcher.fetch("/jobs/?page_size=5", "").await.expect("fetch");
        assert_eq!(api.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_prefetch_neighbors_uses_normalized_paths() {
        let (api, fetcher) = fetcher(12);
        let page = fetcher.fetch("/jobs/?after=5&page_size=5", "").await.expect("fetch");
        api.clear_requests();

        fetcher.prefetch_neighbors(&page, "").await;

        let mut requests = api.requests();
        requests.sort();
        assert_eq!(
            requests,
            vec![
                "/jobs/?after=10&page_size=5".to_string(),
                "/jobs/?before=6&page_size=5".to_string(),
            ]
        );
        assert!(fetcher.cache().get("/jobs/?after=10&page_size=5", "").is_some());
    }

    #[tokio::test]
    async fn test_failed_check_keeps_link() {
        let (api, fetcher) = fetcher(5);
        api.fail_next_list_matching("after=5");
        assert!(!fetcher.is_exhausted("http://testserver/api/jobs/?after=5", "").await);
        assert!(fetcher.is_exhausted("http://testserver/api/jobs/?after=5", "").await);
    }
}
