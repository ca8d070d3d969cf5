//! Post-mutation reconciliation of the displayed page.
//!
//! After a create or delete the current page is re-fetched straight from
//! the server and one of four outcomes is chosen:
//!
//! 1. The page came back empty and we are past page 1: step back one page.
//! 2. The page came back short while more items exist beyond it:
//!    - on page 1, reload from the start;
//!    - otherwise backfill by stepping forward then immediately back, which
//!      yields a page anchored so that it is full again.
//! 3. Anything else: show what came back.
//!
//! Backfill is bounded. If the server keeps returning short pages the last
//! result is accepted rather than looping.

use crate::fetch::PageFetcher;
use jobdeck_api::Result;
use jobdeck_core::{Job, Paginated};
use tracing::{debug, warn};

/// What the controller knew about the current page before reconciling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileInput {
    /// Normalized path of the displayed page
    pub current_path: String,
    /// Active search query, empty for none
    pub query: String,
    /// 1-based page counter
    pub page: u32,
    /// Stored link to the preceding page
    pub previous: Option<String>,
}

/// How the controller should redisplay the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Display `page`, fetched from `path`; the page counter is unchanged.
    Show {
        /// Page to display, sorted by id
        page: Paginated<Job>,
        /// Normalized path the page was fetched from
        path: String,
    },
    /// The current page is gone; navigate back and validate `next`.
    StepBack,
    /// Reload the list from the first page.
    Reset,
}

/// Chooses an [`Outcome`] for the current page.
pub struct Reconciler<'a> {
    fetcher: &'a PageFetcher,
    max_backfill_rounds: u32,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler that backfills at most `max_backfill_rounds` times.
    #[must_use]
    pub fn new(fetcher: &'a PageFetcher, max_backfill_rounds: u32) -> Self {
        Self {
            fetcher,
            max_backfill_rounds,
        }
    }

    /// Re-fetch the current page, bypassing the cache, and decide.
    pub async fn run(&self, input: &ReconcileInput) -> Result<Outcome> {
        let page_size = self.fetcher.codec().page_size();
        let current = self
            .fetcher
            .fetch(&input.current_path, &input.query)
            .await?;
        let count = current.results.len();
        let past_first = input.page > 1 && input.previous.is_some();

        if count == 0 && past_first {
            debug!(page = input.page, "current page emptied; stepping back");
            return Ok(Outcome::StepBack);
        }

        if count < page_size && current.next.is_some() {
            if past_first {
                return self
                    .backfill(current, input.current_path.clone(), &input.query)
                    .await;
            }
            debug!(count, "first page came back short; reloading");
            return Ok(Outcome::Reset);
        }

        Ok(Outcome::Show {
            page: current,
            path: input.current_path.clone(),
        })
    }

    async fn backfill(
        &self,
        mut current: Paginated<Job>,
        mut path: String,
        query: &str,
    ) -> Result<Outcome> {
        let page_size = self.fetcher.codec().page_size();
        let codec = self.fetcher.codec();

        for round in 1..=self.max_backfill_rounds {
            let Some(next_link) = current.next.clone() else {
                break;
            };

            let forward = self.fetcher.fetch(&codec.to_relative(&next_link), query).await?;
            if forward.results.is_empty() {
                debug!(round, "nothing beyond the current page; clearing next");
                current.next = None;
                break;
            }
            let Some(back_link) = forward.previous else {
                debug!(round, "forward page has no previous link; keeping current page");
                break;
            };

            let back_path = codec.to_relative(&back_link);
            current = self.fetcher.fetch(&back_path, query).await?;
            path = back_path;

            if current.results.len() >= page_size || current.next.is_none() {
                debug!(round, count = current.results.len(), "backfill settled");
                return Ok(Outcome::Show {
                    page: current,
                    path,
                });
            }
        }

        if current.results.len() < page_size && current.next.is_some() {
            warn!(
                rounds = self.max_backfill_rounds,
                count = current.results.len(),
                "backfill did not fill the page; accepting short page"
            );
        }
        Ok(Outcome::Show {
            page: current,
            path,
        })
    }
}
