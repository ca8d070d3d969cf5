//! Cursor links and the client-side page counter.
//!
//! The server never reports a page number, so the counter is derived from
//! the direction of each navigation. It is used for display and for the
//! "not on the first page" checks during reconciliation.

use jobdeck_core::Paginated;

/// How a newly displayed page relates to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Back to the first page
    Reset,
    /// One page forward
    Next,
    /// One page back
    Prev,
}

/// Current cursor links plus the 1-based page counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    next: Option<String>,
    previous: Option<String>,
    page: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    /// State before the first fetch: page 1, no links.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: None,
            previous: None,
            page: 1,
        }
    }

    /// Rebuild state from persisted parts. The page is clamped to at least 1.
    #[must_use]
    pub fn from_parts(next: Option<String>, previous: Option<String>, page: u32) -> Self {
        Self {
            next,
            previous,
            page: page.max(1),
        }
    }

    /// Link to the following page.
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    /// Link to the preceding page.
    #[must_use]
    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// 1-based page counter.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Replace both links and move the counter according to `direction`.
    ///
    /// Without a direction the counter is left alone; use that when the
    /// same logical page was re-fetched.
    pub fn update(
        &mut self,
        next: Option<String>,
        previous: Option<String>,
        direction: Option<Direction>,
    ) {
        self.next = next;
        self.previous = previous;
        self.page = match direction {
            Some(Direction::Reset) => 1,
            Some(Direction::Next) => self.page.saturating_add(1),
            Some(Direction::Prev) => self.page.saturating_sub(1).max(1),
            None => self.page,
        };
    }

    /// [`Self::update`] using the links of a fetched page.
    pub fn update_from<T>(&mut self, page: &Paginated<T>, direction: Option<Direction>) {
        self.update(page.next.clone(), page.previous.clone(), direction);
    }

    /// Mark the following page as exhausted.
    pub fn clear_next(&mut self) {
        self.next = None;
    }

    /// Whether pagination controls should be shown.
    #[must_use]
    pub fn has_multi_page(&self, displayed: usize, page_size: usize) -> bool {
        self.next.is_some() || self.previous.is_some() || displayed > page_size
    }
}
