//! Cursor link normalization.
//!
//! The server hands back absolute `next`/`previous` URLs, while the client
//! addresses pages with paths relative to the API base. Every path used for
//! a request or a cache key goes through [`CursorCodec`] so that the same
//! page always maps to the same string.

use jobdeck_api::query::{path_and_query, set_query_param};
use tracing::debug;
use url::Url;

/// Origin used to resolve bare relative paths. Never sent anywhere.
const PLACEHOLDER_ORIGIN: &str = "http://placeholder";

/// Converts cursor links into relative paths carrying the page size.
#[derive(Debug, Clone)]
pub struct CursorCodec {
    base: Option<Url>,
    page_size: usize,
}

impl CursorCodec {
    /// Create a codec for an API mounted at `base_url`.
    ///
    /// An unparseable base still yields a codec; links are then only given
    /// the page size.
    #[must_use]
    pub fn new(base_url: &str, page_size: usize) -> Self {
        let base = match Url::parse(base_url) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(base_url, error = %e, "cursor codec has no usable base URL");
                None
            }
        };
        Self { base, page_size }
    }

    /// Configured page size.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Set `page_size` on a path, replacing any existing value.
    ///
    /// Returns the input unchanged if it cannot be parsed.
    #[must_use]
    pub fn ensure_page_size(&self, raw_path: &str) -> String {
        let parsed = Url::parse(PLACEHOLDER_ORIGIN).and_then(|origin| origin.join(raw_path));
        match parsed {
            Ok(mut url) => {
                set_query_param(&mut url, "page_size", &self.page_size.to_string());
                path_and_query(&url)
            }
            Err(e) => {
                debug!(path = raw_path, error = %e, "leaving unparseable path as-is");
                raw_path.to_string()
            }
        }
    }

    /// Turn an absolute or relative cursor link into a path relative to the
    /// API base, with the page size applied.
    ///
    /// `http://host/api/jobs/?after=15` with base `http://host/api` becomes
    /// `/jobs/?after=15&page_size=15`. Returns the input unchanged if it
    /// cannot be parsed.
    #[must_use]
    pub fn to_relative(&self, link: &str) -> String {
        let Some(base) = &self.base else {
            return self.ensure_page_size(link);
        };

        let absolute = match base.join(link) {
            Ok(url) => url,
            Err(e) => {
                debug!(link, error = %e, "leaving unparseable cursor link as-is");
                return link.to_string();
            }
        };

        let base_path = base.path().trim_end_matches('/');
        let full_path = absolute.path();
        let relative = if base_path.is_empty() {
            full_path
        } else {
            match full_path.strip_prefix(base_path) {
                Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
                _ => full_path,
            }
        };
        let relative = if relative.is_empty() { "/" } else { relative };

        let with_query = match absolute.query() {
            Some(q) => format!("{relative}?{q}"),
            None => relative.to_string(),
        };
        self.ensure_page_size(&with_query)
    }
}
