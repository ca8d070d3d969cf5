//! Jobdeck List - the paginated jobs list and its reconciliation engine.
//!
//! The server paginates with opaque `next`/`previous` cursor links instead
//! of offsets, so after a job is created or deleted the client cannot work
//! out analytically what the current page should contain. This crate keeps
//! one displayed page consistent by re-fetching it and, when it came back
//! empty or short, walking the neighbouring cursors until the server's own
//! ordering has refilled it.
//!
//! # Modules
//!
//! - [`cursor`] - Normalizes cursor links into cache-stable relative paths
//! - [`cache`] - Short-lived page cache used for prefetching neighbours
//! - [`state`] - Cursor links and the client-side page counter
//! - [`fetch`] - Sorted page fetching shared by navigation and reconciliation
//! - [`reconcile`] - Decides how to redisplay the current page after a mutation
//! - [`controller`] - Owns the displayed jobs and exposes every entry point
//! - [`detail`] - Job detail loading with cancellation
//! - [`session`] - Persisted navigation snapshot for deep links
//!
//! # Flow
//!
//! ```text
//! create/delete ──► ListController ──► Reconciler ──► PageFetcher ──► JobsApi
//!                        │                  │              │
//!                        │                  ▼              ▼
//!                        │            CursorCodec      PageCache
//!                        ▼
//!               PaginationState + jobs (committed atomically)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use jobdeck_api::HttpJobsApi;
//! use jobdeck_core::AppConfig;
//! use jobdeck_list::ListController;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load_with_env()?;
//! let api = Arc::new(HttpJobsApi::new(&config.api)?);
//! let list = ListController::new(api, &config.pagination);
//!
//! list.fetch_jobs().await?;
//! list.create_job("nightly-backup").await?;
//! let view = list.snapshot();
//! println!("page {} shows {} jobs", view.page, view.jobs.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cache;
pub mod controller;
pub mod cursor;
pub mod detail;
pub mod error;
pub mod fetch;
pub mod reconcile;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use cache::PageCache;
pub use controller::{ListController, ListView};
pub use cursor::CursorCodec;
pub use detail::{load_job_detail, JobDetail};
pub use error::{ListError, NavLane, Result};
pub use fetch::PageFetcher;
pub use reconcile::{Outcome, ReconcileInput, Reconciler};
pub use session::{job_detail_path, NavigationSnapshot, SessionStore};
pub use state::{Direction, PaginationState};
