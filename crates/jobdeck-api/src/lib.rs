//! Jobdeck API - transport layer for the jobs dashboard backend.
//!
//! This crate consumes the server's jobs endpoints and turns every failure
//! into a single human-readable message. It knows nothing about pagination
//! state; it fetches whatever path it is handed.
//!
//! # Endpoints
//!
//! ```text
//! GET    /jobs/?page_size=N&after=..|before=..&q=..   -> Paginated<Job>
//! POST   /jobs/                {name}                -> Job
//! POST   /jobs/{id}/status/    {status_type}         -> Job
//! DELETE /jobs/{id}/                                 -> 204
//! GET    /jobs/{id}/                                 -> Job
//! GET    /jobs/{id}/history/                         -> JobHistory
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use jobdeck_api::{HttpJobsApi, JobsApi};
//! use jobdeck_core::ApiConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = HttpJobsApi::new(&ApiConfig::default())?;
//! let page = api.list_jobs("/jobs/?page_size=15", Some("he")).await?;
//! println!("{} jobs, more: {}", page.results.len(), page.next.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod error;
pub mod http;
pub mod message;
pub mod query;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

// Re-export commonly used types
pub use client::JobsApi;
pub use error::{ApiError, Result};
pub use http::HttpJobsApi;
pub use message::{extract_message, ExtractionStrategy, DEFAULT_STRATEGIES};
