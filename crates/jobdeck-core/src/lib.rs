//! Jobdeck Core - Foundation crate for the Jobdeck dashboard client.
//!
//! This crate provides the job domain types, error handling, configuration
//! management and tracing setup that the API and list crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Job domain types (`JobId`, `JobName`, `StatusKind`, `Job`, `Paginated`)
//! - [`telemetry`] - `tracing-subscriber` initialisation
//!
//! # Example
//!
//! ```rust
//! use jobdeck_core::{AppConfig, JobName, StatusKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.pagination.page_size, 15);
//!
//! let name = JobName::new("  nightly-backup ")?;
//! assert_eq!(name.as_str(), "nightly-backup");
//! assert_eq!(StatusKind::InProgress.as_str(), "IN_PROGRESS");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, AppConfig, LoggingConfig, PaginationConfig};
pub use error::{ConfigError, ConfigResult, JobdeckError, Result};
pub use types::{
    CurrentStatus, Job, JobHistory, JobId, JobName, JobStatus, Paginated, StatusKind,
    MAX_JOB_NAME_LEN,
};
