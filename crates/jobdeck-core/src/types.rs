//! Shared types used across the Jobdeck client.
//!
//! These mirror the jobs API payloads. The server owns every value here; the
//! client only ever holds read-through copies.

use crate::error::JobdeckError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest job name the server accepts, in characters.
pub const MAX_JOB_NAME_LEN: usize = 255;

/// Server-assigned job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl JobId {
    /// Get the raw integer value.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A validated job name, used when creating jobs.
///
/// Names are trimmed and must be 1-255 characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobName(String);

impl JobName {
    /// Create a new `JobName` from user input.
    ///
    /// # Errors
    /// Returns `JobdeckError::Validation` if the trimmed name is empty or
    /// longer than [`MAX_JOB_NAME_LEN`] characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, JobdeckError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(JobdeckError::Validation("Name is required".to_string()));
        }
        if trimmed.chars().count() > MAX_JOB_NAME_LEN {
            return Err(JobdeckError::Validation(format!(
                "Name must be at most {MAX_JOB_NAME_LEN} characters"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle status.
///
/// Any status may follow any other; the client enforces no transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusKind {
    /// Waiting to run
    Pending,
    /// Currently running
    InProgress,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
}

impl StatusKind {
    /// Every status, in display order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Failed,
    ];

    /// Wire value as sent in `status_type`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusKind {
    type Err = JobdeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| JobdeckError::Validation(format!("unknown status '{s}'")))
    }
}

/// Denormalized snapshot of a job's latest status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStatus {
    /// Latest status kind, if any was ever set
    pub status_type: Option<StatusKind>,
    /// When the latest status was set
    pub timestamp: Option<DateTime<Utc>>,
}

/// A job as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Server-assigned identifier
    pub id: JobId,
    /// Display name
    pub name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time (bumped by status changes)
    pub updated_at: DateTime<Utc>,
    /// Latest status snapshot
    #[serde(default)]
    pub current_status: Option<CurrentStatus>,
}

impl Job {
    /// Latest status kind, if known.
    #[must_use]
    pub fn status(&self) -> Option<StatusKind> {
        self.current_status.as_ref().and_then(|s| s.status_type)
    }
}

/// One entry of a job's append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Record identifier
    pub id: i64,
    /// Owning job
    pub job: JobId,
    /// Status that was set
    pub status_type: StatusKind,
    /// When it was set
    pub timestamp: DateTime<Utc>,
}

/// Response of `GET /jobs/{id}/history/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHistory {
    /// The job itself
    pub job: Job,
    /// History in ascending chronological order
    pub results: Vec<JobStatus>,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    /// Link to the following page, if any
    #[serde(default)]
    pub next: Option<String>,
    /// Link to the preceding page, if any
    #[serde(default)]
    pub previous: Option<String>,
}

impl<T> Paginated<T> {
    /// An empty page with no links.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            next: None,
            previous: None,
        }
    }
}
