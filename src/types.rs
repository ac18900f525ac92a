//! Core types for fetchzip

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for an archive task
///
/// Opaque UUID v4 string, assigned once at task creation and immutable
/// afterwards. The same id keys the task record in the store and the ZIP
/// artifact on disk (`<archives_dir>/<id>.zip`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Allocate a fresh random task id
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty (never true for ids produced by [`TaskId::new`])
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Archive task status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created without files, none added yet
    Empty,
    /// At least one file added, archive not yet assembled
    Building,
    /// ZIP assembled and available for download
    Ready,
    /// Build failed or no input succeeded
    Failed,
}

impl TaskStatus {
    /// Whether this status is terminal (no further file additions accepted)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Ready | TaskStatus::Failed)
    }

    /// Whether this status counts against the in-progress admission limit
    pub fn is_in_progress(&self) -> bool {
        matches!(self, TaskStatus::Empty | TaskStatus::Building)
    }

    /// String form used in responses and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Empty => "empty",
            TaskStatus::Building => "building",
            TaskStatus::Ready => "ready",
            TaskStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One archive-building unit of work
///
/// `files` holds the names of successfully retrieved files in the exact order
/// their sources were supplied; `errors` holds one `"<source> - <reason>"`
/// entry per failed input. Both are append-only until the task reaches a
/// terminal status.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ArchiveTask {
    /// Opaque unique identifier
    pub id: TaskId,
    /// Current lifecycle status
    pub status: TaskStatus,
    /// Names of successfully retrieved files, in supply order
    pub files: Vec<String>,
    /// Human-readable failure entries, in supply order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp, drives TTL expiry
    pub updated_at: DateTime<Utc>,
}

impl ArchiveTask {
    /// Create a new task with the given status and empty file/error lists
    pub fn new(id: TaskId, status: TaskStatus) -> Self {
        let now = Utc::now();
        Self {
            id,
            status,
            files: Vec::new(),
            errors: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a successfully retrieved file name and refresh `updated_at`
    pub fn push_file(&mut self, name: impl Into<String>) {
        self.files.push(name.into());
        self.touch();
    }

    /// Append a `"<source> - <reason>"` failure entry and refresh `updated_at`
    pub fn push_error(&mut self, source: &str, reason: impl std::fmt::Display) {
        self.errors.push(format!("{source} - {reason}"));
        self.touch();
    }

    /// Transition to a new status and refresh `updated_at`
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.touch();
    }

    /// Refresh `updated_at` to now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
