//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`archives`] — Archive task creation, file addition, status, download
//! - [`system`] — Health and OpenAPI spec

use crate::types::{ArchiveTask, TaskStatus};
use serde::{Deserialize, Serialize};

mod archives;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use archives::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /archives
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateArchiveRequest {
    /// URLs to download into the archive, in the order they should appear
    pub urls: Vec<String>,
}

/// Request body for POST /archives/:id/files
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AddFileRequest {
    /// URL of the file to add
    pub url: String,
}

/// Response body for POST /archives/:id/files
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AddFileResponse {
    /// Whether the file was added
    pub success: bool,
    /// Human-readable outcome description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Archive task representation returned by creation and status endpoints
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ArchiveResponse {
    /// Task id
    pub id: String,
    /// Current status string (`empty`/`building`/`ready`/`failed`)
    pub status: String,
    /// Names of successfully retrieved files, in supply order
    pub files: Vec<String>,
    /// Per-input failure entries, omitted when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last mutation timestamp (RFC 3339)
    pub updated_at: String,
    /// Download URL, present only once the archive is ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_url: Option<String>,
}

impl ArchiveResponse {
    /// Build the wire representation of a task
    pub fn from_task(task: &ArchiveTask) -> Self {
        let archive_url = (task.status == TaskStatus::Ready)
            .then(|| format!("/archives/{}/download", task.id));

        Self {
            id: task.id.to_string(),
            status: task.status.to_string(),
            files: task.files.clone(),
            errors: task.errors.clone(),
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
            archive_url,
        }
    }
}

/// Response body for GET /health
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "ok" when the server responds
    pub status: String,
    /// Crate version
    pub version: String,
}
