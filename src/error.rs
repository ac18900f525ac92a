//! Error types for fetchzip
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Fetch, Task, Store, Bundle)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for fetchzip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fetchzip
///
/// This is the primary error type used throughout the library. Each variant
/// carries enough context to diagnose the failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "archives_dir")
        key: Option<String>,
    },

    /// Task store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// File retrieval failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Task lifecycle rule violated
    #[error("task error: {0}")]
    Task(#[from] TaskError),

    /// ZIP assembly or transient storage failed
    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller's cancellation token fired before the operation ran
    #[error("operation cancelled")]
    Cancelled,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Task store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// No task with the given id exists
    #[error("task {0} not found")]
    NotFound(String),

    /// A task with an empty id cannot be stored
    #[error("task id must not be empty")]
    EmptyId,
}

/// File retrieval errors
///
/// Classification is exclusive: a URL fails shape validation, or the
/// transfer fails, or the transfer succeeds but the declared content type is
/// not allowed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL scheme is not http/https or the URL does not parse
    #[error("invalid file URL: {url}")]
    InvalidUrl {
        /// The offending URL
        url: String,
    },

    /// Connection failure, timeout, body read failure, or non-2xx status
    #[error("download failed for {url}: {reason}")]
    Failed {
        /// The URL that failed to download
        url: String,
        /// What went wrong (HTTP status or transport detail)
        reason: String,
    },

    /// Transfer succeeded but the declared content type is not allow-listed
    #[error("unsupported content type for {url}: {content_type}")]
    UnsupportedType {
        /// The URL whose content was rejected
        url: String,
        /// The declared content type, parameters stripped
        content_type: String,
    },
}

/// Task lifecycle errors
#[derive(Debug, Error)]
pub enum TaskError {
    /// No task with the given id exists
    #[error("archive task {id} not found")]
    NotFound {
        /// The task id that was not found
        id: String,
    },

    /// The task already reached `ready`; no more files may be added
    #[error("archive task {id} is already built")]
    AlreadyReady {
        /// The task id that is already built
        id: String,
    },

    /// The task already reached `failed`; no more files may be added
    #[error("archive task {id} has already failed")]
    AlreadyFailed {
        /// The task id that already failed
        id: String,
    },

    /// The task already holds the maximum number of files
    #[error("archive task {id} is full ({limit} files)")]
    ArchiveFull {
        /// The full task's id
        id: String,
        /// The configured per-archive file limit
        limit: usize,
    },

    /// More URLs supplied than fit in one archive
    #[error("too many files requested: {count} exceeds the limit of {limit}")]
    TooManyFiles {
        /// Number of URLs supplied
        count: usize,
        /// The configured per-archive file limit
        limit: usize,
    },

    /// The in-progress task limit is reached; creation rejected
    #[error("server busy: {limit} archives already in progress")]
    ServerBusy {
        /// The configured in-progress task limit
        limit: usize,
    },
}

/// Transient storage and ZIP assembly errors
///
/// Each variant names the path that failed so build failures can point at a
/// specific file or output.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Directory creation failed
    #[error("failed to create directory {path}: {reason}")]
    CreateDir {
        /// The directory that could not be created
        path: PathBuf,
        /// The underlying I/O failure
        reason: String,
    },

    /// Writing a transient file failed
    #[error("failed to write {path}: {reason}")]
    WriteFile {
        /// The file that could not be written
        path: PathBuf,
        /// The underlying I/O failure
        reason: String,
    },

    /// Opening a transient file during ZIP assembly failed
    #[error("failed to open {path}: {reason}")]
    OpenFile {
        /// The file that could not be opened
        path: PathBuf,
        /// The underlying I/O failure
        reason: String,
    },

    /// Writing the ZIP archive itself failed
    #[error("failed to write archive {path}: {reason}")]
    Archive {
        /// The archive output path
        path: PathBuf,
        /// The underlying failure
        reason: String,
    },

    /// Removing the transient directory failed
    #[error("failed to remove {path}: {reason}")]
    Remove {
        /// The path that could not be removed
        path: PathBuf,
        /// The underlying I/O failure
        reason: String,
    },
}

/// API error response format
///
/// Returned by API endpoints when an error occurs: a machine-readable code,
/// a human-readable message, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "archive task 5f0c... not found",
///     "details": {
///       "task_id": "5f0c..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found", "server_busy")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create a "conflict" error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("conflict", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Store(StoreError::EmptyId) => 400,
            Error::Task(TaskError::TooManyFiles { .. }) => 400,

            // 404 Not Found
            Error::Store(StoreError::NotFound(_)) => 404,
            Error::Task(TaskError::NotFound { .. }) => 404,

            // 409 Conflict - Task state forbids the operation
            Error::Task(TaskError::AlreadyReady { .. }) => 409,
            Error::Task(TaskError::AlreadyFailed { .. }) => 409,
            Error::Task(TaskError::ArchiveFull { .. }) => 409,

            // 422 Unprocessable Entity - Semantic input errors
            Error::Fetch(FetchError::InvalidUrl { .. }) => 422,
            Error::Fetch(FetchError::UnsupportedType { .. }) => 422,

            // 502 Bad Gateway - Upstream download failures
            Error::Fetch(FetchError::Failed { .. }) => 502,

            // 503 Service Unavailable - admission gate
            Error::Task(TaskError::ServerBusy { .. }) => 503,

            // 500 Internal Server Error - server-side issues
            Error::Bundle(_) => 500,
            Error::Io(_) => 500,
            Error::Cancelled => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Store(e) => match e {
                StoreError::NotFound(_) => "task_not_found",
                StoreError::EmptyId => "empty_task_id",
            },
            Error::Fetch(e) => match e {
                FetchError::InvalidUrl { .. } => "invalid_url",
                FetchError::Failed { .. } => "download_failed",
                FetchError::UnsupportedType { .. } => "unsupported_type",
            },
            Error::Task(e) => match e {
                TaskError::NotFound { .. } => "task_not_found",
                TaskError::AlreadyReady { .. } => "already_ready",
                TaskError::AlreadyFailed { .. } => "already_failed",
                TaskError::ArchiveFull { .. } => "archive_full",
                TaskError::TooManyFiles { .. } => "too_many_files",
                TaskError::ServerBusy { .. } => "server_busy",
            },
            Error::Bundle(e) => match e {
                BundleError::CreateDir { .. } => "dir_create_failed",
                BundleError::WriteFile { .. } => "file_write_failed",
                BundleError::OpenFile { .. } => "file_open_failed",
                BundleError::Archive { .. } => "archive_write_failed",
                BundleError::Remove { .. } => "remove_failed",
            },
            Error::Io(_) => "io_error",
            Error::Cancelled => "cancelled",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Task(TaskError::NotFound { id }) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::Task(TaskError::AlreadyReady { id }) => Some(serde_json::json!({
                "task_id": id,
                "status": "ready",
            })),
            Error::Task(TaskError::AlreadyFailed { id }) => Some(serde_json::json!({
                "task_id": id,
                "status": "failed",
            })),
            Error::Task(TaskError::ArchiveFull { id, limit }) => Some(serde_json::json!({
                "task_id": id,
                "limit": limit,
            })),
            Error::Task(TaskError::TooManyFiles { count, limit }) => Some(serde_json::json!({
                "count": count,
                "limit": limit,
            })),
            Error::Task(TaskError::ServerBusy { limit }) => Some(serde_json::json!({
                "limit": limit,
            })),
            Error::Fetch(FetchError::UnsupportedType { url, content_type }) => {
                Some(serde_json::json!({
                    "url": url,
                    "content_type": content_type,
                }))
            }
            Error::Fetch(FetchError::Failed { url, .. }) => Some(serde_json::json!({
                "url": url,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
