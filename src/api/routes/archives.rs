//! Archive task management handlers.

use super::{AddFileRequest, AddFileResponse, ArchiveResponse, CreateArchiveRequest};
use crate::api::AppState;
use crate::error::ApiError;
use crate::types::{TaskId, TaskStatus};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// POST /archives - Create an archive task from a batch of URLs
///
/// The task is driven to a terminal state within this request: every URL is
/// fetched, failures are aggregated onto the task, and the ZIP is built when
/// at least one file succeeded.
#[utoipa::path(
    post,
    path = "/archives",
    tag = "archives",
    request_body = CreateArchiveRequest,
    responses(
        (status = 201, description = "Task processed to a terminal state", body = ArchiveResponse),
        (status = 400, description = "No URLs supplied, or more than the per-archive limit"),
        (status = 503, description = "Too many archives already in progress")
    )
)]
pub async fn create_archive(
    State(state): State<AppState>,
    Json(request): Json<CreateArchiveRequest>,
) -> Response {
    if request.urls.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("at least one URL is required")),
        )
            .into_response();
    }

    match state
        .manager
        .create_with_urls(&state.cancel, &request.urls)
        .await
    {
        Ok(task) => (
            StatusCode::CREATED,
            Json(ArchiveResponse::from_task(&task)),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /archives/empty - Create an empty archive task
///
/// Files are added afterwards with `POST /archives/:id/files`.
#[utoipa::path(
    post,
    path = "/archives/empty",
    tag = "archives",
    responses(
        (status = 201, description = "Empty task created", body = ArchiveResponse),
        (status = 503, description = "Too many archives already in progress")
    )
)]
pub async fn create_empty_archive(State(state): State<AppState>) -> Response {
    match state.manager.create_empty(&state.cancel).await {
        Ok(task) => (
            StatusCode::CREATED,
            Json(ArchiveResponse::from_task(&task)),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /archives/:id/files - Add one file to an existing task
///
/// Reaching the configured file limit builds the ZIP as part of this call.
/// Unlike the bulk path, a fetch failure is returned to the caller directly
/// and leaves the task untouched.
#[utoipa::path(
    post,
    path = "/archives/{id}/files",
    tag = "archives",
    params(
        ("id" = String, Path, description = "Archive task id")
    ),
    request_body = AddFileRequest,
    responses(
        (status = 200, description = "File added", body = AddFileResponse),
        (status = 400, description = "Blank URL"),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Task already finished or full"),
        (status = 422, description = "Invalid URL or unsupported content type"),
        (status = 502, description = "Download failed")
    )
)]
pub async fn add_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddFileRequest>,
) -> Response {
    if request.url.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("url must not be empty")),
        )
            .into_response();
    }

    let task_id = TaskId::from(id);
    match state
        .manager
        .add_file(&state.cancel, &task_id, &request.url)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(AddFileResponse {
                success: true,
                message: Some(format!("file added to archive task \"{task_id}\"")),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /archives/:id - Get the current state of a task
///
/// `archive_url` is present only once the task is ready.
#[utoipa::path(
    get,
    path = "/archives/{id}",
    tag = "archives",
    params(
        ("id" = String, Path, description = "Archive task id")
    ),
    responses(
        (status = 200, description = "Task state", body = ArchiveResponse),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_archive_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let task_id = TaskId::from(id);
    match state.manager.get_status(&state.cancel, &task_id).await {
        Ok(task) => (StatusCode::OK, Json(ArchiveResponse::from_task(&task))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /archives/:id/download - Download the built ZIP
///
/// Streams the artifact from durable storage; only ready tasks are
/// downloadable.
#[utoipa::path(
    get,
    path = "/archives/{id}/download",
    tag = "archives",
    params(
        ("id" = String, Path, description = "Archive task id")
    ),
    responses(
        (status = 200, description = "ZIP archive", body = Vec<u8>, content_type = "application/zip"),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Task is not ready for download")
    )
)]
pub async fn download_archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let task_id = TaskId::from(id);

    let task = match state.manager.get_status(&state.cancel, &task_id).await {
        Ok(task) => task,
        Err(e) => return e.into_response(),
    };

    if task.status != TaskStatus::Ready {
        return (
            StatusCode::CONFLICT,
            Json(ApiError::conflict(format!(
                "archive task {task_id} is not ready for download (status: {})",
                task.status
            ))),
        )
            .into_response();
    }

    let path = state.manager.archive_path(&task_id);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(task_id = %task_id, path = %path.display(), error = %e, "ready task has no readable archive");
            return (
                StatusCode::NOT_FOUND,
                Json(ApiError::not_found(format!("archive for task {task_id}"))),
            )
                .into_response();
        }
    };

    let stream = ReaderStream::new(file);
    let body = axum::body::Body::from_stream(stream);

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{task_id}.zip\""),
            ),
        ],
        body,
    )
        .into_response()
}
