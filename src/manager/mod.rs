//! Archive task lifecycle management
//!
//! The [`ArchiveManager`] owns every state transition and limit decision:
//! admission gating, partial-failure aggregation on the bulk path, per-call
//! error reporting on the incremental path, and exactly-once ZIP assembly
//! when a task completes. The store, fetcher and builder do no lifecycle
//! reasoning of their own.

use crate::bundle::ZipBuilder;
use crate::config::Config;
use crate::error::{Error, FetchError, Result, StoreError, TaskError};
use crate::fetcher::FileFetcher;
use crate::store::{InMemoryTaskStore, TaskStore};
use crate::types::{ArchiveTask, TaskId, TaskStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

/// Orchestrates task creation, incremental file addition and status queries
///
/// Cloning is cheap; all fields are shared behind `Arc`.
#[derive(Clone)]
pub struct ArchiveManager {
    store: Arc<dyn TaskStore>,
    fetcher: FileFetcher,
    builder: ZipBuilder,
    config: Arc<Config>,
    /// Per-task mutexes serializing the whole read-modify-write of
    /// `add_file`. Entries are dropped once a task reaches a terminal state.
    task_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ArchiveManager {
    /// Create a manager with a fresh in-memory store
    ///
    /// Creates the transient and archive directories up front so the first
    /// request does not pay for (or trip over) directory creation.
    pub async fn new(config: Config) -> Result<Self> {
        let store = Arc::new(InMemoryTaskStore::new(config.limits.task_ttl));
        Self::with_store(config, store).await
    }

    /// Create a manager over an injected store
    ///
    /// The store is constructor-injected so independent instances (and test
    /// doubles) can coexist; there is no process-wide registry.
    pub async fn with_store(config: Config, store: Arc<dyn TaskStore>) -> Result<Self> {
        tokio::fs::create_dir_all(&config.storage.temp_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create temp directory '{}': {}",
                        config.storage.temp_dir.display(),
                        e
                    ),
                ))
            })?;
        tokio::fs::create_dir_all(&config.storage.archives_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create archives directory '{}': {}",
                        config.storage.archives_dir.display(),
                        e
                    ),
                ))
            })?;

        let fetcher = FileFetcher::new(&config.fetch)?;
        let builder = ZipBuilder::new(
            config.storage.temp_dir.clone(),
            config.storage.archives_dir.clone(),
        );

        Ok(Self {
            store,
            fetcher,
            builder,
            config: Arc::new(config),
            task_locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Path of the ZIP artifact for a task id
    ///
    /// Purely derived from the id; valid whether or not the task record
    /// still exists in the store.
    pub fn archive_path(&self, task_id: &TaskId) -> std::path::PathBuf {
        self.builder.archive_path(task_id)
    }

    /// Create a task from a batch of URLs, driving it to a terminal state
    /// within this call
    ///
    /// Pre-flight gates (in order): the busy gate, then the file-count gate.
    /// After admission, each URL is processed independently — one input's
    /// failure never aborts its siblings. The call itself only fails on gate
    /// violations, store errors or cancellation; per-URL failures surface in
    /// the returned task's `errors` list.
    pub async fn create_with_urls(
        &self,
        cancel: &CancellationToken,
        urls: &[String],
    ) -> Result<ArchiveTask> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        self.admit(cancel).await?;

        let limit = self.config.limits.max_files_per_archive;
        if urls.len() > limit {
            return Err(Error::Task(TaskError::TooManyFiles {
                count: urls.len(),
                limit,
            }));
        }

        let id = TaskId::new();
        let mut task = ArchiveTask::new(id.clone(), TaskStatus::Building);

        for url in urls {
            match self.fetch_and_stash(&id, url).await {
                Ok(name) => task.push_file(name),
                Err(e) => task.push_error(url, failure_reason(&e)),
            }
        }

        if task.files.is_empty() {
            task.set_status(TaskStatus::Failed);
        } else {
            self.finish_build(&mut task).await;
        }

        self.store.save(cancel, task.clone()).await?;

        info!(
            task_id = %task.id,
            status = %task.status,
            total_urls = urls.len(),
            successful_files = task.files.len(),
            errors = task.errors.len(),
            "bulk task finished"
        );

        Ok(task)
    }

    /// Create an empty task for incremental building
    ///
    /// Subject to the same busy gate as the bulk path.
    pub async fn create_empty(&self, cancel: &CancellationToken) -> Result<ArchiveTask> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        self.admit(cancel).await?;

        let task = ArchiveTask::new(TaskId::new(), TaskStatus::Empty);
        self.store.save(cancel, task.clone()).await?;

        info!(task_id = %task.id, "empty task created");
        Ok(task)
    }

    /// Download one more file into an existing task
    ///
    /// Unlike the bulk path, failures here are reported synchronously to the
    /// caller instead of being folded into the task's `errors` list; the
    /// task is left unchanged by a failed attempt. Reaching the file limit
    /// triggers the build exactly as the bulk path does — a build failure at
    /// that point is recorded on the task, not returned as a call error,
    /// since the file itself was accepted.
    ///
    /// The whole read-modify-write runs under a per-task lock, so two
    /// concurrent calls on the same id cannot lose updates.
    pub async fn add_file(
        &self,
        cancel: &CancellationToken,
        task_id: &TaskId,
        url: &str,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let lock = self.task_lock(task_id).await;
        let _guard = lock.lock().await;

        let mut task = self.load_task(cancel, task_id).await?;

        match task.status {
            TaskStatus::Ready => {
                self.release_task_lock(task_id).await;
                return Err(Error::Task(TaskError::AlreadyReady {
                    id: task_id.to_string(),
                }));
            }
            TaskStatus::Failed => {
                self.release_task_lock(task_id).await;
                return Err(Error::Task(TaskError::AlreadyFailed {
                    id: task_id.to_string(),
                }));
            }
            TaskStatus::Empty | TaskStatus::Building => {}
        }

        let limit = self.config.limits.max_files_per_archive;
        if task.files.len() >= limit {
            return Err(Error::Task(TaskError::ArchiveFull {
                id: task_id.to_string(),
                limit,
            }));
        }

        let name = self.fetch_and_stash(task_id, url).await?;

        task.push_file(name.clone());
        if task.status == TaskStatus::Empty {
            task.set_status(TaskStatus::Building);
        }
        info!(
            task_id = %task_id,
            file = %name,
            status = %task.status,
            "file added to task"
        );

        if task.files.len() == limit {
            self.finish_build(&mut task).await;
        }

        let terminal = task.status.is_terminal();
        self.store.save(cancel, task).await?;

        if terminal {
            self.release_task_lock(task_id).await;
        }

        Ok(())
    }

    /// Look up a task's current state
    ///
    /// Pure read-through; never mutates the task.
    pub async fn get_status(
        &self,
        cancel: &CancellationToken,
        task_id: &TaskId,
    ) -> Result<ArchiveTask> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        self.load_task(cancel, task_id).await
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server runs concurrently with archive building and listens on the
    /// configured bind address.
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let manager = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(manager, config).await })
    }

    // ------------------------------------------------------------------
    // internals
    // ------------------------------------------------------------------

    /// Reject task creation when the in-progress limit is reached
    async fn admit(&self, cancel: &CancellationToken) -> Result<()> {
        let limit = self.config.limits.max_archives_in_process;
        let in_progress = self.store.count_in_progress(cancel).await?;
        if in_progress >= limit {
            return Err(Error::Task(TaskError::ServerBusy { limit }));
        }
        Ok(())
    }

    /// Fetch one URL and persist its bytes under the task's transient dir
    async fn fetch_and_stash(&self, task_id: &TaskId, url: &str) -> Result<String> {
        let fetched = self.fetcher.fetch(url).await?;
        self.builder
            .save_file(task_id, &fetched.name, &fetched.bytes)
            .await?;
        Ok(fetched.name)
    }

    /// Assemble the ZIP and settle the task into its terminal state
    ///
    /// Build success: `ready`, transients cleaned up best-effort (a cleanup
    /// failure is logged, never surfaced). Build failure: `failed` with a
    /// build entry appended; files already accepted stay listed.
    async fn finish_build(&self, task: &mut ArchiveTask) {
        match self.builder.build(&task.id, &task.files).await {
            Ok(path) => {
                task.set_status(TaskStatus::Ready);
                info!(task_id = %task.id, path = %path.display(), "archive built");

                if let Err(e) = self.builder.cleanup(&task.id).await {
                    warn!(task_id = %task.id, error = %e, "failed to clean up transient files");
                }
            }
            Err(e) => {
                error!(task_id = %task.id, error = %e, "archive build failed");
                task.errors.push(format!("archive build failed: {e}"));
                task.set_status(TaskStatus::Failed);
            }
        }
    }

    /// Load a task, translating the store's NotFound into the task-level one
    async fn load_task(&self, cancel: &CancellationToken, task_id: &TaskId) -> Result<ArchiveTask> {
        match self.store.get(cancel, task_id).await {
            Ok(task) => Ok(task),
            Err(Error::Store(StoreError::NotFound(_))) => Err(Error::Task(TaskError::NotFound {
                id: task_id.to_string(),
            })),
            Err(e) => Err(e),
        }
    }

    async fn task_lock(&self, task_id: &TaskId) -> Arc<Mutex<()>> {
        let mut locks = self.task_locks.lock().await;
        locks
            .entry(task_id.as_str().to_string())
            .or_default()
            .clone()
    }

    async fn release_task_lock(&self, task_id: &TaskId) {
        let mut locks = self.task_locks.lock().await;
        locks.remove(task_id.as_str());
    }
}

/// Short per-input failure description for the task's `errors` list
///
/// The URL is prepended by the caller, so the reason must not repeat it.
fn failure_reason(err: &Error) -> String {
    match err {
        Error::Fetch(FetchError::InvalidUrl { .. }) => "invalid file URL".to_string(),
        Error::Fetch(FetchError::Failed { reason, .. }) => format!("download failed: {reason}"),
        Error::Fetch(FetchError::UnsupportedType { content_type, .. }) => {
            format!("unsupported content type: {content_type}")
        }
        other => other.to_string(),
    }
}
