//! Concurrency-safe task storage
//!
//! The store is the only shared mutable state in the crate. It is an explicit
//! object with constructor-injected lifetime so independent instances can
//! coexist in tests; nothing here is process-global.

use crate::error::{Error, Result, StoreError};
use crate::types::{ArchiveTask, TaskId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Keyed storage of archive task records
///
/// Every operation takes the caller's [`CancellationToken`] and fails with
/// [`Error::Cancelled`] without touching the map when the token has already
/// fired. Implementations must serialize mutations so concurrent saves on
/// the same id are strictly ordered.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Upsert a task by id. Fails with [`StoreError::EmptyId`] for an empty id.
    async fn save(&self, cancel: &CancellationToken, task: ArchiveTask) -> Result<()>;

    /// Fetch a task by id. Fails with [`StoreError::NotFound`] when absent.
    async fn get(&self, cancel: &CancellationToken, id: &TaskId) -> Result<ArchiveTask>;

    /// Delete a task by id. Fails with [`StoreError::NotFound`] when absent.
    async fn delete(&self, cancel: &CancellationToken, id: &TaskId) -> Result<()>;

    /// Count tasks in `empty`/`building` status
    ///
    /// As a side effect, any in-progress task whose `updated_at` is older
    /// than the store TTL is deleted before counting. This lazy reaping
    /// bounds the growth of stale tasks without a background sweep, at the
    /// cost of the count mutating the store.
    async fn count_in_progress(&self, cancel: &CancellationToken) -> Result<usize>;
}

/// In-memory [`TaskStore`] guarded by a single reader/writer lock
///
/// The lock is coarse (whole map, not per key): reads run concurrently with
/// each other and exclude writers. Task volume is bounded by the admission
/// limit, so finer-grained locking is not worth its complexity here.
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, ArchiveTask>>,
    ttl: chrono::Duration,
}

impl InMemoryTaskStore {
    /// Create an empty store with the given TTL for in-progress tasks
    pub fn new(ttl: Duration) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn save(&self, cancel: &CancellationToken, task: ArchiveTask) -> Result<()> {
        Self::check_cancelled(cancel)?;

        if task.id.is_empty() {
            return Err(Error::Store(StoreError::EmptyId));
        }

        let mut tasks = self.tasks.write().await;
        let id = task.id.as_str().to_string();
        tasks.insert(id.clone(), task);
        tracing::info!(task_id = %id, "task saved");

        Ok(())
    }

    async fn get(&self, cancel: &CancellationToken, id: &TaskId) -> Result<ArchiveTask> {
        Self::check_cancelled(cancel)?;

        if id.is_empty() {
            return Err(Error::Store(StoreError::EmptyId));
        }

        let tasks = self.tasks.read().await;
        tasks
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| Error::Store(StoreError::NotFound(id.as_str().to_string())))
    }

    async fn delete(&self, cancel: &CancellationToken, id: &TaskId) -> Result<()> {
        Self::check_cancelled(cancel)?;

        if id.is_empty() {
            return Err(Error::Store(StoreError::EmptyId));
        }

        let mut tasks = self.tasks.write().await;
        if tasks.remove(id.as_str()).is_none() {
            return Err(Error::Store(StoreError::NotFound(id.as_str().to_string())));
        }
        tracing::info!(task_id = %id, "task deleted");

        Ok(())
    }

    async fn count_in_progress(&self, cancel: &CancellationToken) -> Result<usize> {
        Self::check_cancelled(cancel)?;

        // Write lock: reaping deletes entries.
        let mut tasks = self.tasks.write().await;
        let now = Utc::now();
        let ttl = self.ttl;

        let stale: Vec<String> = tasks
            .iter()
            .filter(|(_, task)| task.status.is_in_progress() && now - task.updated_at > ttl)
            .map(|(id, _)| id.clone())
            .collect();

        for id in stale {
            tasks.remove(&id);
            tracing::info!(task_id = %id, "stale task reaped by TTL");
        }

        Ok(tasks
            .values()
            .filter(|task| task.status.is_in_progress())
            .count())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskStatus;

    fn store() -> InMemoryTaskStore {
        InMemoryTaskStore::new(Duration::from_secs(3600))
    }

    fn task(id: &str, status: TaskStatus) -> ArchiveTask {
        ArchiveTask::new(TaskId::from(id), status)
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let store = store();
        let cancel = CancellationToken::new();

        store
            .save(&cancel, task("t-1", TaskStatus::Empty))
            .await
            .unwrap();

        let loaded = store.get(&cancel, &TaskId::from("t-1")).await.unwrap();
        assert_eq!(loaded.id.as_str(), "t-1");
        assert_eq!(loaded.status, TaskStatus::Empty);
    }

    #[tokio::test]
    async fn save_is_an_upsert() {
        let store = store();
        let cancel = CancellationToken::new();

        store
            .save(&cancel, task("t-1", TaskStatus::Empty))
            .await
            .unwrap();

        let mut updated = task("t-1", TaskStatus::Building);
        updated.push_file("a.pdf");
        store.save(&cancel, updated).await.unwrap();

        let loaded = store.get(&cancel, &TaskId::from("t-1")).await.unwrap();
        assert_eq!(loaded.status, TaskStatus::Building);
        assert_eq!(loaded.files, vec!["a.pdf"]);
    }

    #[tokio::test]
    async fn save_rejects_empty_id() {
        let store = store();
        let cancel = CancellationToken::new();

        let err = store
            .save(&cancel, task("", TaskStatus::Empty))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::EmptyId)));
    }

    #[tokio::test]
    async fn get_and_delete_unknown_id_are_not_found() {
        let store = store();
        let cancel = CancellationToken::new();
        let id = TaskId::from("missing");

        assert!(matches!(
            store.get(&cancel, &id).await.unwrap_err(),
            Error::Store(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&cancel, &id).await.unwrap_err(),
            Error::Store(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_the_task() {
        let store = store();
        let cancel = CancellationToken::new();

        store
            .save(&cancel, task("t-1", TaskStatus::Ready))
            .await
            .unwrap();
        store.delete(&cancel, &TaskId::from("t-1")).await.unwrap();

        assert!(store.get(&cancel, &TaskId::from("t-1")).await.is_err());
    }

    #[tokio::test]
    async fn count_in_progress_counts_only_empty_and_building() {
        let store = store();
        let cancel = CancellationToken::new();

        store
            .save(&cancel, task("e", TaskStatus::Empty))
            .await
            .unwrap();
        store
            .save(&cancel, task("b", TaskStatus::Building))
            .await
            .unwrap();
        store
            .save(&cancel, task("r", TaskStatus::Ready))
            .await
            .unwrap();
        store
            .save(&cancel, task("f", TaskStatus::Failed))
            .await
            .unwrap();

        assert_eq!(store.count_in_progress(&cancel).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn count_in_progress_reaps_stale_tasks() {
        let store = InMemoryTaskStore::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let mut stale = task("stale", TaskStatus::Building);
        stale.updated_at = Utc::now() - chrono::Duration::seconds(120);
        store.save(&cancel, stale).await.unwrap();
        store
            .save(&cancel, task("fresh", TaskStatus::Building))
            .await
            .unwrap();

        assert_eq!(
            store.count_in_progress(&cancel).await.unwrap(),
            1,
            "stale task must be reaped before counting"
        );
        assert!(
            store.get(&cancel, &TaskId::from("stale")).await.is_err(),
            "reaped task must be gone from the store"
        );
        assert!(store.get(&cancel, &TaskId::from("fresh")).await.is_ok());
    }

    #[tokio::test]
    async fn count_in_progress_never_reaps_terminal_tasks() {
        let store = InMemoryTaskStore::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let mut old_ready = task("old-ready", TaskStatus::Ready);
        old_ready.updated_at = Utc::now() - chrono::Duration::hours(48);
        store.save(&cancel, old_ready).await.unwrap();

        assert_eq!(store.count_in_progress(&cancel).await.unwrap(), 0);
        assert!(
            store.get(&cancel, &TaskId::from("old-ready")).await.is_ok(),
            "terminal tasks stay queryable regardless of age"
        );
    }

    #[tokio::test]
    async fn cancelled_token_fails_every_operation_without_mutation() {
        let store = store();
        let live = CancellationToken::new();
        store
            .save(&live, task("t-1", TaskStatus::Empty))
            .await
            .unwrap();

        let cancelled = CancellationToken::new();
        cancelled.cancel();

        assert!(matches!(
            store
                .save(&cancelled, task("t-2", TaskStatus::Empty))
                .await
                .unwrap_err(),
            Error::Cancelled
        ));
        assert!(matches!(
            store
                .get(&cancelled, &TaskId::from("t-1"))
                .await
                .unwrap_err(),
            Error::Cancelled
        ));
        assert!(matches!(
            store
                .delete(&cancelled, &TaskId::from("t-1"))
                .await
                .unwrap_err(),
            Error::Cancelled
        ));
        assert!(matches!(
            store.count_in_progress(&cancelled).await.unwrap_err(),
            Error::Cancelled
        ));

        // The store is untouched: t-1 exists, t-2 was never written.
        assert!(store.get(&live, &TaskId::from("t-1")).await.is_ok());
        assert!(store.get(&live, &TaskId::from("t-2")).await.is_err());
    }

    #[tokio::test]
    async fn concurrent_saves_on_distinct_ids_all_land() {
        let store = std::sync::Arc::new(store());
        let cancel = CancellationToken::new();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                store
                    .save(&cancel, task(&format!("t-{i}"), TaskStatus::Building))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.count_in_progress(&cancel).await.unwrap(), 16);
    }
}
