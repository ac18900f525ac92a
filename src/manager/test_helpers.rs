//! Shared test helpers for creating ArchiveManager instances in tests.

use crate::config::Config;
use crate::manager::ArchiveManager;
use crate::store::InMemoryTaskStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a test ArchiveManager with scratch storage.
/// Returns the manager and the tempdir (which must be kept alive).
pub(crate) async fn test_manager() -> (ArchiveManager, tempfile::TempDir) {
    test_manager_with(|_| {}).await
}

/// Like [`test_manager`] but lets the caller tweak the config first.
pub(crate) async fn test_manager_with(
    customize: impl FnOnce(&mut Config),
) -> (ArchiveManager, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.storage.temp_dir = temp_dir.path().join("temp");
    config.storage.archives_dir = temp_dir.path().join("archives");
    config.fetch.http_timeout = Duration::from_secs(5);
    customize(&mut config);

    let manager = ArchiveManager::new(config).await.unwrap();
    (manager, temp_dir)
}

/// Like [`test_manager_with`] but exposes the store handle for direct
/// record manipulation in tests.
pub(crate) async fn test_manager_with_store(
    customize: impl FnOnce(&mut Config),
) -> (ArchiveManager, Arc<InMemoryTaskStore>, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.storage.temp_dir = temp_dir.path().join("temp");
    config.storage.archives_dir = temp_dir.path().join("archives");
    config.fetch.http_timeout = Duration::from_secs(5);
    customize(&mut config);

    let store = Arc::new(InMemoryTaskStore::new(config.limits.task_ttl));
    let manager = ArchiveManager::with_store(config, store.clone())
        .await
        .unwrap();
    (manager, store, temp_dir)
}

/// Mount a GET fixture returning `body` with the given content type.
pub(crate) async fn mount_file(
    server: &MockServer,
    route: &str,
    content_type: &str,
    body: &[u8],
) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", content_type)
                .set_body_bytes(body.to_vec()),
        )
        .mount(server)
        .await;
}

/// Mount a GET fixture serving a small PDF body.
pub(crate) async fn mount_pdf(server: &MockServer, route: &str) {
    mount_file(server, route, "application/pdf", b"%PDF-1.4 test body").await;
}
