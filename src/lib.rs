//! # fetchzip
//!
//! Backend library for building downloadable ZIP archives from remote files.
//!
//! A client supplies up to a configured number of URLs — in one batch or one
//! at a time — and fetchzip downloads each file, validates its declared MIME
//! type, packs the successful downloads into a single ZIP on disk and serves
//! it over a small REST API. Partial failure is first-class: a task that got
//! some files and lost others finishes `ready` with the failures listed next
//! to the files.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Explicit state machine** - Tasks move `empty → building → ready|failed`
//!   and never backwards
//!
//! ## Quick Start
//!
//! ```no_run
//! use fetchzip::{ArchiveManager, Config};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let manager = Arc::new(ArchiveManager::new(config).await?);
//!
//!     // Serve the REST API until a termination signal arrives
//!     fetchzip::run_with_shutdown(manager).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Transient storage and ZIP assembly
pub mod bundle;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Remote file retrieval
pub mod fetcher;
/// Archive task lifecycle management
pub mod manager;
/// Concurrency-safe task storage
pub mod store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, FetchConfig, LimitsConfig, StorageConfig};
pub use error::{
    ApiError, BundleError, Error, ErrorDetail, FetchError, Result, StoreError, TaskError,
    ToHttpStatus,
};
pub use fetcher::{FetchedFile, FileFetcher};
pub use manager::ArchiveManager;
pub use store::{InMemoryTaskStore, TaskStore};
pub use types::{ArchiveTask, TaskId, TaskStatus};

use std::sync::Arc;

/// Run the API server with graceful signal handling.
///
/// Spawns the REST API server and waits for a termination signal, then
/// returns, dropping the server task.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(manager: Arc<ArchiveManager>) -> Result<()> {
    let server = manager.spawn_api_server();

    tokio::select! {
        result = server => {
            // The server ended on its own: surface bind errors and the like.
            result.map_err(|e| Error::ApiServerError(e.to_string()))?
        }
        _ = wait_for_signal() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
