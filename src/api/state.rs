//! Application state for the API server

use crate::{ArchiveManager, Config};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared application state accessible to all route handlers
///
/// Cloned per request (cheap Arc clones). The cancellation token is the
/// server's shutdown token; handlers pass it down so in-flight lifecycle
/// operations observe shutdown at their next operation boundary.
#[derive(Clone)]
pub struct AppState {
    /// The archive task lifecycle manager
    pub manager: Arc<ArchiveManager>,

    /// Configuration (read access)
    pub config: Arc<Config>,

    /// Cancellation token handed to every manager call
    pub cancel: CancellationToken,
}

impl AppState {
    /// Create a new AppState with a fresh cancellation token
    pub fn new(manager: Arc<ArchiveManager>, config: Arc<Config>) -> Self {
        Self {
            manager,
            config,
            cancel: CancellationToken::new(),
        }
    }
}
