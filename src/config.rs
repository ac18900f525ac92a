//! Configuration types for fetchzip

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// File fetching configuration (HTTP client behavior and content validation)
///
/// Groups settings that control how remote files are retrieved and which
/// declared content types are accepted. Used as a nested sub-config within
/// [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FetchConfig {
    /// Overall timeout for a single file download (default: 30 seconds)
    ///
    /// Covers the whole GET including body transfer; a download exceeding it
    /// is classified as a download failure for that URL.
    #[serde(default = "default_http_timeout", with = "duration_serde")]
    pub http_timeout: Duration,

    /// Allowed declared MIME types (exact match after parameter stripping)
    ///
    /// Matching is case-sensitive against the `Content-Type` header with any
    /// `; charset=...` style parameters removed and surrounding whitespace
    /// trimmed.
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            http_timeout: default_http_timeout(),
            allowed_mime_types: default_allowed_mime_types(),
        }
    }
}

/// Task admission and size limits
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LimitsConfig {
    /// Maximum number of tasks in `empty`/`building` status (default: 3)
    ///
    /// Once reached, new task creation is rejected with a busy error until an
    /// existing task reaches a terminal state or is reaped by TTL.
    #[serde(default = "default_max_archives_in_process")]
    pub max_archives_in_process: usize,

    /// Maximum number of files per archive (default: 3)
    #[serde(default = "default_max_files_per_archive")]
    pub max_files_per_archive: usize,

    /// TTL for stale in-progress tasks (default: 1 hour)
    ///
    /// An `empty`/`building` task whose last mutation is older than this is
    /// deleted during admission counting and stops occupying a slot.
    #[serde(default = "default_task_ttl", with = "duration_serde")]
    pub task_ttl: Duration,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_archives_in_process: default_max_archives_in_process(),
            max_files_per_archive: default_max_files_per_archive(),
            task_ttl: default_task_ttl(),
        }
    }
}

/// Storage locations for transient files and finished archives
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Scratch directory holding downloaded files before ZIP assembly
    /// (default: "./data/temp")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Directory holding finished ZIP archives (default: "./data/archives")
    ///
    /// Archives here survive process restarts independently of in-memory
    /// task records.
    #[serde(default = "default_archives_dir")]
    pub archives_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            archives_dir: default_archives_dir(),
        }
    }
}

/// Main configuration for fetchzip
///
/// Fields are organized into logical sub-configs:
/// - [`fetch`](FetchConfig) — HTTP client timeout, MIME allow-list
/// - [`limits`](LimitsConfig) — admission and per-archive size limits
/// - [`storage`](StorageConfig) — transient and archive directories
/// - [`server`](ServerIntegrationConfig) — REST API settings
///
/// All sub-config fields are flattened for serialization, so the JSON/TOML
/// format stays flat (no nesting).
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// File fetching settings
    #[serde(flatten)]
    pub fetch: FetchConfig,

    /// Admission and size limits
    #[serde(flatten)]
    pub limits: LimitsConfig,

    /// Storage locations
    #[serde(flatten)]
    pub storage: StorageConfig,

    /// API and external server integration
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

// Convenience accessors — keep call sites short without reaching through
// sub-config structs.
impl Config {
    /// Transient-storage root
    pub fn temp_dir(&self) -> &PathBuf {
        &self.storage.temp_dir
    }

    /// Archive-storage root
    pub fn archives_dir(&self) -> &PathBuf {
        &self.storage.archives_dir
    }
}

/// API and external server integration configuration
///
/// Groups settings for external access and control interfaces.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

// Default value functions
fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_allowed_mime_types() -> Vec<String> {
    vec![
        "application/pdf".into(),
        "image/jpeg".into(),
        "image/jpg".into(),
    ]
}

fn default_max_archives_in_process() -> usize {
    3
}

fn default_max_files_per_archive() -> usize {
    3
}

fn default_task_ttl() -> Duration {
    Duration::from_secs(60 * 60) // 1 hour
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./data/temp")
}

fn default_archives_dir() -> PathBuf {
    PathBuf::from("./data/archives")
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
