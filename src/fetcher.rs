//! Remote file retrieval with MIME validation
//!
//! A single bounded-time GET per URL, no retries. Classification is strict:
//! a URL either fails shape validation before any network I/O, fails the
//! transfer, or transfers fully and is then rejected on its declared content
//! type.

use crate::config::FetchConfig;
use crate::error::{Error, FetchError, Result};
use url::Url;

/// One successfully retrieved file
#[derive(Debug, Clone)]
pub struct FetchedFile {
    /// Name derived from the final path segment of the URL
    pub name: String,
    /// Declared content type, parameters stripped
    pub content_type: String,
    /// The full file body
    pub bytes: Vec<u8>,
}

/// HTTP file fetcher with an allow-list of declared content types
///
/// Holds one [`reqwest::Client`] configured with the overall download
/// timeout; cloning the fetcher shares the client's connection pool.
#[derive(Clone)]
pub struct FileFetcher {
    client: reqwest::Client,
    allowed_types: Vec<String>,
}

impl FileFetcher {
    /// Create a fetcher from the fetch configuration
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
                key: Some("http_timeout".into()),
            })?;

        Ok(Self {
            client,
            allowed_types: config.allowed_mime_types.clone(),
        })
    }

    /// Validate URL shape without touching the network
    ///
    /// Only absolute `http`/`https` URLs are accepted.
    pub fn validate_url(raw: &str) -> Result<Url> {
        let url = Url::parse(raw).map_err(|_| {
            Error::Fetch(FetchError::InvalidUrl {
                url: raw.to_string(),
            })
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(Error::Fetch(FetchError::InvalidUrl {
                url: raw.to_string(),
            })),
        }
    }

    /// Retrieve one file
    ///
    /// Performs a single GET bounded by the configured timeout. The body is
    /// read fully before the declared content type is checked, so rejection
    /// on type never happens on a partial transfer.
    pub async fn fetch(&self, raw_url: &str) -> Result<FetchedFile> {
        let url = Self::validate_url(raw_url)?;

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            Error::Fetch(FetchError::Failed {
                url: raw_url.to_string(),
                reason: e.to_string(),
            })
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(FetchError::Failed {
                url: raw_url.to_string(),
                reason: format!("HTTP status {}", status.as_u16()),
            }));
        }

        let content_type = normalize_content_type(
            response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
        );

        let bytes = response.bytes().await.map_err(|e| {
            Error::Fetch(FetchError::Failed {
                url: raw_url.to_string(),
                reason: e.to_string(),
            })
        })?;

        if !self.allowed_types.iter().any(|t| t == &content_type) {
            return Err(Error::Fetch(FetchError::UnsupportedType {
                url: raw_url.to_string(),
                content_type,
            }));
        }

        let name = suggested_name(&url);
        tracing::debug!(url = raw_url, name = %name, size = bytes.len(), "file fetched");

        Ok(FetchedFile {
            name,
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

/// Strip parameters (`; charset=...`) and surrounding whitespace from a
/// Content-Type header value. Matching stays case-sensitive.
fn normalize_content_type(raw: &str) -> String {
    raw.split(';').next().unwrap_or("").trim().to_string()
}

/// Derive a file name from the final non-empty path segment of the URL.
/// No content sniffing; URLs without a usable segment get a generic name.
fn suggested_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| "download".to_string())
}
