//! UriStore — URI-addressable read/write used for metadata files and
//! task stdout/stderr.
//!
//! Supported locations:
//! - plain local paths (a leading `~/` expands to the home directory)
//! - `file://` URIs
//! - `http://` / `https://` URIs (read only)
//!
//! Object-storage schemes (`gs://`, `s3://`) are recognised but reported as
//! `UnsupportedScheme`; callers that read best-effort treat that the same as
//! a missing file.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a URI points to, after scheme dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    Http(String),
    Unsupported(String),
}

impl Location {
    pub fn parse(uri: &str) -> Self {
        if let Some(rest) = uri.strip_prefix("file://") {
            return Location::Local(PathBuf::from(rest));
        }
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Location::Http(uri.to_string());
        }
        if let Some(idx) = uri.find("://") {
            return Location::Unsupported(uri[..idx].to_string());
        }
        Location::Local(expand_home(uri))
    }
}

/// Expand a leading `~` or `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Join a directory URI and a basename with exactly one `/`.
pub fn join_uri(root: &str, basename: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), basename)
}

/// Reads and writes files addressed by URI.
#[derive(Clone)]
pub struct UriStore {
    client: reqwest::Client,
}

impl UriStore {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(60))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, StorageError> {
        match Location::parse(uri) {
            Location::Local(path) => read_local(&path).await,
            Location::Http(url) => self.read_http(&url).await,
            Location::Unsupported(scheme) => Err(StorageError::UnsupportedScheme(scheme)),
        }
    }

    pub async fn read_to_string(&self, uri: &str) -> Result<String, StorageError> {
        let bytes = self.read_bytes(uri).await?;
        String::from_utf8(bytes).map_err(|e| StorageError::Io(format!("{}: {}", uri, e)))
    }

    /// Read a text artifact (task stdout/stderr). Invalid UTF-8 sequences
    /// are replaced with U+FFFD instead of failing the read.
    pub async fn read_to_string_lossy(&self, uri: &str) -> Result<String, StorageError> {
        let bytes = self.read_bytes(uri).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Whether the URI can be read. Unsupported schemes report `false`.
    pub async fn exists(&self, uri: &str) -> bool {
        match Location::parse(uri) {
            Location::Local(path) => tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            Location::Http(url) => match self.client.head(&url).send().await {
                Ok(resp) => resp.status().is_success(),
                Err(_) => false,
            },
            Location::Unsupported(_) => false,
        }
    }

    /// Write `contents` to a local URI, creating parent directories.
    pub async fn write(&self, uri: &str, contents: &[u8]) -> Result<(), StorageError> {
        match Location::parse(uri) {
            Location::Local(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await.map_err(|e| {
                            StorageError::Io(format!("{}: {}", parent.display(), e))
                        })?;
                    }
                }
                tokio::fs::write(&path, contents)
                    .await
                    .map_err(|e| StorageError::Io(format!("{}: {}", path.display(), e)))?;
                tracing::debug!("[Storage] Wrote {} bytes to {}", contents.len(), path.display());
                Ok(())
            }
            Location::Http(_) => Err(StorageError::UnsupportedScheme("http".to_string())),
            Location::Unsupported(scheme) => Err(StorageError::UnsupportedScheme(scheme)),
        }
    }

    async fn read_http(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StorageError::Http(format!("{}: {}", url, e)))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(url.to_string()));
        }
        if !resp.status().is_success() {
            return Err(StorageError::Http(format!("{} returned HTTP {}", url, resp.status())));
        }

        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| StorageError::Http(format!("Failed to read body of {}: {}", url, e)))
    }
}

impl Default for UriStore {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_local(path: &Path) -> Result<Vec<u8>, StorageError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StorageError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(StorageError::Io(format!("{}: {}", path.display(), e))),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("HTTP error: {0}")]
    Http(String),
}
