//! Server heartbeat — a small file through which a running server shares its
//! `hostname:port` with clients.
//!
//! The client only trusts the file while it is fresh, i.e. its modification
//! time is within the heartbeat timeout. A stale, missing or unreadable file
//! means "no heartbeat" and the configured endpoint is used instead.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::CaperError;
use crate::storage::expand_home;

pub const DEFAULT_HEARTBEAT_FILE: &str = "~/.caper/default_server_heartbeat";
pub const DEFAULT_HEARTBEAT_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Clone)]
pub struct ServerHeartbeat {
    file: PathBuf,
    timeout: Duration,
}

impl ServerHeartbeat {
    pub fn new(file: impl AsRef<Path>, timeout: Duration) -> Self {
        let file = expand_home(&file.as_ref().to_string_lossy());
        Self { file, timeout }
    }

    /// Read `(hostname, port)` if the heartbeat file is fresh.
    pub fn read(&self) -> Option<(String, u16)> {
        match self.try_read() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::warn!(
                    "[Heartbeat] Failed to read heartbeat file {}: {}",
                    self.file.display(),
                    e
                );
                None
            }
        }
    }

    fn try_read(&self) -> Result<Option<(String, u16)>, CaperError> {
        let meta = match std::fs::metadata(&self.file) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("[Heartbeat] No heartbeat file at {}", self.file.display());
                return Ok(None);
            }
            Err(e) => return Err(CaperError::Config(e.to_string())),
        };

        let modified = meta
            .modified()
            .map_err(|e| CaperError::Config(e.to_string()))?;
        // mtime in the future (clock skew) counts as just written
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= self.timeout {
            tracing::debug!(
                "[Heartbeat] Ignoring stale heartbeat file {} (age {:?})",
                self.file.display(),
                age
            );
            return Ok(None);
        }

        let contents =
            std::fs::read_to_string(&self.file).map_err(|e| CaperError::Config(e.to_string()))?;
        parse_heartbeat(&contents).map(Some)
    }

    /// Write `hostname:port`, creating parent directories.
    pub fn write(&self, hostname: &str, port: u16) -> Result<(), CaperError> {
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CaperError::Config(e.to_string()))?;
        }
        std::fs::write(&self.file, format!("{}:{}", hostname, port))
            .map_err(|e| CaperError::Config(e.to_string()))
    }
}

/// Parse heartbeat contents of the form `hostname:port`.
pub fn parse_heartbeat(contents: &str) -> Result<(String, u16), CaperError> {
    let trimmed = contents.trim();
    let (host, port) = trimmed
        .rsplit_once(':')
        .ok_or_else(|| CaperError::Config(format!("expected hostname:port, got '{}'", trimmed)))?;
    if host.is_empty() {
        return Err(CaperError::Config(format!("empty hostname in '{}'", trimmed)));
    }
    let port = port
        .parse::<u16>()
        .map_err(|e| CaperError::Config(format!("invalid port in '{}': {}", trimmed, e)))?;
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_heartbeat() {
        assert_eq!(
            parse_heartbeat("node01:8000\n").unwrap(),
            ("node01".to_string(), 8000)
        );
        assert!(parse_heartbeat("node01").is_err());
        assert!(parse_heartbeat(":8000").is_err());
        assert!(parse_heartbeat("node01:http").is_err());
    }

    #[test]
    fn test_fresh_heartbeat_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let hb = ServerHeartbeat::new(
            dir.path().join("hb"),
            Duration::from_millis(DEFAULT_HEARTBEAT_TIMEOUT_MS),
        );
        hb.write("node07", 8123).unwrap();
        assert_eq!(hb.read(), Some(("node07".to_string(), 8123)));
    }

    #[test]
    fn test_stale_or_missing_heartbeat_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let stale = ServerHeartbeat::new(dir.path().join("hb"), Duration::ZERO);
        stale.write("node07", 8123).unwrap();
        assert_eq!(stale.read(), None);

        let missing = ServerHeartbeat::new(dir.path().join("nope"), Duration::from_secs(60));
        assert_eq!(missing.read(), None);
    }

    #[test]
    fn test_garbage_heartbeat_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hb");
        std::fs::write(&path, "not a heartbeat").unwrap();
        let hb = ServerHeartbeat::new(&path, Duration::from_secs(60));
        assert_eq!(hb.read(), None);
    }
}
