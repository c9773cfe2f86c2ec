//! Core error type for the Caper client.
//!
//! `CaperError` is used throughout the core domain (metadata parsing, run
//! resolution, REST calls). Label lookups and stdout/stderr reads never
//! surface here: a missing label is `None` and an unreadable artifact is
//! skipped by the reporter.

use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum CaperError {
    #[error("Malformed metadata document: {0}")]
    MalformedDocument(String),

    #[error("Run registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No run matches query: {0}")]
    NoMatchingRun(String),

    #[error("Multiple runs ({count}) match query: {query}")]
    AmbiguousRuns { query: String, count: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
