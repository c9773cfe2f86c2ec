//! Caper Core — client-side control layer for a Cromwell workflow engine.
//!
//! This crate holds everything the `caper` CLI needs that is not argument
//! parsing or terminal output:
//!
//! - `metadata`: the run metadata document, call-tree walking and the
//!   troubleshooting report
//! - `registry`: run summaries and glob-based run resolution
//! - `rest_api`: the engine's REST endpoints
//! - `storage`: URI-addressable reads/writes (local, `file://`, `http(s)://`)
//! - `heartbeat`: discovering a running server through its heartbeat file

pub mod config;
pub mod error;
pub mod heartbeat;
pub mod metadata;
pub mod registry;
pub mod rest_api;
pub mod storage;

// Convenience re-exports
pub use config::{ClientConfig, ServerConfig};
pub use error::CaperError;
pub use heartbeat::ServerHeartbeat;
pub use metadata::{MetadataDocument, ReportOptions, TroubleshootReporter};
pub use registry::{resolve_runs, RunSummary};
pub use rest_api::{CromwellRestApi, RunAction, SubmitFiles, SubmitRequest};
pub use storage::UriStore;
