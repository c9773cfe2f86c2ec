//! Run metadata — the engine's per-run JSON document and what we do with it.
//!
//! - `MetadataDocument`: validated top-level document (`id` + `status`)
//! - `WorkflowMetadata` / `CallAttempt`: lenient nested view of calls
//! - `walk` / `flatten`: depth-first expansion of sub-workflows with lineage
//! - `TroubleshootReporter`: plain-text diagnosis of failed/unfinished calls

mod document;
mod troubleshoot;
mod walker;

pub use document::*;
pub use troubleshoot::{troubleshoot, ReportOptions, TroubleshootReporter};
pub use walker::{flatten, walk, FlattenedCall};
