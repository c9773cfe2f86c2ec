//! `caper troubleshoot` (alias `debug`) — diagnose a run.
//!
//! The target is either a metadata JSON file/URI, or a run id/label pattern
//! that must match exactly one run.

use std::time::Duration;

use caper_core::{CromwellRestApi, MetadataDocument, ReportOptions, TroubleshootReporter, UriStore};

use super::metadata::fetch_single;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

pub async fn load_document(
    api: &CromwellRestApi,
    store: &UriStore,
    target: &str,
) -> Result<MetadataDocument, String> {
    if store.exists(target).await {
        tracing::debug!("Reading metadata from {}", target);
        return MetadataDocument::from_uri(store, target)
            .await
            .map_err(|e| e.to_string());
    }
    fetch_single(api, &[target.to_string()]).await
}

pub async fn run(
    api: &CromwellRestApi,
    target: &str,
    show_completed_task: bool,
    show_stdout: bool,
) -> Result<(), String> {
    let store = UriStore::new();
    let doc = load_document(api, &store, target).await?;

    let reporter = TroubleshootReporter::new(
        store,
        ReportOptions {
            show_completed: show_completed_task,
            show_stdout,
            fetch_timeout: Some(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)),
        },
    );
    let mut out = std::io::stdout();
    reporter
        .report(&doc, &mut out)
        .await
        .map_err(|e| format!("Failed to write report: {}", e))
}
