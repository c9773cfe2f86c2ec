//! Troubleshooting report for a run.
//!
//! Writes a plain-text diagnosis to any `std::io::Write` sink: the run's
//! failures object, then one block per unfinished or failed call attempt
//! (across all sub-workflows), with the contents of its stderr (and
//! optionally stdout) inlined when the file can be read.

use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;

use super::document::{MetadataDocument, WorkflowStatus};
use super::walker::{flatten, FlattenedCall};
use crate::storage::UriStore;

/// Knobs for a troubleshooting report.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Also report attempts that finished successfully (`Done`/`Succeeded`).
    pub show_completed: bool,
    /// Inline stdout contents along with stderr.
    pub show_stdout: bool,
    /// Upper bound for each stdout/stderr read. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
}

pub struct TroubleshootReporter {
    store: UriStore,
    options: ReportOptions,
}

impl TroubleshootReporter {
    pub fn new(store: UriStore, options: ReportOptions) -> Self {
        Self { store, options }
    }

    pub async fn report<W: Write>(&self, doc: &MetadataDocument, sink: &mut W) -> io::Result<()> {
        writeln!(
            sink,
            "* Started troubleshooting workflow: id={}, status={}",
            doc.id(),
            doc.status()
        )?;

        if doc.status() == &WorkflowStatus::Succeeded {
            writeln!(sink, "* Workflow ran successfully.")?;
            return Ok(());
        }

        if let Some(failures) = doc.failures() {
            let pretty =
                serde_json::to_string_pretty(failures).unwrap_or_else(|_| failures.to_string());
            writeln!(sink, "* Found failures JSON object.\n{}", pretty)?;
        }

        if doc.calls().is_none() {
            return Ok(());
        }

        writeln!(sink, "* Recursively finding failures in calls (tasks)...")?;

        for call in flatten(doc) {
            if !self.options.show_completed && call.attempt.is_completed() {
                continue;
            }
            write_call_block(sink, &call)?;

            if let Some(stderr) = call.attempt.stderr.as_deref() {
                if let Some(contents) = self.fetch(stderr).await {
                    writeln!(sink, "STDERR_CONTENTS=\n{}", contents)?;
                }
            }
            if self.options.show_stdout {
                if let Some(stdout) = call.attempt.stdout.as_deref() {
                    if let Some(contents) = self.fetch(stdout).await {
                        writeln!(sink, "STDOUT_CONTENTS=\n{}", contents)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Best-effort read of a task output file.
    async fn fetch(&self, uri: &str) -> Option<String> {
        let read = self.store.read_to_string_lossy(uri);
        let result = match self.options.fetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, read).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::info!("[Troubleshoot] Timed out reading {} after {:?}", uri, limit);
                    return None;
                }
            },
            None => read.await,
        };

        match result {
            Ok(contents) => Some(contents),
            Err(e) => {
                tracing::info!("[Troubleshoot] Skipping unreadable file {}: {}", uri, e);
                None
            }
        }
    }
}

/// Report on `doc` with a default store and no fetch timeout.
pub async fn troubleshoot<W: Write>(
    doc: &MetadataDocument,
    sink: &mut W,
    show_completed: bool,
    show_stdout: bool,
) -> io::Result<()> {
    let options = ReportOptions {
        show_completed,
        show_stdout,
        fetch_timeout: None,
    };
    TroubleshootReporter::new(UriStore::new(), options)
        .report(doc, sink)
        .await
}

fn write_call_block<W: Write>(sink: &mut W, call: &FlattenedCall<'_>) -> io::Result<()> {
    let attempt = call.attempt;
    let running = attempt.running_event();

    writeln!(
        sink,
        "\n==== NAME={}, STATUS={}, PARENT={}",
        call.call_name,
        or_dash(attempt.execution_status.as_deref()),
        call.parent_names(",")
    )?;
    writeln!(
        sink,
        "SHARD_IDX={}, RC={}, JOB_ID={}",
        or_dash(attempt.shard_index),
        or_dash(attempt.return_code),
        or_dash(attempt.job_id.as_deref())
    )?;
    writeln!(
        sink,
        "START={}, END={}",
        or_dash(running.and_then(|ev| ev.start_time.as_deref())),
        or_dash(running.and_then(|ev| ev.end_time.as_deref()))
    )?;
    writeln!(sink, "STDOUT={}", or_dash(attempt.stdout.as_deref()))?;
    writeln!(sink, "STDERR={}", or_dash(attempt.stderr.as_deref()))
}

fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
