//! Run summaries as listed by the engine's query endpoint.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::metadata::WorkflowStatus;

/// Labels key holding the free-text label chosen at submission time.
pub const KEY_STR_LABEL: &str = "caper-str-label";
/// Labels key holding the submitting user.
pub const KEY_USER: &str = "caper-user";
/// Labels key holding the backend chosen at submission time.
pub const KEY_BACKEND: &str = "caper-backend";

/// One run known to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_workflow_id: Option<String>,
    /// Free-text label, already attached by the registry query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl RunSummary {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_subworkflow(&self) -> bool {
        self.parent_workflow_id.is_some()
    }

    /// Whether the run was submitted strictly before `cutoff`.
    ///
    /// Both sides are compared as RFC 3339 instants when they parse, and as
    /// plain strings otherwise. A run without a submission time is never
    /// considered older than the cutoff.
    pub fn submitted_before(&self, cutoff: &str) -> bool {
        let Some(submission) = self.submission.as_deref() else {
            return false;
        };
        match (parse_timestamp(submission), parse_timestamp(cutoff)) {
            (Some(s), Some(c)) => s < c,
            _ => submission < cutoff,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

/// Registry record exactly as the engine returns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<WorkflowStatus>,
    #[serde(default)]
    submission: Option<String>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    parent_workflow_id: Option<String>,
    #[serde(default)]
    labels: Option<Map<String, Value>>,
}

impl RunRecord {
    fn into_summary(self) -> Option<RunSummary> {
        let id = self.id?;
        let (label, user) = match &self.labels {
            Some(labels) => (extract_reserved_label(labels), label_value(labels, KEY_USER)),
            None => (None, None),
        };
        Some(RunSummary {
            id,
            name: self.name,
            status: self.status,
            submission: self.submission,
            start: self.start,
            end: self.end,
            parent_workflow_id: self.parent_workflow_id,
            label,
            user,
        })
    }
}

/// Read the free-text label out of the engine's labels map.
pub fn extract_reserved_label(labels: &Map<String, Value>) -> Option<String> {
    label_value(labels, KEY_STR_LABEL)
}

fn label_value(labels: &Map<String, Value>, key: &str) -> Option<String> {
    labels.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Decode the query endpoint's `results` array, keeping the engine's order.
///
/// Records without an `id`, or that fail to decode, are dropped.
pub fn decode_snapshot(results: &[Value]) -> Vec<RunSummary> {
    results
        .iter()
        .filter_map(|raw| match RunRecord::deserialize(raw) {
            Ok(record) => {
                let summary = record.into_summary();
                if summary.is_none() {
                    tracing::debug!("[Registry] Skipping run record without id: {}", raw);
                }
                summary
            }
            Err(e) => {
                tracing::warn!("[Registry] Skipping malformed run record {}: {}", raw, e);
                None
            }
        })
        .collect()
}
