//! Metadata domain types — the JSON document Cromwell returns for a run.
//!
//! The shape is dictated by the engine:
//!
//! ```json
//! {
//!   "id": "0c1f…",
//!   "status": "Failed",
//!   "workflowRoot": "/out/main/0c1f…",
//!   "failures": [ { "message": "…", "causedBy": [] } ],
//!   "calls": {
//!     "main.align": [ { "executionStatus": "Done", "shardIndex": 0, … } ],
//!     "main.sub":   [ { "subWorkflowMetadata": { "calls": { … } } } ]
//!   }
//! }
//! ```
//!
//! Only the top-level document must carry `id` and `status`. Nested
//! sub-workflow documents are diagnostic-only and every field is optional.

use std::fmt;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CaperError;
use crate::storage::{join_uri, UriStore};

/// Basename used when persisting metadata on a workflow's root directory.
pub const DEFAULT_METADATA_BASENAME: &str = "metadata.json";

/// Run status as reported by the engine.
///
/// Statuses outside the fixed vocabulary (e.g. `On Hold`) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowStatus {
    Submitted,
    Running,
    Succeeded,
    Failed,
    Aborting,
    Aborted,
    Other(String),
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &str {
        match self {
            WorkflowStatus::Submitted => "Submitted",
            WorkflowStatus::Running => "Running",
            WorkflowStatus::Succeeded => "Succeeded",
            WorkflowStatus::Failed => "Failed",
            WorkflowStatus::Aborting => "Aborting",
            WorkflowStatus::Aborted => "Aborted",
            WorkflowStatus::Other(s) => s,
        }
    }
}

impl From<String> for WorkflowStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Submitted" => WorkflowStatus::Submitted,
            "Running" => WorkflowStatus::Running,
            "Succeeded" => WorkflowStatus::Succeeded,
            "Failed" => WorkflowStatus::Failed,
            "Aborting" => WorkflowStatus::Aborting,
            "Aborted" => WorkflowStatus::Aborted,
            _ => WorkflowStatus::Other(s),
        }
    }
}

impl From<&str> for WorkflowStatus {
    fn from(s: &str) -> Self {
        WorkflowStatus::from(s.to_string())
    }
}

impl From<WorkflowStatus> for String {
    fn from(status: WorkflowStatus) -> Self {
        match status {
            WorkflowStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a call's `executionEvents` list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub end_time: Option<String>,
}

impl ExecutionEvent {
    /// Whether this event marks the phase where the job actually ran.
    pub fn is_running_phase(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| d.starts_with("Running"))
    }
}

/// One shard/retry attempt of a call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAttempt {
    #[serde(default, deserialize_with = "lenient")]
    pub execution_status: Option<String>,
    /// `-1` or absent when the call is not scattered.
    #[serde(default, deserialize_with = "lenient")]
    pub shard_index: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub return_code: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub job_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub stdout: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub stderr: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub execution_events: Option<Vec<ExecutionEvent>>,
    #[serde(default, deserialize_with = "lenient")]
    pub sub_workflow_metadata: Option<Box<WorkflowMetadata>>,
}

impl CallAttempt {
    /// A delegating attempt hands its work to a sub-workflow instead of
    /// running a job itself.
    pub fn is_delegating(&self) -> bool {
        self.sub_workflow_metadata.is_some()
    }

    /// `Done` and `Succeeded` both mean the attempt finished successfully.
    pub fn is_completed(&self) -> bool {
        matches!(self.execution_status.as_deref(), Some("Done") | Some("Succeeded"))
    }

    /// First execution event of the running phase, if any.
    pub fn running_event(&self) -> Option<&ExecutionEvent> {
        self.execution_events
            .as_deref()
            .and_then(|events| events.iter().find(|ev| ev.is_running_phase()))
    }
}

/// All attempts of a single call, keyed by the call's name.
#[derive(Debug, Clone)]
pub struct CallGroup {
    pub name: String,
    pub attempts: Vec<CallAttempt>,
}

/// Lenient view of a (sub-)workflow's metadata. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<WorkflowStatus>,
    #[serde(default, deserialize_with = "lenient")]
    pub workflow_root: Option<String>,
    #[serde(default)]
    pub failures: Option<Value>,
    /// Calls in the order the engine listed them.
    #[serde(default, deserialize_with = "deserialize_calls")]
    pub calls: Option<Vec<CallGroup>>,
}

/// Decode an optional field, reading a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::debug!("[Metadata] Ignoring field of unexpected shape: {}", e);
            Ok(None)
        }
    }
}

/// `calls` as an ordered list of groups. Attempts that are not objects are
/// skipped; a `calls` value that is not an object reads as absent.
fn deserialize_calls<'de, D>(deserializer: D) -> Result<Option<Vec<CallGroup>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(calls) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };

    let groups = calls
        .into_iter()
        .map(|(name, attempts)| {
            let attempts = match attempts {
                Value::Array(items) => items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value::<CallAttempt>(item).ok())
                    .collect(),
                _ => Vec::new(),
            };
            CallGroup { name, attempts }
        })
        .collect();
    Ok(Some(groups))
}

/// A run's full metadata as fetched from the engine.
///
/// Immutable once built. The raw JSON is kept alongside the typed view so the
/// document can be persisted exactly as the engine returned it.
#[derive(Debug, Clone)]
pub struct MetadataDocument {
    id: String,
    status: WorkflowStatus,
    tree: WorkflowMetadata,
    data: Value,
}

impl MetadataDocument {
    pub fn from_value(data: Value) -> Result<Self, CaperError> {
        if !data.is_object() {
            return Err(CaperError::MalformedDocument(
                "expected a JSON object".to_string(),
            ));
        }
        let id = required_str(&data, "id")?;
        let status = WorkflowStatus::from(required_str(&data, "status")?);
        let tree = WorkflowMetadata::deserialize(&data)
            .map_err(|e| CaperError::MalformedDocument(format!("run {}: {}", id, e)))?;

        Ok(Self {
            id,
            status,
            tree,
            data,
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CaperError> {
        let data: Value = serde_json::from_slice(bytes)
            .map_err(|e| CaperError::MalformedDocument(format!("invalid JSON: {}", e)))?;
        Self::from_value(data)
    }

    /// Load a metadata JSON file from a local path or URI.
    pub async fn from_uri(store: &UriStore, uri: &str) -> Result<Self, CaperError> {
        let bytes = store.read_bytes(uri).await?;
        Self::from_slice(&bytes)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> &WorkflowStatus {
        &self.status
    }

    pub fn workflow_root(&self) -> Option<&str> {
        self.tree.workflow_root.as_deref()
    }

    /// Failure descriptions; an empty list counts as none.
    pub fn failures(&self) -> Option<&Value> {
        self.tree
            .failures
            .as_ref()
            .filter(|f| !f.as_array().is_some_and(|arr| arr.is_empty()))
    }

    pub fn calls(&self) -> Option<&[CallGroup]> {
        self.tree.calls.as_deref()
    }

    pub fn tree(&self) -> &WorkflowMetadata {
        &self.tree
    }

    /// The raw JSON snapshot.
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.data).unwrap_or_else(|_| self.data.to_string())
    }

    /// Write the document to `<workflowRoot>/<basename>`.
    ///
    /// Returns the written URI, or `None` when the run has no root directory.
    pub async fn write_on_workflow_root(
        &self,
        store: &UriStore,
        basename: &str,
    ) -> Result<Option<String>, CaperError> {
        let Some(root) = self.workflow_root() else {
            tracing::warn!(
                "[Metadata] No workflowRoot for run {}, metadata file not written",
                self.id
            );
            return Ok(None);
        };

        let uri = join_uri(root, basename);
        store.write(&uri, self.to_pretty_json().as_bytes()).await?;
        tracing::info!("[Metadata] Wrote metadata file {}", uri);
        Ok(Some(uri))
    }
}

fn required_str(data: &Value, key: &str) -> Result<String, CaperError> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CaperError::MalformedDocument(format!("missing required field `{}`", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_document() {
        let doc = MetadataDocument::from_value(json!({
            "id": "wf-1",
            "status": "Running"
        }))
        .unwrap();
        assert_eq!(doc.id(), "wf-1");
        assert_eq!(doc.status(), &WorkflowStatus::Running);
        assert!(doc.calls().is_none());
        assert!(doc.failures().is_none());
        assert!(doc.workflow_root().is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        let err = MetadataDocument::from_value(json!({ "status": "Failed" })).unwrap_err();
        assert!(matches!(err, CaperError::MalformedDocument(msg) if msg.contains("`id`")));

        let err = MetadataDocument::from_value(json!({ "id": "wf-1" })).unwrap_err();
        assert!(matches!(err, CaperError::MalformedDocument(msg) if msg.contains("`status`")));

        assert!(MetadataDocument::from_value(json!([1, 2])).is_err());
        assert!(MetadataDocument::from_slice(b"{not json").is_err());
    }

    #[test]
    fn test_nested_document_tolerates_missing_fields() {
        let doc = MetadataDocument::from_value(json!({
            "id": "wf-1",
            "status": "Failed",
            "calls": {
                "main.sub": [ { "subWorkflowMetadata": { "calls": {} } } ]
            }
        }))
        .unwrap();
        let calls = doc.calls().unwrap();
        let sub = calls[0].attempts[0].sub_workflow_metadata.as_ref().unwrap();
        assert!(sub.id.is_none());
        assert!(sub.status.is_none());
        assert!(calls[0].attempts[0].is_delegating());
    }

    #[test]
    fn test_mistyped_optional_fields_read_as_absent() {
        let doc = MetadataDocument::from_value(json!({
            "id": "wf-1",
            "status": "Failed",
            "workflowRoot": 7,
            "calls": {
                "main.sub": [ { "subWorkflowMetadata": {
                    "status": 3,
                    "calls": { "sub.task": [ {
                        "executionStatus": "Failed",
                        "returnCode": "137",
                        "shardIndex": 0,
                        "executionEvents": "none"
                    }, 42 ] }
                } } ],
                "main.odd": "not a list"
            }
        }))
        .unwrap();

        assert!(doc.workflow_root().is_none());
        let calls = doc.calls().unwrap();
        let sub = calls[0].attempts[0].sub_workflow_metadata.as_ref().unwrap();
        assert!(sub.status.is_none());

        let task = &sub.calls.as_ref().unwrap()[0];
        assert_eq!(task.name, "sub.task");
        assert_eq!(task.attempts.len(), 1);
        assert_eq!(task.attempts[0].execution_status.as_deref(), Some("Failed"));
        assert_eq!(task.attempts[0].return_code, None);
        assert_eq!(task.attempts[0].shard_index, Some(0));
        assert!(task.attempts[0].execution_events.is_none());

        assert_eq!(calls[1].name, "main.odd");
        assert!(calls[1].attempts.is_empty());
    }

    #[test]
    fn test_calls_keep_engine_order() {
        let raw = r#"{
            "id": "wf-1",
            "status": "Failed",
            "calls": {
                "main.zeta": [ { "executionStatus": "Done" } ],
                "main.alpha": [ { "executionStatus": "Failed" } ],
                "main.mid": [ { "shardIndex": 0 }, { "shardIndex": 1 } ]
            }
        }"#;
        let doc = MetadataDocument::from_slice(raw.as_bytes()).unwrap();
        let names: Vec<&str> = doc.calls().unwrap().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["main.zeta", "main.alpha", "main.mid"]);
        assert_eq!(doc.calls().unwrap()[2].attempts.len(), 2);
    }

    #[test]
    fn test_status_vocabulary() {
        assert_eq!(WorkflowStatus::from("Aborting"), WorkflowStatus::Aborting);
        assert_eq!(
            WorkflowStatus::from("On Hold"),
            WorkflowStatus::Other("On Hold".to_string())
        );
        assert_eq!(WorkflowStatus::from("On Hold").to_string(), "On Hold");
    }

    #[test]
    fn test_call_attempt_helpers() {
        let attempt: CallAttempt = serde_json::from_value(json!({
            "executionStatus": "Succeeded",
            "shardIndex": -1,
            "executionEvents": [
                { "description": "PreparingJob", "startTime": "t0", "endTime": "t1" },
                { "description": "RunningJob", "startTime": "t2", "endTime": "t3" },
                { "description": "Running again", "startTime": "t4", "endTime": "t5" }
            ]
        }))
        .unwrap();
        assert!(attempt.is_completed());
        let ev = attempt.running_event().unwrap();
        assert_eq!(ev.start_time.as_deref(), Some("t2"));
        assert_eq!(ev.end_time.as_deref(), Some("t3"));
    }

    #[test]
    fn test_empty_failures_treated_as_absent() {
        let doc = MetadataDocument::from_value(json!({
            "id": "wf-1",
            "status": "Failed",
            "failures": []
        }))
        .unwrap();
        assert!(doc.failures().is_none());
    }

    #[tokio::test]
    async fn test_write_on_workflow_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("wf-1");
        let doc = MetadataDocument::from_value(json!({
            "id": "wf-1",
            "status": "Succeeded",
            "workflowRoot": root.to_str().unwrap()
        }))
        .unwrap();
        let store = UriStore::new();

        let written = doc
            .write_on_workflow_root(&store, DEFAULT_METADATA_BASENAME)
            .await
            .unwrap()
            .unwrap();
        let reloaded = MetadataDocument::from_uri(&store, &written).await.unwrap();
        assert_eq!(reloaded.id(), "wf-1");
        assert_eq!(reloaded.data(), doc.data());

        let rootless = MetadataDocument::from_value(json!({ "id": "wf-2", "status": "Failed" }))
            .unwrap();
        assert!(rootless
            .write_on_workflow_root(&store, DEFAULT_METADATA_BASENAME)
            .await
            .unwrap()
            .is_none());
    }
}
