//! Cromwell REST API client.
//!
//! Every run-targeted operation goes through `find`, which reads the run
//! registry once (labels included) and resolves the user's patterns locally.
//!
//! Endpoints used:
//!
//! ```text
//! GET  /api/workflows/v1/query?additionalQueryResultFields=labels&…
//! GET  /api/workflows/v1/{id}/metadata[?expandSubWorkflows=true]
//! GET  /api/workflows/v1/{id}/labels
//! POST /api/workflows/v1/{id}/abort
//! POST /api/workflows/v1/{id}/releaseHold
//! GET  /api/workflows/v1/backends
//! POST /api/workflows/v1                (multipart submission)
//! ```

use serde_json::{Map, Value};

use crate::config::ServerConfig;
use crate::error::CaperError;
use crate::metadata::MetadataDocument;
use crate::registry::{
    decode_snapshot, extract_reserved_label, resolve_runs, RunSummary, KEY_BACKEND,
    KEY_STR_LABEL, KEY_USER,
};
use crate::storage::UriStore;

const ENDPOINT_WORKFLOWS: &str = "/api/workflows/v1";
const ENDPOINT_QUERY: &str = "/api/workflows/v1/query";
const ENDPOINT_BACKENDS: &str = "/api/workflows/v1/backends";

/// A workflow submission, with file contents already loaded.
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub workflow_source: String,
    pub workflow_inputs: Option<String>,
    pub workflow_options: Option<String>,
    /// Zipped imports.
    pub workflow_dependencies: Option<Vec<u8>>,
    pub labels: Map<String, Value>,
    pub on_hold: bool,
}

/// Paths/URIs of the files making up a submission.
#[derive(Debug, Clone, Default)]
pub struct SubmitFiles {
    pub wdl: String,
    pub inputs: Option<String>,
    pub options: Option<String>,
    pub labels: Option<String>,
    pub imports: Option<String>,
}

impl SubmitRequest {
    /// Load every file of a submission through `store`.
    pub async fn load(store: &UriStore, files: &SubmitFiles) -> Result<Self, CaperError> {
        let workflow_source = store.read_to_string(&files.wdl).await?;

        let workflow_inputs = match &files.inputs {
            Some(uri) => Some(store.read_to_string(uri).await?),
            None => None,
        };
        let workflow_options = match &files.options {
            Some(uri) => Some(store.read_to_string(uri).await?),
            None => None,
        };
        let workflow_dependencies = match &files.imports {
            Some(uri) => Some(store.read_bytes(uri).await?),
            None => None,
        };
        let labels = match &files.labels {
            Some(uri) => {
                let raw = store.read_to_string(uri).await?;
                match serde_json::from_str::<Value>(&raw) {
                    Ok(Value::Object(map)) => map,
                    Ok(_) => {
                        return Err(CaperError::Config(format!(
                            "labels file {} is not a JSON object",
                            uri
                        )))
                    }
                    Err(e) => {
                        return Err(CaperError::Config(format!(
                            "labels file {} is not valid JSON: {}",
                            uri, e
                        )))
                    }
                }
            }
            None => Map::new(),
        };

        Ok(Self {
            workflow_source,
            workflow_inputs,
            workflow_options,
            workflow_dependencies,
            labels,
            on_hold: false,
        })
    }

    /// Add the reserved label keys. Values given here win over a custom
    /// labels file.
    pub fn with_reserved_labels(
        mut self,
        str_label: Option<&str>,
        user: Option<&str>,
        backend: Option<&str>,
    ) -> Self {
        for (key, value) in [(KEY_STR_LABEL, str_label), (KEY_USER, user), (KEY_BACKEND, backend)] {
            if let Some(v) = value {
                self.labels.insert(key.to_string(), Value::String(v.to_string()));
            }
        }
        self
    }

    fn into_form(self) -> reqwest::multipart::Form {
        let labels = Value::Object(self.labels).to_string();
        let mut form = reqwest::multipart::Form::new()
            .text("workflowSource", self.workflow_source)
            .text(
                "workflowInputs",
                self.workflow_inputs.unwrap_or_else(|| "{}".to_string()),
            )
            .text("labels", labels)
            .text("workflowOnHold", self.on_hold.to_string());

        if let Some(options) = self.workflow_options {
            form = form.text("workflowOptions", options);
        }
        if let Some(zip) = self.workflow_dependencies {
            form = form.part(
                "workflowDependencies",
                reqwest::multipart::Part::bytes(zip).file_name("imports.zip"),
            );
        }
        form
    }
}

/// Outcome of a per-run action (abort, release hold).
#[derive(Debug)]
pub struct RunAction {
    pub run: RunSummary,
    pub outcome: Result<Value, CaperError>,
}

pub struct CromwellRestApi {
    client: reqwest::Client,
    config: ServerConfig,
}

impl CromwellRestApi {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }

    /// Read the whole run registry (one request, labels attached).
    pub async fn query_runs(&self) -> Result<Vec<RunSummary>, CaperError> {
        let request = self.get(ENDPOINT_QUERY).query(&[
            ("additionalQueryResultFields", "labels"),
            ("additionalQueryResultFields", "parentWorkflowId"),
        ]);
        let body = self
            .send_json(request, ENDPOINT_QUERY)
            .await
            .map_err(|e| CaperError::RegistryUnavailable(e.to_string()))?;

        let results = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                CaperError::RegistryUnavailable("query response has no `results` array".to_string())
            })?;

        let runs = decode_snapshot(results);
        tracing::debug!("[RestApi] Registry lists {} run(s)", runs.len());
        Ok(runs)
    }

    /// Runs whose id or label matches any pattern; all runs if `patterns` is empty.
    pub async fn find(&self, patterns: &[String]) -> Result<Vec<RunSummary>, CaperError> {
        let snapshot = self.query_runs().await?;
        Ok(resolve_runs(&snapshot, patterns))
    }

    pub async fn get_metadata(
        &self,
        workflow_id: &str,
        expand_subworkflows: bool,
    ) -> Result<MetadataDocument, CaperError> {
        let endpoint = run_endpoint(workflow_id, "metadata");
        let mut request = self.get(&endpoint);
        if expand_subworkflows {
            request = request.query(&[("expandSubWorkflows", "true")]);
        }
        let body = self.send_json(request, &endpoint).await?;
        MetadataDocument::from_value(body)
    }

    /// Metadata for every run matching `patterns`, in registry order.
    pub async fn metadata(
        &self,
        patterns: &[String],
        expand_subworkflows: bool,
    ) -> Result<Vec<MetadataDocument>, CaperError> {
        let runs = self.find(patterns).await?;
        let mut docs = Vec::with_capacity(runs.len());
        for run in &runs {
            docs.push(self.get_metadata(&run.id, expand_subworkflows).await?);
        }
        Ok(docs)
    }

    /// The run's free-text label. Any failure reads as "no label".
    pub async fn get_label(&self, workflow_id: &str) -> Option<String> {
        let endpoint = run_endpoint(workflow_id, "labels");
        match self.send_json(self.get(&endpoint), &endpoint).await {
            Ok(body) => body
                .get("labels")
                .and_then(Value::as_object)
                .and_then(extract_reserved_label),
            Err(e) => {
                tracing::debug!("[RestApi] No label for {}: {}", workflow_id, e);
                None
            }
        }
    }

    pub async fn abort(&self, patterns: &[String]) -> Result<Vec<RunAction>, CaperError> {
        self.act_on_runs(patterns, "abort").await
    }

    pub async fn release_hold(&self, patterns: &[String]) -> Result<Vec<RunAction>, CaperError> {
        self.act_on_runs(patterns, "releaseHold").await
    }

    pub async fn default_backend(&self) -> Result<String, CaperError> {
        let body = self.send_json(self.get(ENDPOINT_BACKENDS), ENDPOINT_BACKENDS).await?;
        body.get("defaultBackend")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CaperError::Request("backends response has no `defaultBackend`".to_string()))
    }

    /// Submit a workflow. Returns the engine's response (`id`, `status`).
    pub async fn submit(&self, request: SubmitRequest) -> Result<Value, CaperError> {
        tracing::info!(
            "[RestApi] Submitting workflow to {} (hold: {})",
            self.config.base_url(),
            request.on_hold
        );
        let builder = self.post(ENDPOINT_WORKFLOWS).multipart(request.into_form());
        self.send_json(builder, ENDPOINT_WORKFLOWS).await
    }

    async fn act_on_runs(
        &self,
        patterns: &[String],
        action: &str,
    ) -> Result<Vec<RunAction>, CaperError> {
        let runs = self.find(patterns).await?;
        let mut results = Vec::with_capacity(runs.len());
        for run in runs {
            let endpoint = run_endpoint(&run.id, action);
            let outcome = self.send_json(self.post(&endpoint), &endpoint).await;
            match &outcome {
                Ok(_) => tracing::info!("[RestApi] {} {}", action, run.id),
                Err(e) => tracing::warn!("[RestApi] {} {} failed: {}", action, run.id, e),
            }
            results.push(RunAction { run, outcome });
        }
        Ok(results)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url(), endpoint)
    }

    fn get(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(self.url(endpoint)))
    }

    fn post(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(self.url(endpoint)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("accept", "application/json");
        match self.config.basic_auth() {
            Some((user, password)) => request.basic_auth(user, Some(password)),
            None => request,
        }
    }

    async fn send_json(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<Value, CaperError> {
        let response = request
            .send()
            .await
            .map_err(|e| CaperError::Request(format!("{}: {}", endpoint, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CaperError::Request(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(CaperError::Request(format!(
                "{} returned {}: {}",
                endpoint, status, text
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| CaperError::Request(format!("{}: invalid JSON response: {}", endpoint, e)))
    }
}

fn run_endpoint(workflow_id: &str, action: &str) -> String {
    format!("{}/{}/{}", ENDPOINT_WORKFLOWS, workflow_id, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_endpoint() {
        assert_eq!(
            run_endpoint("abc-123", "releaseHold"),
            "/api/workflows/v1/abc-123/releaseHold"
        );
    }

    #[test]
    fn test_reserved_labels_override_custom_file() {
        let mut labels = Map::new();
        labels.insert(KEY_STR_LABEL.to_string(), Value::String("from-file".into()));
        labels.insert("project".to_string(), Value::String("encode".into()));
        let request = SubmitRequest {
            labels,
            ..Default::default()
        }
        .with_reserved_labels(Some("from-cli"), Some("alice"), None);

        assert_eq!(request.labels[KEY_STR_LABEL], "from-cli");
        assert_eq!(request.labels[KEY_USER], "alice");
        assert_eq!(request.labels["project"], "encode");
        assert!(!request.labels.contains_key(KEY_BACKEND));
    }

    #[tokio::test]
    async fn test_load_submit_files() {
        let dir = tempfile::tempdir().unwrap();
        let wdl = dir.path().join("main.wdl");
        let labels = dir.path().join("labels.json");
        std::fs::write(&wdl, "workflow main {}").unwrap();
        std::fs::write(&labels, r#"{"project": "encode"}"#).unwrap();

        let files = SubmitFiles {
            wdl: wdl.to_str().unwrap().to_string(),
            labels: Some(labels.to_str().unwrap().to_string()),
            ..Default::default()
        };
        let request = SubmitRequest::load(&UriStore::new(), &files).await.unwrap();
        assert_eq!(request.workflow_source, "workflow main {}");
        assert!(request.workflow_inputs.is_none());
        assert_eq!(request.labels["project"], "encode");

        std::fs::write(&labels, "[1, 2]").unwrap();
        assert!(matches!(
            SubmitRequest::load(&UriStore::new(), &files).await,
            Err(CaperError::Config(_))
        ));
    }
}
