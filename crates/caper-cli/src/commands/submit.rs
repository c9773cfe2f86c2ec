//! `caper submit` — submit a WDL workflow to the engine.

use serde_json::{json, Value};

use caper_core::{CromwellRestApi, SubmitFiles, SubmitRequest, UriStore};

/// Labels and flags that accompany a submission.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    pub str_label: Option<String>,
    pub user: Option<String>,
    pub backend: Option<String>,
    pub hold: bool,
    pub dry_run: bool,
}

/// Load the submission files and attach the reserved labels.
///
/// Without an explicit backend the engine's default backend is looked up,
/// except on a dry run where the engine is never contacted.
pub async fn prepare(
    api: &CromwellRestApi,
    files: &SubmitFiles,
    options: &SubmitOptions,
) -> Result<SubmitRequest, String> {
    let mut request = SubmitRequest::load(&UriStore::new(), files)
        .await
        .map_err(|e| e.to_string())?;
    request.on_hold = options.hold;

    let backend = match &options.backend {
        Some(b) => Some(b.clone()),
        None if options.dry_run => None,
        None => match api.default_backend().await {
            Ok(b) => Some(b),
            Err(e) => {
                tracing::warn!("Could not look up default backend: {}", e);
                None
            }
        },
    };

    Ok(request.with_reserved_labels(
        options.str_label.as_deref(),
        options.user.as_deref(),
        backend.as_deref(),
    ))
}

/// What a dry run prints instead of submitting.
pub fn describe(request: &SubmitRequest) -> Value {
    json!({
        "workflowSourceBytes": request.workflow_source.len(),
        "workflowInputs": request.workflow_inputs.is_some(),
        "workflowOptions": request.workflow_options.is_some(),
        "workflowDependencies": request.workflow_dependencies.is_some(),
        "labels": Value::Object(request.labels.clone()),
        "workflowOnHold": request.on_hold,
    })
}

pub async fn run(
    api: &CromwellRestApi,
    files: &SubmitFiles,
    options: &SubmitOptions,
) -> Result<(), String> {
    let request = prepare(api, files, options).await?;

    if options.dry_run {
        tracing::info!("Dry run, not submitting");
        super::print_json(&describe(&request));
        return Ok(());
    }

    let response = api.submit(request).await.map_err(|e| e.to_string())?;
    super::print_json(&response);
    Ok(())
}
