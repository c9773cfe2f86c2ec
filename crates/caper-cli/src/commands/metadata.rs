//! `caper metadata` — print one run's metadata, sub-workflows expanded.

use caper_core::registry::expect_single;
use caper_core::{CromwellRestApi, MetadataDocument, UriStore};

/// Resolve `patterns` to exactly one run and fetch its expanded metadata.
pub async fn fetch_single(
    api: &CromwellRestApi,
    patterns: &[String],
) -> Result<MetadataDocument, String> {
    let runs = api.find(patterns).await.map_err(|e| e.to_string())?;
    let run = expect_single(runs, patterns).map_err(|e| e.to_string())?;
    api.get_metadata(&run.id, true)
        .await
        .map_err(|e| e.to_string())
}

pub async fn run(
    api: &CromwellRestApi,
    patterns: &[String],
    write_on_workflow_root: bool,
) -> Result<(), String> {
    let doc = fetch_single(api, patterns).await?;
    println!("{}", doc.to_pretty_json());

    if write_on_workflow_root {
        let written = doc
            .write_on_workflow_root(&UriStore::new(), caper_core::metadata::DEFAULT_METADATA_BASENAME)
            .await
            .map_err(|e| e.to_string())?;
        if let Some(uri) = written {
            tracing::info!("Wrote metadata to {}", uri);
        }
    }
    Ok(())
}
