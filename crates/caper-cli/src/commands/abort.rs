//! `caper abort` / `caper unhold` — per-run actions on matching runs.

use caper_core::{CromwellRestApi, RunAction};

use super::print_json;

pub async fn abort(api: &CromwellRestApi, patterns: &[String]) -> Result<(), String> {
    let results = api.abort(patterns).await.map_err(|e| e.to_string())?;
    report(&results);
    Ok(())
}

pub async fn unhold(api: &CromwellRestApi, patterns: &[String]) -> Result<(), String> {
    let results = api.release_hold(patterns).await.map_err(|e| e.to_string())?;
    report(&results);
    Ok(())
}

/// Print the engine's response per run. A failure on one run does not stop
/// the others.
fn report(results: &[RunAction]) {
    if results.is_empty() {
        tracing::info!("No matching runs");
    }
    for action in results {
        match &action.outcome {
            Ok(response) => print_json(response),
            Err(e) => eprintln!("{}: {}", action.run.id, e),
        }
    }
}
