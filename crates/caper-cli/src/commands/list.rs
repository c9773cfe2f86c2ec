//! `caper list` — tabulate runs known to the engine.

use caper_core::{CromwellRestApi, RunSummary};

pub const DEFAULT_FORMAT: &str = "id,status,name,str_label,submission";

/// One column of the `list` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListField {
    Id,
    Status,
    Name,
    StrLabel,
    User,
    Submission,
    Start,
    End,
    ParentWorkflowId,
    /// Unknown key; kept so the column still shows up (as `-`).
    Unknown(String),
}

impl ListField {
    pub fn from_key(key: &str) -> Self {
        match key {
            "id" | "workflow_id" => Self::Id,
            "status" => Self::Status,
            "name" => Self::Name,
            "str_label" => Self::StrLabel,
            "user" => Self::User,
            "submission" => Self::Submission,
            "start" => Self::Start,
            "end" => Self::End,
            "parent_workflow_id" => Self::ParentWorkflowId,
            other => Self::Unknown(other.to_string()),
        }
    }

    fn value(&self, run: &RunSummary) -> Option<String> {
        match self {
            Self::Id => Some(run.id.clone()),
            Self::Status => run.status.as_ref().map(|s| s.to_string()),
            Self::Name => run.name.clone(),
            Self::StrLabel => run.label.clone(),
            Self::User => run.user.clone(),
            Self::Submission => run.submission.clone(),
            Self::Start => run.start.clone(),
            Self::End => run.end.clone(),
            Self::ParentWorkflowId => run.parent_workflow_id.clone(),
            Self::Unknown(_) => None,
        }
    }
}

/// A parsed `-f/--format` string: the header keys as typed, plus the fields.
#[derive(Debug, Clone)]
pub struct ListFormat {
    keys: Vec<String>,
    fields: Vec<ListField>,
}

impl ListFormat {
    pub fn parse(format: &str) -> Result<Self, String> {
        let keys: Vec<String> = format
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return Err(format!("Invalid list format: '{}'", format));
        }
        for key in &keys {
            if let ListField::Unknown(k) = ListField::from_key(key) {
                tracing::warn!("Unknown list field '{}', shown as '-'", k);
            }
        }
        let fields = keys.iter().map(|k| ListField::from_key(k)).collect();
        Ok(Self { keys, fields })
    }

    pub fn header(&self) -> String {
        self.keys.join("\t")
    }

    pub fn row(&self, run: &RunSummary) -> String {
        self.fields
            .iter()
            .map(|f| f.value(run).unwrap_or_else(|| "-".to_string()))
            .collect::<Vec<_>>()
            .join("\t")
    }

    pub fn render(&self, runs: &[RunSummary]) -> Vec<String> {
        let mut lines = Vec::with_capacity(runs.len() + 1);
        lines.push(self.header());
        lines.extend(runs.iter().map(|r| self.row(r)));
        lines
    }
}

/// Drop sub-workflows and/or runs submitted before `hide_before`.
pub fn filter_runs(
    runs: Vec<RunSummary>,
    hide_subworkflow: bool,
    hide_before: Option<&str>,
) -> Vec<RunSummary> {
    runs.into_iter()
        .filter(|r| !(hide_subworkflow && r.is_subworkflow()))
        .filter(|r| hide_before.map_or(true, |cutoff| !r.submitted_before(cutoff)))
        .collect()
}

pub async fn run(
    api: &CromwellRestApi,
    patterns: &[String],
    format: &str,
    hide_subworkflow: bool,
    hide_result_before: Option<&str>,
) -> Result<(), String> {
    let format = ListFormat::parse(format)?;
    let runs = api.find(patterns).await.map_err(|e| e.to_string())?;
    let runs = filter_runs(runs, hide_subworkflow, hide_result_before);

    for line in format.render(&runs) {
        println!("{}", line);
    }
    Ok(())
}
