//! Command-line definition of the `caper` binary.
//!
//! Server flags (`--ip`, `--port`, ...) are global and may be given before
//! or after the subcommand.

use clap::{Parser, Subcommand};

use crate::commands::{list::DEFAULT_FORMAT, ServerArgs};

/// Caper — Cromwell Assisted Pipeline ExecutoR
#[derive(Parser)]
#[command(name = "caper", version, about = "Caper — client for a Cromwell workflow server")]
pub struct Cli {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a WDL workflow
    Submit {
        /// WDL file (path or URI)
        wdl: String,
        /// Input JSON file
        #[arg(short, long)]
        inputs: Option<String>,
        /// Workflow options JSON file
        #[arg(short, long)]
        options: Option<String>,
        /// Custom labels JSON file
        #[arg(short, long)]
        labels: Option<String>,
        /// Zip file of imported WDLs
        #[arg(short = 'p', long)]
        imports: Option<String>,
        /// Free-text label, usable later to find this run
        #[arg(short, long)]
        str_label: Option<String>,
        /// Submitting user, recorded as a label
        #[arg(long, env = "USER")]
        user: Option<String>,
        /// Backend to run on (default: the server's default backend)
        #[arg(short, long)]
        backend: Option<String>,
        /// Put the workflow on hold after submission
        #[arg(long)]
        hold: bool,
        /// Prepare everything but do not submit
        #[arg(long)]
        dry_run: bool,
    },

    /// Abort runs matching id or label patterns
    Abort {
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Release held runs matching id or label patterns
    Unhold {
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// List runs (all of them when no pattern is given)
    List {
        patterns: Vec<String>,
        /// Comma-separated columns
        #[arg(short, long, default_value = DEFAULT_FORMAT)]
        format: String,
        /// Hide sub-workflows
        #[arg(long)]
        hide_subworkflow: bool,
        /// Hide runs submitted before this timestamp
        #[arg(long)]
        hide_result_before: Option<String>,
    },

    /// Print metadata JSON of the single run matching the patterns
    Metadata {
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Also write metadata.json to the run's workflow root
        #[arg(long)]
        write_on_workflow_root: bool,
    },

    /// Find failures in a run (metadata JSON file or id/label pattern)
    #[command(alias = "debug")]
    Troubleshoot {
        target: String,
        /// Also show tasks that completed successfully
        #[arg(long)]
        show_completed_task: bool,
        /// Also show stdout of tasks
        #[arg(long)]
        show_stdout: bool,
    },
}
