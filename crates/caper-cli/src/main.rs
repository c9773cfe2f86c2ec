//! Caper CLI — command-line client for a Cromwell workflow server.
//!
//! Submits workflows and lists, aborts, releases and troubleshoots runs
//! selected by id or label patterns (`?` and `*` wildcards).

use clap::Parser;

use caper_cli::cli::{Cli, Commands};
use caper_cli::commands::{self, submit::SubmitOptions};
use caper_core::SubmitFiles;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caper_core=warn,caper_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let api = cli.server.connect();

    let result = match cli.command {
        Commands::Submit {
            wdl,
            inputs,
            options,
            labels,
            imports,
            str_label,
            user,
            backend,
            hold,
            dry_run,
        } => {
            let files = SubmitFiles {
                wdl,
                inputs,
                options,
                labels,
                imports,
            };
            let opts = SubmitOptions {
                str_label,
                user,
                backend,
                hold,
                dry_run,
            };
            commands::submit::run(&api, &files, &opts).await
        }
        Commands::Abort { patterns } => commands::abort::abort(&api, &patterns).await,
        Commands::Unhold { patterns } => commands::abort::unhold(&api, &patterns).await,
        Commands::List {
            patterns,
            format,
            hide_subworkflow,
            hide_result_before,
        } => {
            commands::list::run(
                &api,
                &patterns,
                &format,
                hide_subworkflow,
                hide_result_before.as_deref(),
            )
            .await
        }
        Commands::Metadata {
            patterns,
            write_on_workflow_root,
        } => commands::metadata::run(&api, &patterns, write_on_workflow_root).await,
        Commands::Troubleshoot {
            target,
            show_completed_task,
            show_stdout,
        } => commands::troubleshoot::run(&api, &target, show_completed_task, show_stdout).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
