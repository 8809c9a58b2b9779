//! Process command - Run tickets through the agent handoff loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use futures::future::join_all;
use serde::Serialize;
use tracing::info;

use desk_agents::Ticket;
use desk_core::{CoreError, MultiAgentResponse, WorkflowMetrics};

use super::{build_orchestrator, collect_ticket_files, load_config, print_json, read_document, CliError};

#[derive(Args)]
pub struct ProcessArgs {
    /// Ticket files (JSON or YAML) or directories containing them
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Deadline per ticket, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Override the iteration bound
    #[arg(long)]
    max_iterations: Option<u32>,
}

#[derive(Serialize)]
struct ProcessReport {
    responses: Vec<MultiAgentResponse>,
    timed_out: Vec<String>,
    metrics: WorkflowMetrics,
}

pub async fn execute(args: ProcessArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    let orchestrator = build_orchestrator(config)?;

    let files = collect_ticket_files(&args.paths)?;
    let tickets = files
        .iter()
        .map(|path| read_document::<Ticket>(path))
        .collect::<Result<Vec<_>>>()?;
    info!("Processing {} ticket(s)", tickets.len());

    let deadline = args.timeout_secs.map(Duration::from_secs);
    let runs = tickets.into_iter().map(|ticket| {
        let orchestrator = &orchestrator;
        async move {
            let ticket_id = ticket.id.clone();
            let result = match deadline {
                Some(deadline) => orchestrator.process_ticket_within(ticket, deadline).await,
                None => Ok(orchestrator.process_ticket(ticket).await),
            };
            (ticket_id, result)
        }
    });

    let mut responses = Vec::new();
    let mut timed_out = Vec::new();
    let mut first_timeout = None;
    for (ticket_id, result) in join_all(runs).await {
        match result {
            Ok(response) => responses.push(response),
            Err(e @ CoreError::Timeout(_)) => {
                timed_out.push(ticket_id);
                first_timeout.get_or_insert(e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let total = responses.len() + timed_out.len();
    let failed = responses.iter().filter(|r| !r.is_success()).count();
    print_json(&ProcessReport {
        responses,
        timed_out,
        metrics: orchestrator.get_workflow_metrics(),
    })?;

    if let Some(e) = first_timeout {
        return Err(e.into());
    }
    if failed > 0 {
        return Err(CliError::WorkflowFailed { failed, total }.into());
    }
    Ok(())
}
