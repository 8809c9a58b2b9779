//! Enhanced command - Run the four-step pipeline for one ticket.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use tracing::info;

use desk_agents::Ticket;
use desk_core::{EnhancedWorkflowContext, TicketAnalysis};

use super::{build_orchestrator, load_config, print_json, read_document, CliError};

#[derive(Args)]
pub struct EnhancedArgs {
    /// Ticket file (JSON or YAML)
    ticket: PathBuf,

    /// Channel of the conversation thread (defaults to the configured notification channel)
    #[arg(long)]
    channel: Option<String>,

    /// Conversation thread to continue
    #[arg(long)]
    thread_ts: Option<String>,

    /// Precomputed ticket analysis (JSON or YAML); skips the LLM call
    #[arg(long)]
    analysis: Option<PathBuf>,
}

pub async fn execute(args: EnhancedArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let channel = args
        .channel
        .unwrap_or_else(|| config.notification_channel.clone());
    let orchestrator = build_orchestrator(config)?;

    let ticket: Ticket = read_document(&args.ticket)?;
    let mut context = EnhancedWorkflowContext::new(ticket, channel);
    if let Some(thread_ts) = args.thread_ts {
        context = context.in_thread(thread_ts);
    }
    if let Some(path) = &args.analysis {
        context = context.with_analysis(read_document::<TicketAnalysis>(path)?);
    }

    info!(
        "Running enhanced pipeline for ticket {} in {}",
        context.ticket.id, context.channel
    );
    let result = orchestrator.execute_enhanced_workflow(context).await;
    print_json(&result)?;

    if !result.success {
        return Err(CliError::WorkflowFailed {
            failed: result.failed_steps.len(),
            total: result.completed_steps.len() + result.failed_steps.len(),
        }
        .into());
    }
    Ok(())
}
