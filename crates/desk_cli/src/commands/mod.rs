//! CLI command definitions.
//!
//! This module defines the command structure for the DeskFlow CLI and the
//! helpers the subcommands share: config loading, orchestrator wiring and
//! ticket file parsing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use thiserror::Error;
use walkdir::WalkDir;

use desk_agents::AgentRegistry;
use desk_core::{Orchestrator, OrchestratorConfig};

pub mod enhanced;
pub mod process;
pub mod roles;

/// DeskFlow - multi-agent support ticket orchestration
#[derive(Parser)]
#[command(name = "deskflow")]
#[command(version, about = "DeskFlow - multi-agent support ticket orchestration")]
#[command(long_about = r#"
DeskFlow routes support tickets through specialized agents and reports the
combined recommendation plus utilization metrics.

COMMANDS:
  process   → Run tickets through the agent handoff loop
  enhanced  → Run the four-step pipeline for a ticket in a chat thread
  roles     → List agent roles

ENVIRONMENT:
  OPENAI_API_KEY / ANTHROPIC_API_KEY  LLM ticket analysis (keyword fallback otherwise)
  DESKFLOW_LLM_MODEL                  Override the LLM model
  SLACK_BOT_TOKEN                     Slack notifications (logged otherwise)
  DESKFLOW_MAX_ITERATIONS, DESKFLOW_ASSIGNMENT_CONFIDENCE, DESKFLOW_CHANNEL

EXIT CODES:
  0 - Success
  1 - General error
  2 - Configuration error
  3 - Workflow failed
  4 - Timeout
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Orchestrator config file (TOML)
    #[arg(short, long, global = true, env = "DESKFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run tickets through the agent handoff loop
    Process(process::ProcessArgs),

    /// Run the enhanced pipeline for one ticket
    Enhanced(enhanced::EnhancedArgs),

    /// List agent roles
    Roles(roles::RolesArgs),
}

/// Outcomes the binary reports through its exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{failed} of {total} workflow(s) failed")]
    WorkflowFailed { failed: usize, total: usize },
}

/// Load the config file when given, then apply environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<OrchestratorConfig> {
    let config = match path {
        Some(path) => OrchestratorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => OrchestratorConfig::default(),
    };
    Ok(config.apply_env()?)
}

/// Orchestrator with the built-in agents and collaborators from the environment.
pub fn build_orchestrator(config: OrchestratorConfig) -> Result<Orchestrator> {
    let orchestrator = Orchestrator::new(
        AgentRegistry::standard(),
        desk_integrations::messaging_from_env(),
        desk_integrations::ai_from_env(),
        config,
    )?;
    Ok(orchestrator)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn is_document(path: &Path) -> bool {
    is_yaml(path) || path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Parse a JSON or YAML document, chosen by extension.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
    };
    Ok(value)
}

/// Expand directories into the ticket files they contain, sorted.
pub fn collect_ticket_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_document(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            anyhow::bail!("Ticket path not found: {}", path.display());
        }
    }
    Ok(files)
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
