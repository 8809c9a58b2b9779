//! DeskFlow CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Configuration error
//! - 3: Workflow failed
//! - 4: Timeout

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use desk_core::CoreError;

mod commands;

use commands::{Cli, CliError, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const CONFIG_ERROR: u8 = 2;
    pub const WORKFLOW_FAILED: u8 = 3;
    pub const TIMEOUT: u8 = 4;
}

const DEFAULT_LOG_FILTER: &str =
    "desk_cli=info,desk_core=info,desk_agents=info,desk_integrations=info,warn";
const VERBOSE_LOG_FILTER: &str =
    "desk_cli=debug,desk_core=debug,desk_agents=debug,desk_integrations=debug,warn";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let result = match cli.command {
        Commands::Process(args) => commands::process::execute(args, cli.config.as_deref()).await,
        Commands::Enhanced(args) => commands::enhanced::execute(args, cli.config.as_deref()).await,
        Commands::Roles(args) => commands::roles::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(verbose: bool, json: bool) {
    let default_filter = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = if verbose {
        EnvFilter::new(default_filter)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    };

    // Logs go to stderr so stdout stays valid JSON
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr)))
        .try_init();
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(CliError::WorkflowFailed { .. }) = cause.downcast_ref::<CliError>() {
            return ExitCodes::WORKFLOW_FAILED;
        }
        if let Some(core) = cause.downcast_ref::<CoreError>() {
            if matches!(core, CoreError::Timeout(_)) {
                return ExitCodes::TIMEOUT;
            }
            if core.is_configuration() {
                return ExitCodes::CONFIG_ERROR;
            }
        }
    }
    ExitCodes::GENERAL_ERROR
}
