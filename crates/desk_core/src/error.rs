//! Error types for the core module.

use thiserror::Error;

use desk_agents::AgentError;

use crate::ports::IntegrationError;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
///
/// Workflow outcomes are not errors: a run that fails or exhausts its
/// iteration bound still returns a terminal state. These variants cover
/// startup configuration and the collaborator faults that surface outside
/// a run.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Integration error: {0}")]
    Integration(#[from] IntegrationError),

    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Workflow timed out after {0} ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Whether the error should abort startup.
    pub fn is_configuration(&self) -> bool {
        match self {
            CoreError::Configuration(_) | CoreError::ConfigParse(_) => true,
            CoreError::Agent(e) => e.is_configuration(),
            _ => false,
        }
    }
}
