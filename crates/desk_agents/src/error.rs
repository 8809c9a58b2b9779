//! Error types for agents module.

use thiserror::Error;

use crate::roles::AgentRole;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur during agent operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The role set is misconfigured. Raised while building the registry or
    /// parsing role names and is fatal at startup.
    #[error("Agent configuration error: {0}")]
    Configuration(String),

    #[error("Unknown agent role: {0}")]
    UnknownRole(String),

    #[error("Agent invocation failed: {role} - {message}")]
    Invocation { role: AgentRole, message: String },

    #[error("Invalid input for agent {role}: {message}")]
    InvalidInput { role: AgentRole, message: String },
}

impl AgentError {
    /// Create an invocation error.
    pub fn invocation(role: AgentRole, message: impl Into<String>) -> Self {
        Self::Invocation {
            role,
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(role: AgentRole, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            role,
            message: message.into(),
        }
    }

    /// Whether this error belongs to the startup configuration class.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::UnknownRole(_))
    }
}
