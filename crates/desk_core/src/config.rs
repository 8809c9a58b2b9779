//! Orchestrator configuration.
//!
//! Loaded from TOML, then overridden from `DESKFLOW_*` environment
//! variables. Every field has a default, so an empty file is valid.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use desk_agents::AgentRole;

use crate::assignment::DEFAULT_ASSIGNMENT_CONFIDENCE;
use crate::error::{CoreError, CoreResult};

/// Iteration bound of the triage loop.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Channel used for team notifications.
pub const DEFAULT_NOTIFICATION_CHANNEL: &str = "#support";

pub const ENV_MAX_ITERATIONS: &str = "DESKFLOW_MAX_ITERATIONS";
pub const ENV_ASSIGNMENT_CONFIDENCE: &str = "DESKFLOW_ASSIGNMENT_CONFIDENCE";
pub const ENV_CHANNEL: &str = "DESKFLOW_CHANNEL";

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Maximum agent invocations per triage run
    pub max_iterations: u32,
    /// Placeholder confidence reported for pipeline assignments
    pub assignment_confidence: u8,
    /// Channel for team mentions
    pub notification_channel: String,
    /// Mention handle per role name, e.g. `infra = "@oncall"`
    pub mentions: BTreeMap<String, String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            assignment_confidence: DEFAULT_ASSIGNMENT_CONFIDENCE,
            notification_channel: DEFAULT_NOTIFICATION_CHANNEL.to_string(),
            mentions: BTreeMap::new(),
        }
    }
}

impl OrchestratorConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded orchestrator config from {:?}", path);
        Ok(config)
    }

    /// Parse from a TOML string.
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        toml::from_str(content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }

    /// Apply `DESKFLOW_*` overrides from the process environment.
    pub fn apply_env(self) -> CoreResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        if let Some(value) = lookup(ENV_MAX_ITERATIONS) {
            self.max_iterations = value.trim().parse().map_err(|_| {
                CoreError::Configuration(format!("{} must be a positive integer", ENV_MAX_ITERATIONS))
            })?;
        }
        if let Some(value) = lookup(ENV_ASSIGNMENT_CONFIDENCE) {
            self.assignment_confidence = value.trim().parse().map_err(|_| {
                CoreError::Configuration(format!("{} must be 0-100", ENV_ASSIGNMENT_CONFIDENCE))
            })?;
        }
        if let Some(value) = lookup(ENV_CHANNEL) {
            self.notification_channel = value;
        }
        Ok(self)
    }

    /// Reject settings the orchestrator cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_iterations == 0 {
            return Err(CoreError::Configuration(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.assignment_confidence > desk_agents::MAX_CONFIDENCE {
            return Err(CoreError::Configuration(format!(
                "assignment_confidence {} exceeds 100",
                self.assignment_confidence
            )));
        }
        if self.notification_channel.trim().is_empty() {
            return Err(CoreError::Configuration(
                "notification_channel must not be empty".to_string(),
            ));
        }
        self.mention_table().map(|_| ())
    }

    /// Mention handles keyed by role; unknown role names are an error.
    pub fn mention_table(&self) -> CoreResult<BTreeMap<AgentRole, String>> {
        let mut table: BTreeMap<AgentRole, String> = AgentRole::ALL
            .into_iter()
            .map(|role| (role, format!("@{}", role)))
            .collect();
        for (name, handle) in &self.mentions {
            let role: AgentRole = name.parse()?;
            table.insert(role, handle.clone());
        }
        Ok(table)
    }
}
