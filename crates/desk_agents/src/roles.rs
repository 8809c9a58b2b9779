//! Agent role definitions and registry.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AgentError, AgentResult};
use crate::traits::Agent;

/// Support agent roles.
///
/// The set is closed: every role has exactly one agent in a complete
/// [`AgentRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Coordinator,
    Implementer,
    Infra,
    Tester,
    Analyst,
    PlatformSpecialist,
}

impl AgentRole {
    /// Number of roles in the closed set.
    pub const COUNT: usize = 6;

    /// All roles in declaration order.
    pub const ALL: [AgentRole; Self::COUNT] = [
        AgentRole::Coordinator,
        AgentRole::Implementer,
        AgentRole::Infra,
        AgentRole::Tester,
        AgentRole::Analyst,
        AgentRole::PlatformSpecialist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Coordinator => "coordinator",
            AgentRole::Implementer => "implementer",
            AgentRole::Infra => "infra",
            AgentRole::Tester => "tester",
            AgentRole::Analyst => "analyst",
            AgentRole::PlatformSpecialist => "platform_specialist",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentRole::Coordinator => "Triages incoming tickets and routes them to a specialist",
            AgentRole::Implementer => "Plans code changes and feature work",
            AgentRole::Infra => "Handles hosting, deployment and runtime errors",
            AgentRole::Tester => "Reproduces defects and plans verification",
            AgentRole::Analyst => "Investigates data, reporting and usage questions",
            AgentRole::PlatformSpecialist => "Handles CMS and e-commerce platform issues",
        }
    }

    /// Position of the role inside fixed-size role tables.
    pub fn index(&self) -> usize {
        match self {
            AgentRole::Coordinator => 0,
            AgentRole::Implementer => 1,
            AgentRole::Infra => 2,
            AgentRole::Tester => 3,
            AgentRole::Analyst => 4,
            AgentRole::PlatformSpecialist => 5,
        }
    }

    pub fn all() -> Vec<Self> {
        Self::ALL.to_vec()
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        AgentRole::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| AgentError::UnknownRole(s.to_string()))
    }
}

/// Registry holding one agent per role.
///
/// Lookups are a fixed-size table indexed by [`AgentRole::index`].
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: [Option<Arc<dyn Agent>>; AgentRole::COUNT],
}

impl AgentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a complete registry from the given agents.
    ///
    /// Fails when a role is bound twice or left unbound.
    pub fn from_agents(agents: impl IntoIterator<Item = Arc<dyn Agent>>) -> AgentResult<Self> {
        let mut registry = Self::new();
        for agent in agents {
            let role = agent.role();
            if registry.contains(role) {
                return Err(AgentError::Configuration(format!(
                    "role {} is bound to more than one agent",
                    role
                )));
            }
            registry.register(agent);
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Registry with the built-in deterministic agent for every role.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::CoordinatorAgent::new()));
        registry.register(Arc::new(crate::ImplementerAgent::new()));
        registry.register(Arc::new(crate::InfraAgent::new()));
        registry.register(Arc::new(crate::TesterAgent::new()));
        registry.register(Arc::new(crate::AnalystAgent::new()));
        registry.register(Arc::new(crate::PlatformAgent::new()));
        registry
    }

    /// Register an agent under its own role, replacing any previous binding.
    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        let role = agent.role();
        debug!("Registering agent for role: {}", role);
        self.agents[role.index()] = Some(agent);
    }

    /// Get the agent bound to a role.
    pub fn get(&self, role: AgentRole) -> Option<Arc<dyn Agent>> {
        self.agents[role.index()].clone()
    }

    pub fn contains(&self, role: AgentRole) -> bool {
        self.agents[role.index()].is_some()
    }

    /// Roles without a bound agent.
    pub fn missing_roles(&self) -> Vec<AgentRole> {
        AgentRole::ALL
            .into_iter()
            .filter(|role| !self.contains(*role))
            .collect()
    }

    /// Check that every role is bound.
    pub fn validate(&self) -> AgentResult<()> {
        let missing = self.missing_roles();
        if missing.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = missing.iter().map(|r| r.as_str()).collect();
        Err(AgentError::Configuration(format!(
            "no agent registered for role(s): {}",
            names.join(", ")
        )))
    }

    /// Number of bound roles.
    pub fn len(&self) -> usize {
        self.agents.iter().filter(|a| a.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound: Vec<&str> = AgentRole::ALL
            .iter()
            .filter(|r| self.contains(**r))
            .map(|r| r.as_str())
            .collect();
        f.debug_struct("AgentRegistry").field("roles", &bound).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedAgent;

    #[test]
    fn test_role_index_matches_table_order() {
        for (i, role) in AgentRole::ALL.iter().enumerate() {
            assert_eq!(role.index(), i);
        }
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("coordinator".parse::<AgentRole>().unwrap(), AgentRole::Coordinator);
        assert_eq!(
            "platform-specialist".parse::<AgentRole>().unwrap(),
            AgentRole::PlatformSpecialist
        );
        assert_eq!(" Infra ".parse::<AgentRole>().unwrap(), AgentRole::Infra);

        let err = "janitor".parse::<AgentRole>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_standard_registry_is_complete() {
        let registry = AgentRegistry::standard();
        assert!(registry.validate().is_ok());
        assert_eq!(registry.len(), AgentRole::COUNT);
        for role in AgentRole::ALL {
            assert_eq!(registry.get(role).unwrap().role(), role);
        }
    }

    #[test]
    fn test_from_agents_rejects_missing_role() {
        let agents: Vec<Arc<dyn Agent>> = vec![Arc::new(ScriptedAgent::concluding(
            AgentRole::Coordinator,
            70,
        ))];
        let err = AgentRegistry::from_agents(agents).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
        assert!(err.to_string().contains("implementer"));
    }

    #[test]
    fn test_from_agents_rejects_duplicate_role() {
        let mut agents: Vec<Arc<dyn Agent>> = AgentRole::ALL
            .iter()
            .map(|r| Arc::new(ScriptedAgent::concluding(*r, 50)) as Arc<dyn Agent>)
            .collect();
        agents.push(Arc::new(ScriptedAgent::concluding(AgentRole::Tester, 50)));

        let err = AgentRegistry::from_agents(agents).unwrap_err();
        assert!(err.to_string().contains("tester"));
    }

    #[test]
    fn test_partial_registry_lookup() {
        let mut registry = AgentRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(ScriptedAgent::concluding(AgentRole::Analyst, 40)));

        assert!(registry.get(AgentRole::Analyst).is_some());
        assert!(registry.get(AgentRole::Infra).is_none());
        assert_eq!(registry.missing_roles().len(), AgentRole::COUNT - 1);
    }
}
