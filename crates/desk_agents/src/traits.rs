//! Core agent trait and types.
//!
//! Every role is served by one [`Agent`]. An agent is stateless: given a
//! ticket and the context accumulated so far it produces an [`Analysis`].
//! The workflow decides what happens next from the analysis alone.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentResult;
use crate::roles::AgentRole;
use crate::ticket::{Ticket, TicketPriority};

/// Highest confidence an analysis can carry.
pub const MAX_CONFIDENCE: u8 = 100;

/// Estimated effort class of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of one agent invocation.
///
/// Immutable once produced: the workflow stores it and never edits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Role that produced the analysis
    pub role: AgentRole,
    /// Human-readable findings
    pub text: String,
    /// Confidence in `0..=100`
    pub confidence: u8,
    /// Actions the agent recommends
    pub recommended_actions: Vec<String>,
    /// Role that should take over, if any
    pub next_role: Option<AgentRole>,
    /// Why the agent reached its conclusion or handed off
    pub reasoning: Option<String>,
    pub priority: Option<TicketPriority>,
    pub complexity: Option<Complexity>,
    /// Free-form effort estimate such as "2-4 hours"
    pub estimated_time: Option<String>,
}

impl Analysis {
    /// Create an analysis; confidence is clamped to `0..=100`.
    pub fn new(role: AgentRole, text: impl Into<String>, confidence: u8) -> Self {
        Self {
            role,
            text: text.into(),
            confidence: confidence.min(MAX_CONFIDENCE),
            recommended_actions: Vec::new(),
            next_role: None,
            reasoning: None,
            priority: None,
            complexity: None,
            estimated_time: None,
        }
    }

    /// Add a recommended action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.recommended_actions.push(action.into());
        self
    }

    /// Hint that another role should take over.
    pub fn handoff_to(mut self, role: AgentRole) -> Self {
        self.next_role = Some(role);
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_priority(mut self, priority: TicketPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn with_estimated_time(mut self, estimate: impl Into<String>) -> Self {
        self.estimated_time = Some(estimate.into());
        self
    }

    /// The next role, unless it names the producing role itself.
    ///
    /// A self-handoff means the agent is done, same as no hint.
    pub fn handoff_target(&self, current: AgentRole) -> Option<AgentRole> {
        self.next_role.filter(|next| *next != current)
    }
}

/// Context passed to an agent alongside the ticket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentContext {
    /// Analyses produced earlier in the same run, oldest first
    pub insights: Vec<Analysis>,
    /// Reason given by the agent that handed off, if any
    pub handoff_reason: Option<String>,
    /// Extra structured data supplied by the caller
    pub shared: HashMap<String, serde_json::Value>,
}

impl AgentContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_insights(mut self, insights: Vec<Analysis>) -> Self {
        self.insights = insights;
        self
    }

    pub fn with_handoff_reason(mut self, reason: impl Into<String>) -> Self {
        self.handoff_reason = Some(reason.into());
        self
    }

    /// Set shared data.
    pub fn set_shared<T: Serialize>(&mut self, key: impl Into<String>, value: &T) {
        if let Ok(json) = serde_json::to_value(value) {
            self.shared.insert(key.into(), json);
        }
    }

    /// Get shared data.
    pub fn get_shared<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.shared.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Most recent analysis, if any.
    pub fn latest(&self) -> Option<&Analysis> {
        self.insights.last()
    }

    /// Whether a role already contributed to this run.
    pub fn has_visited(&self, role: AgentRole) -> bool {
        self.insights.iter().any(|a| a.role == role)
    }
}

/// Core trait for all agents.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Get the role this agent serves.
    fn role(&self) -> AgentRole;

    /// Analyze a ticket.
    async fn analyze(&self, ticket: &Ticket, context: &AgentContext) -> AgentResult<Analysis>;

    /// Get the capabilities of this agent.
    fn capabilities(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_builder() {
        let analysis = Analysis::new(AgentRole::Coordinator, "Routing to infra", 75)
            .with_action("Check server logs")
            .handoff_to(AgentRole::Infra)
            .with_reasoning("Mentions 502 errors")
            .with_complexity(Complexity::Medium);

        assert_eq!(analysis.recommended_actions.len(), 1);
        assert_eq!(analysis.next_role, Some(AgentRole::Infra));
        assert_eq!(analysis.complexity, Some(Complexity::Medium));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let analysis = Analysis::new(AgentRole::Tester, "Overconfident", 250);
        assert_eq!(analysis.confidence, 100);
    }

    #[test]
    fn test_self_handoff_is_not_a_target() {
        let analysis =
            Analysis::new(AgentRole::Infra, "Still mine", 60).handoff_to(AgentRole::Infra);
        assert_eq!(analysis.handoff_target(AgentRole::Infra), None);

        let analysis =
            Analysis::new(AgentRole::Infra, "Over to QA", 60).handoff_to(AgentRole::Tester);
        assert_eq!(analysis.handoff_target(AgentRole::Infra), Some(AgentRole::Tester));
    }

    #[test]
    fn test_agent_context() {
        let mut ctx = AgentContext::new()
            .with_insights(vec![Analysis::new(AgentRole::Coordinator, "triaged", 70)]);
        ctx.set_shared("channel", &"#support".to_string());

        let channel: Option<String> = ctx.get_shared("channel");
        assert_eq!(channel, Some("#support".to_string()));
        assert!(ctx.has_visited(AgentRole::Coordinator));
        assert!(!ctx.has_visited(AgentRole::Tester));
        assert_eq!(ctx.latest().unwrap().confidence, 70);
    }
}
