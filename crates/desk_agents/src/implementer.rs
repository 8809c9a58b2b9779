//! Implementer agent for code changes and feature work.
//!
//! The implementer sketches the change a ticket needs and hands the ticket
//! to the tester for verification, unless the tester already looked at it
//! in this run.

use async_trait::async_trait;

use crate::error::AgentResult;
use crate::roles::AgentRole;
use crate::signals::{self, Signal};
use crate::ticket::Ticket;
use crate::traits::{Agent, AgentContext, Analysis};

/// Implementer agent that plans code changes.
#[derive(Debug, Default)]
pub struct ImplementerAgent;

impl ImplementerAgent {
    pub fn new() -> Self {
        Self
    }

    /// Actions for the change described by the ticket text.
    pub fn plan_actions(&self, text: &str) -> Vec<String> {
        let mut actions = Vec::new();
        if Signal::Quality.matches(text) {
            actions.push("Locate the failing code path and write a fix".to_string());
        }
        if Signal::Implementation.matches(text) {
            actions.push("Draft the change and open a pull request".to_string());
        }
        if actions.is_empty() {
            actions.push("Clarify the requested change with the customer".to_string());
        }
        actions
    }
}

#[async_trait]
impl Agent for ImplementerAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Implementer
    }

    async fn analyze(&self, ticket: &Ticket, context: &AgentContext) -> AgentResult<Analysis> {
        let text = ticket.searchable_text();
        let complexity = signals::estimate_complexity(&text);

        let mut analysis = Analysis::new(
            self.role(),
            format!("Implementation plan for ticket {}", ticket.id),
            70,
        )
        .with_complexity(complexity)
        .with_estimated_time(signals::effort_estimate(complexity));

        for action in self.plan_actions(&text) {
            analysis = analysis.with_action(action);
        }

        if context.has_visited(AgentRole::Tester) {
            Ok(analysis.with_reasoning("Tester already reviewed this ticket"))
        } else {
            Ok(analysis
                .with_action("Hand over to QA for verification")
                .handoff_to(AgentRole::Tester)
                .with_reasoning("Code changes require verification"))
        }
    }

    fn capabilities(&self) -> Vec<&'static str> {
        vec!["code_changes", "feature_planning"]
    }
}
