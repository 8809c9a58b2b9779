//! Tester agent for reproduction and verification.

use async_trait::async_trait;

use crate::error::AgentResult;
use crate::roles::AgentRole;
use crate::signals::Signal;
use crate::ticket::Ticket;
use crate::traits::{Agent, AgentContext, Analysis};

/// Tester agent that plans reproduction and regression checks.
#[derive(Debug, Default)]
pub struct TesterAgent;

impl TesterAgent {
    pub fn new() -> Self {
        Self
    }

    /// Verification steps for the ticket.
    pub fn verification_steps(&self, ticket: &Ticket, text: &str) -> Vec<String> {
        let mut steps = vec![format!("Reproduce \"{}\" on staging", ticket.subject)];
        if Signal::Quality.matches(text) {
            steps.push("Add a regression test covering the reported defect".to_string());
        }
        if Signal::Revenue.matches(text) {
            steps.push("Run the checkout smoke suite".to_string());
        }
        steps.push("Confirm the fix with the customer".to_string());
        steps
    }
}

#[async_trait]
impl Agent for TesterAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Tester
    }

    async fn analyze(&self, ticket: &Ticket, context: &AgentContext) -> AgentResult<Analysis> {
        let text = ticket.searchable_text();
        // Verification after an implementer pass is better grounded.
        let confidence = if context.has_visited(AgentRole::Implementer) {
            85
        } else {
            75
        };

        let mut analysis = Analysis::new(
            self.role(),
            format!("Verification plan for ticket {}", ticket.id),
            confidence,
        )
        .with_reasoning("Verification concludes the workflow");

        for step in self.verification_steps(ticket, &text) {
            analysis = analysis.with_action(step);
        }
        Ok(analysis)
    }

    fn capabilities(&self) -> Vec<&'static str> {
        vec!["reproduction", "regression_testing"]
    }
}
