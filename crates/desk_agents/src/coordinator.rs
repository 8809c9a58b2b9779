//! Coordinator agent for ticket triage.
//!
//! The coordinator is the entry point of every triage run. It reads the
//! ticket, sets an initial priority and hands the ticket to the specialist
//! whose vocabulary the ticket uses. Tickets that match no specialist stay
//! with the coordinator and the run concludes.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{AgentError, AgentResult};
use crate::roles::AgentRole;
use crate::signals::{self, Signal};
use crate::ticket::{Ticket, TicketPriority};
use crate::traits::{Agent, AgentContext, Analysis};

/// Specialist routing in precedence order.
const ROUTES: [(Signal, AgentRole); 5] = [
    (Signal::Platform, AgentRole::PlatformSpecialist),
    (Signal::Infrastructure, AgentRole::Infra),
    (Signal::Quality, AgentRole::Tester),
    (Signal::Implementation, AgentRole::Implementer),
    (Signal::Data, AgentRole::Analyst),
];

/// Coordinator agent that triages and routes tickets.
#[derive(Debug, Default)]
pub struct CoordinatorAgent;

impl CoordinatorAgent {
    pub fn new() -> Self {
        Self
    }

    /// Pick the specialist for the given ticket text.
    pub fn route(&self, text: &str) -> Option<(Signal, AgentRole)> {
        ROUTES.into_iter().find(|(signal, _)| signal.matches(text))
    }

    /// Escalate tickets that hit the money path with a technical failure.
    pub fn triage_priority(&self, ticket: &Ticket, text: &str) -> TicketPriority {
        if Signal::Revenue.matches(text) && Signal::Infrastructure.matches(text) {
            TicketPriority::Urgent
        } else {
            ticket.priority
        }
    }

    fn confidence(&self, text: &str) -> u8 {
        let matched = signals::detect(text).len() as u8;
        if matched == 0 {
            50
        } else {
            (60 + matched.saturating_sub(1) * 10).min(90)
        }
    }
}

#[async_trait]
impl Agent for CoordinatorAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Coordinator
    }

    async fn analyze(&self, ticket: &Ticket, _context: &AgentContext) -> AgentResult<Analysis> {
        if ticket.subject.trim().is_empty() && ticket.description.trim().is_empty() {
            return Err(AgentError::invalid_input(
                self.role(),
                format!("ticket {} has neither subject nor description", ticket.id),
            ));
        }

        let text = ticket.searchable_text();
        let priority = self.triage_priority(ticket, &text);
        let complexity = signals::estimate_complexity(&text);

        let analysis = match self.route(&text) {
            Some((signal, role)) => {
                debug!("Coordinator routing ticket {} to {} ({:?})", ticket.id, role, signal);
                Analysis::new(
                    self.role(),
                    format!("Ticket triaged for the {} role", role),
                    self.confidence(&text),
                )
                .with_action(format!("Assign ticket to {}", role))
                .handoff_to(role)
                .with_reasoning(format!("Ticket matches {:?} keywords", signal))
            }
            None => Analysis::new(
                self.role(),
                "No specialist vocabulary found; handling as a general request",
                self.confidence(&text),
            )
            .with_action("Reply to the customer with next steps")
            .with_action("Ask for reproduction details if the issue persists")
            .with_reasoning("No routing signal matched"),
        };

        Ok(analysis
            .with_priority(priority)
            .with_complexity(complexity)
            .with_estimated_time(signals::effort_estimate(complexity)))
    }

    fn capabilities(&self) -> Vec<&'static str> {
        vec!["triage", "routing", "prioritization"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_platform_before_infra() {
        let agent = CoordinatorAgent::new();
        let ticket = Ticket::new("T-1", "WordPress plugin throws a 500 error");

        let analysis = agent.analyze(&ticket, &AgentContext::new()).await.unwrap();
        assert_eq!(analysis.next_role, Some(AgentRole::PlatformSpecialist));
    }

    #[tokio::test]
    async fn test_routes_infra() {
        let agent = CoordinatorAgent::new();
        let ticket = Ticket::new("T-2", "DNS timeout after migration");

        let analysis = agent.analyze(&ticket, &AgentContext::new()).await.unwrap();
        assert_eq!(analysis.next_role, Some(AgentRole::Infra));
    }

    #[tokio::test]
    async fn test_concludes_without_signal() {
        let agent = CoordinatorAgent::new();
        let ticket = Ticket::new("T-3", "How do I change my avatar?");

        let analysis = agent.analyze(&ticket, &AgentContext::new()).await.unwrap();
        assert_eq!(analysis.next_role, None);
        assert_eq!(analysis.confidence, 50);
        assert_eq!(analysis.recommended_actions.len(), 2);
    }

    #[tokio::test]
    async fn test_escalates_revenue_failures() {
        let agent = CoordinatorAgent::new();
        let ticket = Ticket::new("T-4", "Checkout error for all customers")
            .with_priority(TicketPriority::Normal);

        let analysis = agent.analyze(&ticket, &AgentContext::new()).await.unwrap();
        assert_eq!(analysis.priority, Some(TicketPriority::Urgent));
    }

    #[tokio::test]
    async fn test_rejects_empty_ticket() {
        let agent = CoordinatorAgent::new();
        let ticket = Ticket::new("T-5", "  ");

        let err = agent.analyze(&ticket, &AgentContext::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidInput { .. }));
    }
}
