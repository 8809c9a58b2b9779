//! Analyst agent for reporting and data questions.

use async_trait::async_trait;

use crate::error::AgentResult;
use crate::roles::AgentRole;
use crate::signals::Signal;
use crate::ticket::Ticket;
use crate::traits::{Agent, AgentContext, Analysis, Complexity};

/// Analyst agent that answers reporting and analytics requests.
#[derive(Debug, Default)]
pub struct AnalystAgent;

impl AnalystAgent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent for AnalystAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Analyst
    }

    async fn analyze(&self, ticket: &Ticket, _context: &AgentContext) -> AgentResult<Analysis> {
        let text = ticket.searchable_text();
        let is_export = text.contains("export") || text.contains("csv");

        let mut analysis = Analysis::new(
            self.role(),
            format!("Data request review for ticket {}", ticket.id),
            if Signal::Data.matches(&text) { 75 } else { 55 },
        )
        .with_complexity(Complexity::Low)
        .with_action("Identify the report or dataset the customer refers to");

        if is_export {
            analysis = analysis.with_action("Generate the export and share a download link");
        } else {
            analysis = analysis.with_action("Walk the customer through the dashboard filters");
        }

        Ok(analysis.with_reasoning("Data requests are answered directly"))
    }

    fn capabilities(&self) -> Vec<&'static str> {
        vec!["reporting", "analytics"]
    }
}
