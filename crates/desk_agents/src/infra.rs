//! Infra agent for hosting, deployment and runtime failures.
//!
//! The infra agent classifies the failure and proposes an operational
//! response. It never hands off: infrastructure findings close the run.

use async_trait::async_trait;
use regex::Regex;

use crate::error::AgentResult;
use crate::roles::AgentRole;
use crate::signals::Signal;
use crate::ticket::{Ticket, TicketPriority};
use crate::traits::{Agent, AgentContext, Analysis, Complexity};

/// Infra agent for operational issues.
#[derive(Debug, Default)]
pub struct InfraAgent;

impl InfraAgent {
    pub fn new() -> Self {
        Self
    }

    /// HTTP status codes (4xx/5xx) quoted in the ticket.
    pub fn status_codes(&self, text: &str) -> Vec<u16> {
        let mut codes = Vec::new();
        if let Ok(re) = Regex::new(r"\b([45]\d{2})\b") {
            for cap in re.captures_iter(text) {
                if let Ok(code) = cap[1].parse::<u16>() {
                    if !codes.contains(&code) {
                        codes.push(code);
                    }
                }
            }
        }
        codes
    }

    fn actions_for(&self, text: &str, codes: &[u16]) -> Vec<String> {
        let mut actions = Vec::new();
        if codes.iter().any(|c| *c >= 500) {
            actions.push("Inspect application and proxy logs around the failing requests".to_string());
        }
        if text.contains("dns") || text.contains("ssl") || text.contains("certificate") {
            actions.push("Verify DNS records and certificate validity".to_string());
        }
        if text.contains("deploy") {
            actions.push("Compare the last deployment against the previous release".to_string());
        }
        if text.contains("database") {
            actions.push("Check database connections and slow query log".to_string());
        }
        if actions.is_empty() {
            actions.push("Check host health and resource usage".to_string());
        }
        actions
    }
}

#[async_trait]
impl Agent for InfraAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Infra
    }

    async fn analyze(&self, ticket: &Ticket, _context: &AgentContext) -> AgentResult<Analysis> {
        let text = ticket.searchable_text();
        let codes = self.status_codes(&text);
        let outage = Signal::Revenue.matches(&text) || codes.iter().any(|c| *c >= 500);

        let mut analysis = Analysis::new(
            self.role(),
            if codes.is_empty() {
                "Operational issue without explicit status codes".to_string()
            } else {
                format!("Operational issue with status codes {:?}", codes)
            },
            if codes.is_empty() { 65 } else { 80 },
        )
        .with_complexity(if outage {
            Complexity::High
        } else {
            Complexity::Medium
        })
        .with_reasoning("Infrastructure findings conclude the workflow");

        if outage {
            analysis = analysis
                .with_priority(TicketPriority::Urgent)
                .with_estimated_time("within 4 hours");
        }

        for action in self.actions_for(&text, &codes) {
            analysis = analysis.with_action(action);
        }
        Ok(analysis)
    }

    fn capabilities(&self) -> Vec<&'static str> {
        vec!["hosting", "deployment", "incident_response"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let agent = InfraAgent::new();
        assert_eq!(agent.status_codes("got 502 then 504 then 502"), vec![502, 504]);
        assert!(agent.status_codes("order 12345").is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_urgent() {
        let agent = InfraAgent::new();
        let ticket = Ticket::new("T-1", "503 on every page after deploy");

        let analysis = agent.analyze(&ticket, &AgentContext::new()).await.unwrap();
        assert_eq!(analysis.next_role, None);
        assert_eq!(analysis.priority, Some(TicketPriority::Urgent));
        assert_eq!(analysis.confidence, 80);
        assert_eq!(analysis.recommended_actions.len(), 2);
    }

    #[tokio::test]
    async fn test_generic_operational_issue() {
        let agent = InfraAgent::new();
        let ticket = Ticket::new("T-2", "Hosting feels slow");

        let analysis = agent.analyze(&ticket, &AgentContext::new()).await.unwrap();
        assert_eq!(analysis.confidence, 65);
        assert_eq!(analysis.priority, None);
        assert_eq!(analysis.complexity, Some(Complexity::Medium));
    }
}
