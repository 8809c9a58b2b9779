//! Agent assignment for the enhanced pipeline.
//!
//! A ticket goes to the role its analysis recommends. Without a
//! recommendation, [`AssignmentRule`]s are evaluated in order and the first
//! match wins; [`AgentRole::Coordinator`] catches everything else.

use serde::Serialize;

use desk_agents::{AgentRole, Analysis, Signal, Ticket};

use crate::ports::TicketAnalysis;

/// Placeholder confidence attached to every assignment.
///
/// This is a fixed value, not a calibrated score.
pub const DEFAULT_ASSIGNMENT_CONFIDENCE: u8 = 85;

/// Rule name reported when the analysis chose the role.
pub const RECOMMENDATION_RULE: &str = "analysis_recommendation";

/// Rule name reported when no rule matched.
pub const DEFAULT_RULE: &str = "default";

/// A content predicate paired with the role it selects.
#[derive(Clone, Copy)]
pub struct AssignmentRule {
    pub name: &'static str,
    pub role: AgentRole,
    predicate: fn(&str) -> bool,
}

impl AssignmentRule {
    pub const fn new(name: &'static str, role: AgentRole, predicate: fn(&str) -> bool) -> Self {
        Self {
            name,
            role,
            predicate,
        }
    }

    /// Evaluate against lowercased ticket text.
    pub fn matches(&self, text: &str) -> bool {
        (self.predicate)(text)
    }
}

impl std::fmt::Debug for AssignmentRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentRule")
            .field("name", &self.name)
            .field("role", &self.role)
            .finish()
    }
}

fn mentions_platform(text: &str) -> bool {
    Signal::Platform.matches(text)
}

fn mentions_infrastructure(text: &str) -> bool {
    Signal::Infrastructure.matches(text)
}

fn mentions_quality(text: &str) -> bool {
    Signal::Quality.matches(text)
}

fn mentions_implementation(text: &str) -> bool {
    Signal::Implementation.matches(text)
}

/// Fallback rules in strict precedence order.
pub const FALLBACK_RULES: [AssignmentRule; 4] = [
    AssignmentRule::new("platform", AgentRole::PlatformSpecialist, mentions_platform),
    AssignmentRule::new("infrastructure", AgentRole::Infra, mentions_infrastructure),
    AssignmentRule::new("quality", AgentRole::Tester, mentions_quality),
    AssignmentRule::new("implementation", AgentRole::Implementer, mentions_implementation),
];

/// The role chosen for a ticket and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleSelection {
    pub role: AgentRole,
    pub rule: &'static str,
}

/// Pick the role for a ticket.
pub fn select_role(ticket: &Ticket, analysis: Option<&TicketAnalysis>) -> RoleSelection {
    if let Some(role) = analysis.and_then(|a| a.recommended_role) {
        return RoleSelection {
            role,
            rule: RECOMMENDATION_RULE,
        };
    }

    let mut text = ticket.searchable_text();
    if let Some(category) = analysis.and_then(|a| a.category.as_deref()) {
        text.push(' ');
        text.push_str(&category.to_lowercase());
    }
    select_by_rules(&FALLBACK_RULES, &text)
}

/// First matching rule, or the coordinator.
pub fn select_by_rules(rules: &[AssignmentRule], text: &str) -> RoleSelection {
    rules
        .iter()
        .find(|rule| rule.matches(text))
        .map(|rule| RoleSelection {
            role: rule.role,
            rule: rule.name,
        })
        .unwrap_or(RoleSelection {
            role: AgentRole::Coordinator,
            rule: DEFAULT_RULE,
        })
}

/// Outcome of the assignment step.
#[derive(Debug, Clone, Serialize)]
pub struct AgentAssignment {
    pub role: AgentRole,
    pub rule: &'static str,
    /// Placeholder confidence; see [`DEFAULT_ASSIGNMENT_CONFIDENCE`]
    pub confidence: u8,
    pub analysis: Analysis,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(subject: &str) -> Ticket {
        Ticket::new("T-1", subject)
    }

    #[test]
    fn test_recommendation_wins() {
        let analysis = TicketAnalysis {
            recommended_role: Some(AgentRole::Analyst),
            ..Default::default()
        };
        let selection = select_role(&ticket("WordPress 500 error"), Some(&analysis));
        assert_eq!(selection.role, AgentRole::Analyst);
        assert_eq!(selection.rule, RECOMMENDATION_RULE);
    }

    #[test]
    fn test_rule_precedence() {
        let cases = [
            ("WordPress plugin crash with 500 error and a bug", AgentRole::PlatformSpecialist),
            ("Server error, looks like a bug", AgentRole::Infra),
            ("Bug in the new feature", AgentRole::Tester),
            ("Feature request: dark mode", AgentRole::Implementer),
            ("Thanks for the help!", AgentRole::Coordinator),
        ];
        for (subject, expected) in cases {
            assert_eq!(select_role(&ticket(subject), None).role, expected, "{}", subject);
        }
    }

    #[test]
    fn test_category_participates_in_matching() {
        let analysis = TicketAnalysis {
            category: Some("Hosting".to_string()),
            ..Default::default()
        };
        let selection = select_role(&ticket("Help please"), Some(&analysis));
        assert_eq!(selection.role, AgentRole::Infra);
        assert_eq!(selection.rule, "infrastructure");
    }

    #[test]
    fn test_custom_rule_order() {
        let rules = [FALLBACK_RULES[2], FALLBACK_RULES[1]];
        let selection = select_by_rules(&rules, "server bug");
        assert_eq!(selection.role, AgentRole::Tester);
    }

    #[test]
    fn test_default_rule() {
        let selection = select_by_rules(&FALLBACK_RULES, "hello");
        assert_eq!(selection.role, AgentRole::Coordinator);
        assert_eq!(selection.rule, DEFAULT_RULE);
    }
}
