//! Platform specialist agent for CMS and e-commerce platforms.
//!
//! Platform problems often surface as hosting symptoms. When the ticket
//! also carries infrastructure vocabulary the specialist hands over to the
//! infra role, once per run.

use async_trait::async_trait;

use crate::error::AgentResult;
use crate::roles::AgentRole;
use crate::signals::{self, Signal};
use crate::ticket::Ticket;
use crate::traits::{Agent, AgentContext, Analysis};

/// Platforms the specialist recognises by name.
const KNOWN_PLATFORMS: [&str; 5] = ["woocommerce", "wordpress", "shopify", "magento", "drupal"];

/// Platform specialist agent.
#[derive(Debug, Default)]
pub struct PlatformAgent;

impl PlatformAgent {
    pub fn new() -> Self {
        Self
    }

    /// First platform named in the text.
    pub fn detect_platform(&self, text: &str) -> Option<&'static str> {
        KNOWN_PLATFORMS.into_iter().find(|p| text.contains(p))
    }
}

#[async_trait]
impl Agent for PlatformAgent {
    fn role(&self) -> AgentRole {
        AgentRole::PlatformSpecialist
    }

    async fn analyze(&self, ticket: &Ticket, context: &AgentContext) -> AgentResult<Analysis> {
        let text = ticket.searchable_text();
        let platform = self.detect_platform(&text).unwrap_or("platform");
        let complexity = signals::estimate_complexity(&text);

        let analysis = Analysis::new(
            self.role(),
            format!("{} issue reviewed", platform),
            if platform == "platform" { 60 } else { 80 },
        )
        .with_action(format!("Check recent {} plugin and theme updates", platform))
        .with_action("Test with default theme and plugins disabled on staging")
        .with_complexity(complexity)
        .with_estimated_time(signals::effort_estimate(complexity));

        if Signal::Infrastructure.matches(&text) && !context.has_visited(AgentRole::Infra) {
            Ok(analysis
                .handoff_to(AgentRole::Infra)
                .with_reasoning("Symptoms point at the hosting layer"))
        } else {
            Ok(analysis.with_reasoning("Platform configuration issue"))
        }
    }

    fn capabilities(&self) -> Vec<&'static str> {
        vec!["cms", "ecommerce", "plugins"]
    }
}
