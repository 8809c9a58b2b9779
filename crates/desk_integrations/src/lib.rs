//! # desk_integrations
//!
//! Concrete collaborators for the DeskFlow pipelines:
//!
//! - [`LlmAdapter`]: ticket classification through OpenAI or Anthropic
//! - [`SlackMessenger`]: thread updates and team mentions via the Slack Web API
//! - [`KeywordTicketAnalyzer`] and [`LogMessenger`]: offline stand-ins used
//!   when no credentials are configured

pub mod fallback;
pub mod llm;
pub mod slack;

use std::sync::Arc;

use tracing::info;

use desk_core::{AiTextGenerationService, MessagingService};

pub use fallback::{KeywordTicketAnalyzer, LogMessenger};
pub use llm::{parse_analysis, LlmAdapter, LlmProvider};
pub use slack::SlackMessenger;

/// LLM adapter when a key is configured, keyword analyzer otherwise.
pub fn ai_from_env() -> Arc<dyn AiTextGenerationService> {
    match LlmAdapter::from_env() {
        Ok(adapter) => {
            info!("Using {:?} model {} for ticket analysis", adapter.provider(), adapter.model());
            Arc::new(adapter)
        }
        Err(_) => {
            info!("No LLM key configured, using keyword analysis");
            Arc::new(KeywordTicketAnalyzer::new())
        }
    }
}

/// Slack when a bot token is configured, the log otherwise.
pub fn messaging_from_env() -> Arc<dyn MessagingService> {
    match SlackMessenger::from_env() {
        Ok(messenger) => {
            info!("Posting notifications to Slack");
            Arc::new(messenger)
        }
        Err(_) => {
            info!("No Slack token configured, notifications go to the log");
            Arc::new(LogMessenger::new())
        }
    }
}
