//! Collaborator contracts consumed by the workflow core.
//!
//! The core never talks HTTP itself. The enhanced pipeline reaches the
//! messaging and text-generation services through these traits; concrete
//! clients live in `desk_integrations`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use desk_agents::{AgentRole, Complexity, TicketPriority};

/// Result type alias for collaborator calls.
pub type IntegrationResult<T> = Result<T, IntegrationError>;

/// Errors raised by external collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrationError {
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("Request to {service} failed: {message}")]
    Request { service: String, message: String },

    #[error("{service} rejected the request: {message}")]
    Rejected { service: String, message: String },

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse { service: String, message: String },

    #[error("No conversation thread to continue")]
    MissingThread,
}

impl IntegrationError {
    pub fn request(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn rejected(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service: service.into(),
            message: message.into(),
        }
    }
}

/// How quickly a ticket needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Estimated effect of a ticket on the customer's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessImpact {
    Low,
    Medium,
    High,
}

/// Ticket classification produced by the text-generation service.
///
/// The derived fields (`complexity`, `estimated_resolution_hours`,
/// `business_impact`) are filled in by the enhanced pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketAnalysis {
    pub category: Option<String>,
    pub urgency: Option<Urgency>,
    pub priority: Option<TicketPriority>,
    pub recommended_role: Option<AgentRole>,
    pub action_items: Vec<String>,
    pub confidence_score: Option<u8>,
    pub complexity: Option<Complexity>,
    pub estimated_resolution_hours: Option<u32>,
    pub business_impact: Option<BusinessImpact>,
}

/// Delivery confirmation from the messaging service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceipt {
    pub channel: String,
    /// Identifier of the posted message, usable as a thread handle
    pub message_ts: Option<String>,
}

/// Chat delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Post `text` to `channel`, inside `thread_ts` when given.
    async fn send_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<String>,
    ) -> IntegrationResult<MessageReceipt>;
}

/// AI ticket classification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiTextGenerationService: Send + Sync {
    /// Classify raw ticket text.
    async fn analyze_ticket(&self, ticket_text: &str) -> IntegrationResult<TicketAnalysis>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_analysis_partial_json() {
        let analysis: TicketAnalysis = serde_json::from_str(
            r#"{"category": "billing", "urgency": "critical", "recommended_role": "infra"}"#,
        )
        .unwrap();

        assert_eq!(analysis.category.as_deref(), Some("billing"));
        assert_eq!(analysis.urgency, Some(Urgency::Critical));
        assert_eq!(analysis.recommended_role, Some(AgentRole::Infra));
        assert!(analysis.action_items.is_empty());
        assert!(analysis.business_impact.is_none());
    }

    #[test]
    fn test_urgency_ordering() {
        assert!(Urgency::Critical > Urgency::High);
        assert!(Urgency::Low < Urgency::Medium);
    }
}
