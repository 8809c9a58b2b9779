//! Offline collaborators.
//!
//! Used when no LLM key or Slack token is configured, so the enhanced
//! pipeline still runs end to end from the command line.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::info;

use desk_agents::signals::{self, Signal};
use desk_agents::TicketPriority;
use desk_core::{
    AiTextGenerationService, IntegrationResult, MessageReceipt, MessagingService, TicketAnalysis,
    Urgency,
};

/// Classifies tickets from keyword signals.
///
/// Never recommends a role, leaving assignment to the pipeline's rules.
#[derive(Debug, Default)]
pub struct KeywordTicketAnalyzer;

impl KeywordTicketAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, ticket_text: &str) -> TicketAnalysis {
        let text = ticket_text.to_lowercase();
        let detected = signals::detect(&text);
        let has = |signal: Signal| detected.contains(&signal);

        let urgency = if has(Signal::Revenue) && has(Signal::Infrastructure) {
            Urgency::Critical
        } else if has(Signal::Infrastructure) || has(Signal::Revenue) {
            Urgency::High
        } else if has(Signal::Quality) {
            Urgency::Medium
        } else {
            Urgency::Low
        };

        let priority = match urgency {
            Urgency::Critical => Some(TicketPriority::Urgent),
            Urgency::High => Some(TicketPriority::High),
            _ => None,
        };

        let category = detected
            .iter()
            .find(|s| **s != Signal::Revenue)
            .map(|s| category_name(*s))
            .unwrap_or("general");

        let mut action_items = vec![format!("Review {} ticket", category)];
        if urgency == Urgency::Critical {
            action_items.push("Page the on-call engineer".to_string());
        }

        TicketAnalysis {
            category: Some(category.to_string()),
            urgency: Some(urgency),
            priority,
            recommended_role: None,
            action_items,
            confidence_score: Some((40 + 10 * detected.len()).min(80) as u8),
            complexity: Some(signals::estimate_complexity(&text)),
            estimated_resolution_hours: None,
            business_impact: None,
        }
    }
}

fn category_name(signal: Signal) -> &'static str {
    match signal {
        Signal::Platform => "platform",
        Signal::Infrastructure => "infrastructure",
        Signal::Quality => "quality",
        Signal::Implementation => "development",
        Signal::Data => "reporting",
        Signal::Revenue => "billing",
    }
}

#[async_trait]
impl AiTextGenerationService for KeywordTicketAnalyzer {
    async fn analyze_ticket(&self, ticket_text: &str) -> IntegrationResult<TicketAnalysis> {
        Ok(self.classify(ticket_text))
    }
}

/// Writes messages to the log instead of a chat service.
#[derive(Debug, Default)]
pub struct LogMessenger {
    sent: AtomicU64,
}

impl LogMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingService for LogMessenger {
    async fn send_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<String>,
    ) -> IntegrationResult<MessageReceipt> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        match &thread_ts {
            Some(ts) => info!("[{} thread {}] {}", channel, ts, text),
            None => info!("[{}] {}", channel, text),
        }
        Ok(MessageReceipt {
            channel: channel.to_string(),
            message_ts: Some(format!("local.{}", n)),
        })
    }
}
