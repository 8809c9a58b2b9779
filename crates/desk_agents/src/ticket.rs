//! Support ticket model.
//!
//! Tickets are owned by the external ticketing system; agents only read them.

use serde::{Deserialize, Serialize};

/// Ticket priority as reported by the ticketing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Normal => "normal",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A support request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_status() -> String {
    "new".to_string()
}

impl Ticket {
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            description: String::new(),
            priority: TicketPriority::default(),
            status: default_status(),
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: TicketPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Subject, description and tags joined and lowercased for keyword matching.
    pub fn searchable_text(&self) -> String {
        let mut text = format!("{}\n{}", self.subject, self.description);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_defaults_from_json() {
        let ticket: Ticket =
            serde_json::from_str(r#"{"id": "T-1", "subject": "Login broken"}"#).unwrap();
        assert_eq!(ticket.priority, TicketPriority::Normal);
        assert_eq!(ticket.status, "new");
        assert!(ticket.tags.is_empty());
    }

    #[test]
    fn test_searchable_text_includes_tags() {
        let ticket = Ticket::new("T-2", "Checkout FAILS")
            .with_description("Customers see an Error")
            .with_tag("WooCommerce");

        let text = ticket.searchable_text();
        assert!(text.contains("checkout fails"));
        assert!(text.contains("error"));
        assert!(text.contains("woocommerce"));
    }
}
