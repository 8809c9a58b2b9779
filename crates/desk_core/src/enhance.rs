//! Derived estimates added to a ticket analysis.

use desk_agents::signals;
use desk_agents::{Complexity, Signal, Ticket, TicketPriority};

use crate::ports::{BusinessImpact, TicketAnalysis, Urgency};

/// Base resolution time per complexity class, in hours.
pub fn base_resolution_hours(complexity: Complexity) -> u32 {
    match complexity {
        Complexity::Low => 2,
        Complexity::Medium => 8,
        Complexity::High => 24,
    }
}

/// Fill in complexity, resolution time and business impact.
///
/// Values already present in the analysis are kept.
pub fn enhance_analysis(ticket: &Ticket, mut analysis: TicketAnalysis) -> TicketAnalysis {
    let text = ticket.searchable_text();

    let complexity = *analysis
        .complexity
        .get_or_insert_with(|| signals::estimate_complexity(&text));

    if analysis.estimated_resolution_hours.is_none() {
        let mut hours = base_resolution_hours(complexity);
        if analysis.urgency == Some(Urgency::Critical) {
            hours /= 2;
        }
        analysis.estimated_resolution_hours = Some(hours.max(1));
    }

    if analysis.business_impact.is_none() {
        let priority = analysis.priority.unwrap_or(ticket.priority);
        let impact = if priority == TicketPriority::Urgent
            || analysis.urgency == Some(Urgency::Critical)
            || Signal::Revenue.matches(&text)
        {
            BusinessImpact::High
        } else if priority == TicketPriority::High || analysis.urgency == Some(Urgency::High) {
            BusinessImpact::Medium
        } else {
            BusinessImpact::Low
        };
        analysis.business_impact = Some(impact);
    }

    analysis
}
