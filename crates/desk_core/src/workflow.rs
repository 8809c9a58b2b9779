//! Per-run workflow state for ticket triage.
//!
//! A [`WorkflowState`] is created fresh for every run and mutated in place
//! by the state machine. Status only moves forward: once a run leaves
//! `InProgress` every mutator becomes a no-op.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use desk_agents::{AgentRole, Analysis, Ticket};

/// Workflow status.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    InProgress,
    Completed,
    Failed,
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkflowStatus::InProgress)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Why a run ended in `Failed`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// No agent is bound to the current role
    MissingAgent { role: AgentRole },
    /// The current agent's analysis call failed
    AgentInvocation { role: AgentRole, message: String },
    /// The run used up its iteration budget while still handing off
    BoundExceeded { iterations: u32 },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::MissingAgent { role } => write!(f, "no agent bound to role {}", role),
            FailureReason::AgentInvocation { role, message } => {
                write!(f, "agent {} failed: {}", role, message)
            }
            FailureReason::BoundExceeded { iterations } => {
                write!(f, "iteration bound reached after {} iterations", iterations)
            }
        }
    }
}

/// One transfer of responsibility between agents.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HandoffRecord {
    pub from: AgentRole,
    pub to: AgentRole,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Material collected during a run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowContext {
    pub ticket: Ticket,
    /// Analyses in invocation order
    pub insights: Vec<Analysis>,
    /// Actions recommended by the latest analysis
    pub recommendations: Vec<String>,
    /// Confidence of the latest analysis
    pub confidence: u8,
}

/// Mutable state of one triage run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowState {
    pub run_id: Uuid,
    pub ticket_id: String,
    current_agent: AgentRole,
    previous_agents: Vec<AgentRole>,
    pub context: WorkflowContext,
    status: WorkflowStatus,
    handoff_history: Vec<HandoffRecord>,
    iterations: u32,
    failure: Option<FailureReason>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowState {
    /// Fresh in-progress state for a ticket, owned by `entry`.
    pub fn new(ticket: Ticket, entry: AgentRole) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            ticket_id: ticket.id.clone(),
            current_agent: entry,
            previous_agents: Vec::new(),
            context: WorkflowContext {
                ticket,
                insights: Vec::new(),
                recommendations: Vec::new(),
                confidence: 0,
            },
            status: WorkflowStatus::InProgress,
            handoff_history: Vec::new(),
            iterations: 0,
            failure: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn current_agent(&self) -> AgentRole {
        self.current_agent
    }

    /// Roles that held the ticket before the current one, oldest first.
    pub fn previous_agents(&self) -> &[AgentRole] {
        &self.previous_agents
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn handoff_history(&self) -> &[HandoffRecord] {
        &self.handoff_history
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == WorkflowStatus::InProgress
    }

    /// Store an analysis and make it the run's latest voice.
    pub fn record_insight(&mut self, analysis: Analysis) {
        if !self.is_in_progress() {
            return;
        }
        self.context.recommendations = analysis.recommended_actions.clone();
        self.context.confidence = analysis.confidence;
        self.context.insights.push(analysis);
    }

    /// Count one loop iteration.
    pub fn tick(&mut self) {
        if self.is_in_progress() {
            self.iterations += 1;
        }
    }

    /// Transfer responsibility to `to`.
    ///
    /// Returns the appended record, or `None` when the run is already
    /// terminal or `to` is the current role.
    pub fn hand_off(&mut self, to: AgentRole, reason: impl Into<String>) -> Option<&HandoffRecord> {
        if !self.is_in_progress() || to == self.current_agent {
            return None;
        }
        let record = HandoffRecord {
            from: self.current_agent,
            to,
            reason: reason.into(),
            timestamp: Utc::now(),
        };
        self.previous_agents.push(self.current_agent);
        self.current_agent = to;
        self.handoff_history.push(record);
        self.handoff_history.last()
    }

    /// Move to `Completed`. No-op once terminal.
    pub fn complete(&mut self) -> bool {
        self.finish(WorkflowStatus::Completed, None)
    }

    /// Move to `Failed`. No-op once terminal.
    pub fn fail(&mut self, reason: FailureReason) -> bool {
        self.finish(WorkflowStatus::Failed, Some(reason))
    }

    fn finish(&mut self, status: WorkflowStatus, failure: Option<FailureReason>) -> bool {
        if !self.is_in_progress() {
            return false;
        }
        self.status = status;
        self.failure = failure;
        self.completed_at = Some(Utc::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> WorkflowState {
        WorkflowState::new(Ticket::new("T-1", "Printer on fire"), AgentRole::Coordinator)
    }

    #[test]
    fn test_new_state() {
        let state = state();
        assert_eq!(state.status(), WorkflowStatus::InProgress);
        assert_eq!(state.current_agent(), AgentRole::Coordinator);
        assert!(state.previous_agents().is_empty());
        assert!(state.handoff_history().is_empty());
        assert_eq!(state.ticket_id, "T-1");
    }

    #[test]
    fn test_hand_off_records_transition() {
        let mut state = state();
        let record = state.hand_off(AgentRole::Infra, "server error").cloned().unwrap();

        assert_eq!(record.from, AgentRole::Coordinator);
        assert_eq!(record.to, AgentRole::Infra);
        assert_eq!(state.current_agent(), AgentRole::Infra);
        assert_eq!(state.previous_agents(), &[AgentRole::Coordinator]);
        assert_eq!(state.handoff_history().len(), 1);
    }

    #[test]
    fn test_self_hand_off_is_ignored() {
        let mut state = state();
        assert!(state.hand_off(AgentRole::Coordinator, "again").is_none());
        assert!(state.handoff_history().is_empty());
    }

    #[test]
    fn test_status_only_moves_forward() {
        let mut state = state();
        assert!(state.complete());
        assert!(!state.fail(FailureReason::BoundExceeded { iterations: 5 }));
        assert_eq!(state.status(), WorkflowStatus::Completed);
        assert!(state.failure().is_none());

        state.tick();
        state.record_insight(Analysis::new(AgentRole::Tester, "late", 10));
        assert!(state.hand_off(AgentRole::Tester, "late").is_none());
        assert_eq!(state.iterations(), 0);
        assert!(state.context.insights.is_empty());
    }

    #[test]
    fn test_record_insight_tracks_latest() {
        let mut state = state();
        state.record_insight(
            Analysis::new(AgentRole::Coordinator, "first", 40).with_action("a"),
        );
        state.record_insight(
            Analysis::new(AgentRole::Coordinator, "second", 90).with_action("b"),
        );

        assert_eq!(state.context.insights.len(), 2);
        assert_eq!(state.context.recommendations, vec!["b".to_string()]);
        assert_eq!(state.context.confidence, 90);
    }

    #[test]
    fn test_failure_reason_display() {
        let reason = FailureReason::AgentInvocation {
            role: AgentRole::Tester,
            message: "boom".to_string(),
        };
        assert_eq!(reason.to_string(), "agent tester failed: boom");
    }
}
