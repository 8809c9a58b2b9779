//! Caller-facing results built from terminal runs.

use serde::Serialize;

use desk_agents::{AgentRole, Analysis};

use crate::assignment::AgentAssignment;
use crate::pipeline::{PipelineRun, WorkflowStepResult};
use crate::ports::TicketAnalysis;
use crate::workflow::WorkflowState;

/// Result of a triage run.
#[derive(Debug, Clone, Serialize)]
pub struct MultiAgentResponse {
    pub ticket_id: String,
    pub workflow: WorkflowState,
    /// Actions of the most recent analysis only
    pub final_recommendations: Vec<String>,
    /// Rounded mean confidence over all analyses, 0 when none
    pub combined_confidence: u8,
    pub processing_time_ms: u64,
    /// `[current, ...previous]`, repeats included
    pub agents_involved: Vec<AgentRole>,
    pub handoff_count: usize,
}

impl MultiAgentResponse {
    pub fn is_success(&self) -> bool {
        self.workflow.status() == crate::workflow::WorkflowStatus::Completed
    }
}

/// Result of an enhanced pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedWorkflowResult {
    pub ticket_id: String,
    pub success: bool,
    pub completed_steps: Vec<WorkflowStepResult>,
    pub failed_steps: Vec<WorkflowStepResult>,
    pub analysis: Option<TicketAnalysis>,
    pub assignment: Option<AgentAssignment>,
    pub processing_time_ms: u64,
}

/// Builds responses from terminal runs.
pub struct ResponseAssembler;

impl ResponseAssembler {
    pub fn assemble(state: WorkflowState, processing_time_ms: u64) -> MultiAgentResponse {
        let insights = &state.context.insights;
        let final_recommendations = insights
            .last()
            .map(|a| a.recommended_actions.clone())
            .unwrap_or_default();
        let combined_confidence = combined_confidence(insights);

        let mut agents_involved = Vec::with_capacity(state.previous_agents().len() + 1);
        agents_involved.push(state.current_agent());
        agents_involved.extend_from_slice(state.previous_agents());

        MultiAgentResponse {
            ticket_id: state.ticket_id.clone(),
            handoff_count: state.handoff_history().len(),
            final_recommendations,
            combined_confidence,
            processing_time_ms,
            agents_involved,
            workflow: state,
        }
    }

    pub fn enhanced(
        ticket_id: impl Into<String>,
        run: PipelineRun,
        processing_time_ms: u64,
    ) -> EnhancedWorkflowResult {
        let (completed_steps, failed_steps): (Vec<_>, Vec<_>) =
            run.steps.into_iter().partition(|s| s.success);

        EnhancedWorkflowResult {
            ticket_id: ticket_id.into(),
            success: failed_steps.is_empty(),
            completed_steps,
            failed_steps,
            analysis: run.analysis,
            assignment: run.assignment,
            processing_time_ms,
        }
    }
}

/// Mean confidence rounded to the nearest integer.
pub fn combined_confidence(insights: &[Analysis]) -> u8 {
    if insights.is_empty() {
        return 0;
    }
    let total: u32 = insights.iter().map(|a| a.confidence as u32).sum();
    (total as f64 / insights.len() as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineStep;
    use desk_agents::Ticket;

    fn analysis(role: AgentRole, confidence: u8, action: &str) -> Analysis {
        Analysis::new(role, "text", confidence).with_action(action)
    }

    #[test]
    fn test_combined_confidence() {
        let insights = [
            analysis(AgentRole::Coordinator, 80, "a"),
            analysis(AgentRole::Infra, 60, "b"),
            analysis(AgentRole::Tester, 100, "c"),
        ];
        assert_eq!(combined_confidence(&insights), 80);
        assert_eq!(combined_confidence(&[]), 0);
        assert_eq!(
            combined_confidence(&[
                analysis(AgentRole::Coordinator, 70, "a"),
                analysis(AgentRole::Infra, 71, "b"),
            ]),
            71
        );
    }

    #[test]
    fn test_assemble_uses_latest_voice() {
        let mut state = WorkflowState::new(Ticket::new("T-9", "subject"), AgentRole::Coordinator);
        state.record_insight(analysis(AgentRole::Coordinator, 80, "route"));
        state.hand_off(AgentRole::Infra, "server");
        state.record_insight(analysis(AgentRole::Infra, 60, "restart"));
        state.hand_off(AgentRole::Coordinator, "back");
        state.record_insight(analysis(AgentRole::Coordinator, 100, "close"));
        state.complete();

        let response = ResponseAssembler::assemble(state, 42);
        assert_eq!(response.ticket_id, "T-9");
        assert_eq!(response.final_recommendations, vec!["close".to_string()]);
        assert_eq!(response.combined_confidence, 80);
        assert_eq!(response.handoff_count, 2);
        assert_eq!(
            response.agents_involved,
            vec![AgentRole::Coordinator, AgentRole::Coordinator, AgentRole::Infra]
        );
        assert_eq!(response.processing_time_ms, 42);
        assert!(response.is_success());
    }

    #[test]
    fn test_assemble_without_insights() {
        let state = WorkflowState::new(Ticket::new("T-0", "subject"), AgentRole::Coordinator);
        let response = ResponseAssembler::assemble(state, 0);
        assert!(response.final_recommendations.is_empty());
        assert_eq!(response.combined_confidence, 0);
        assert_eq!(response.agents_involved, vec![AgentRole::Coordinator]);
    }

    #[test]
    fn test_enhanced_splits_steps() {
        let run = PipelineRun {
            steps: vec![
                WorkflowStepResult::failed(PipelineStep::ThreadContinuation, "no thread"),
                WorkflowStepResult::succeeded(PipelineStep::TicketAnalysis, serde_json::json!({})),
                WorkflowStepResult::succeeded(PipelineStep::AgentAssignment, serde_json::json!({})),
                WorkflowStepResult::succeeded(PipelineStep::TeamMention, serde_json::json!({})),
            ],
            ..Default::default()
        };

        let result = ResponseAssembler::enhanced("T-3", run, 12);
        assert!(!result.success);
        assert_eq!(result.completed_steps.len(), 3);
        assert_eq!(result.failed_steps.len(), 1);
        assert_eq!(result.failed_steps[0].step_name, "thread_continuation");
    }
}
