//! Ticket triage state machine.
//!
//! Starting from the coordinator, the machine invokes the current role's
//! agent, stores its analysis and follows the handoff hint until an agent
//! concludes. The loop is bounded: a run still handing off after
//! `max_iterations` invocations is failed, which breaks handoff cycles.
//!
//! Runs are fail-fast. The first agent error ends the run with
//! [`WorkflowStatus::Failed`]; nothing is retried.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use desk_agents::{AgentContext, AgentRegistry, AgentRole, Ticket};

use crate::config::DEFAULT_MAX_ITERATIONS;
use crate::metrics::{AgentSample, WorkflowMetricsAggregator};
use crate::policy::FailurePolicy;
use crate::workflow::{FailureReason, WorkflowState, WorkflowStatus};

/// Drives one triage run per call to [`execute`](Self::execute).
pub struct WorkflowStateMachine {
    registry: Arc<AgentRegistry>,
    metrics: Arc<WorkflowMetricsAggregator>,
    max_iterations: u32,
}

impl WorkflowStateMachine {
    /// Role every run starts with.
    pub const ENTRY_ROLE: AgentRole = AgentRole::Coordinator;

    /// Failure handling of the triage loop.
    pub const POLICY: FailurePolicy = FailurePolicy::FailFast;

    pub fn new(registry: Arc<AgentRegistry>, metrics: Arc<WorkflowMetricsAggregator>) -> Self {
        Self {
            registry,
            metrics,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Override the iteration bound.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn policy(&self) -> FailurePolicy {
        Self::POLICY
    }

    /// Run a ticket to a terminal state.
    pub async fn execute(&self, ticket: Ticket) -> WorkflowState {
        let mut state = WorkflowState::new(ticket, Self::ENTRY_ROLE);
        info!(
            "Starting triage for ticket {} (run {})",
            state.ticket_id, state.run_id
        );

        while state.is_in_progress() && state.iterations() < self.max_iterations {
            self.step(&mut state).await;
        }

        if state.is_in_progress() {
            warn!(
                "Ticket {} still handing off after {} iterations, failing run",
                state.ticket_id,
                state.iterations()
            );
            state.fail(FailureReason::BoundExceeded {
                iterations: state.iterations(),
            });
        }

        match state.status() {
            WorkflowStatus::Completed => info!(
                "Triage for ticket {} completed by {} after {} iteration(s)",
                state.ticket_id,
                state.current_agent(),
                state.iterations()
            ),
            _ => warn!(
                "Triage for ticket {} failed: {}",
                state.ticket_id,
                state
                    .failure()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            ),
        }
        state
    }

    /// One iteration: invoke the current agent and act on its analysis.
    async fn step(&self, state: &mut WorkflowState) {
        let role = state.current_agent();
        let Some(agent) = self.registry.get(role) else {
            error!("No agent registered for role {}", role);
            state.fail(FailureReason::MissingAgent { role });
            return;
        };

        let context = self.agent_context(state, role);
        debug!(
            "Invoking {} for ticket {} (iteration {})",
            role,
            state.ticket_id,
            state.iterations() + 1
        );

        let started = Instant::now();
        let result = agent.analyze(&state.context.ticket, &context).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        state.tick();

        let analysis = match result {
            Ok(analysis) => analysis,
            Err(e) => {
                error!("Agent {} failed on ticket {}: {}", role, state.ticket_id, e);
                self.metrics
                    .record_agent_utilization(role, AgentSample::failure(elapsed_ms));
                state.fail(FailureReason::AgentInvocation {
                    role,
                    message: e.to_string(),
                });
                return;
            }
        };

        self.metrics.record_agent_utilization(
            role,
            AgentSample::success(analysis.confidence, elapsed_ms),
        );

        let next = analysis.handoff_target(role);
        let reason = analysis
            .reasoning
            .clone()
            .unwrap_or_else(|| format!("{} requested a handoff", role));
        state.record_insight(analysis);

        match next {
            Some(to) => {
                if state.hand_off(to, reason).is_some() {
                    self.metrics.record_handoff();
                    info!("Ticket {} handed off from {} to {}", state.ticket_id, role, to);
                }
            }
            None => {
                state.complete();
            }
        }
    }

    fn agent_context(&self, state: &WorkflowState, role: AgentRole) -> AgentContext {
        let mut context = AgentContext::new().with_insights(state.context.insights.clone());
        if let Some(last) = state.handoff_history().last() {
            if last.to == role {
                context = context.with_handoff_reason(last.reason.clone());
            }
        }
        context
    }
}
