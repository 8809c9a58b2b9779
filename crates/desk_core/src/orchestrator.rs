//! Public entry point tying both pipelines to one metrics aggregator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use desk_agents::{AgentRegistry, Ticket};

use crate::config::OrchestratorConfig;
use crate::engine::WorkflowStateMachine;
use crate::error::{CoreError, CoreResult};
use crate::metrics::{WorkflowMetrics, WorkflowMetricsAggregator};
use crate::pipeline::{EnhancedPipelineRunner, EnhancedWorkflowContext};
use crate::ports::{AiTextGenerationService, MessagingService};
use crate::response::{EnhancedWorkflowResult, MultiAgentResponse, ResponseAssembler};
use crate::workflow::WorkflowStatus;

/// Ticket orchestrator.
///
/// Cheap to share behind an `Arc`; every call owns its own run state and
/// only the metrics aggregator is shared between concurrent calls.
pub struct Orchestrator {
    state_machine: WorkflowStateMachine,
    pipeline: EnhancedPipelineRunner,
    metrics: Arc<WorkflowMetricsAggregator>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Build an orchestrator.
    ///
    /// Fails when a role has no agent or the configuration is invalid.
    pub fn new(
        registry: AgentRegistry,
        messaging: Arc<dyn MessagingService>,
        ai: Arc<dyn AiTextGenerationService>,
        config: OrchestratorConfig,
    ) -> CoreResult<Self> {
        registry.validate()?;
        config.validate()?;
        let mentions = config.mention_table()?;

        let registry = Arc::new(registry);
        let metrics = Arc::new(WorkflowMetricsAggregator::new());

        let state_machine = WorkflowStateMachine::new(Arc::clone(&registry), Arc::clone(&metrics))
            .with_max_iterations(config.max_iterations);
        let pipeline = EnhancedPipelineRunner::new(registry, Arc::clone(&metrics), messaging, ai)
            .with_assignment_confidence(config.assignment_confidence)
            .with_mentions(mentions)
            .with_notification_channel(config.notification_channel.clone());

        info!(
            "Orchestrator ready (max_iterations={}, channel={})",
            config.max_iterations, config.notification_channel
        );

        Ok(Self {
            state_machine,
            pipeline,
            metrics,
            config,
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Route a ticket through the agent handoff loop.
    pub async fn process_ticket(&self, ticket: Ticket) -> MultiAgentResponse {
        let started = Instant::now();
        let state = self.state_machine.execute(ticket).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let success = state.status() == WorkflowStatus::Completed;
        self.metrics.record_completion(elapsed_ms, success);
        ResponseAssembler::assemble(state, elapsed_ms)
    }

    /// [`process_ticket`](Self::process_ticket) under a deadline.
    ///
    /// A run that misses the deadline is dropped and does not count as a
    /// workflow. Agent samples and handoffs it recorded before the deadline
    /// remain in the metrics.
    pub async fn process_ticket_within(
        &self,
        ticket: Ticket,
        deadline: Duration,
    ) -> CoreResult<MultiAgentResponse> {
        let ticket_id = ticket.id.clone();
        tokio::time::timeout(deadline, self.process_ticket(ticket))
            .await
            .map_err(|_| {
                warn!("Ticket {} exceeded its {:?} deadline", ticket_id, deadline);
                CoreError::Timeout(deadline.as_millis() as u64)
            })
    }

    /// Run the four-step pipeline for a ticket in a live thread.
    pub async fn execute_enhanced_workflow(
        &self,
        context: EnhancedWorkflowContext,
    ) -> EnhancedWorkflowResult {
        let started = Instant::now();
        let run = self.pipeline.run(&context).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.metrics.record_completion(elapsed_ms, run.succeeded());
        ResponseAssembler::enhanced(context.ticket.id, run, elapsed_ms)
    }

    /// Detached copy of the current metrics.
    pub fn get_workflow_metrics(&self) -> WorkflowMetrics {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{
        MessageReceipt, MockAiTextGenerationService, MockMessagingService, TicketAnalysis,
    };
    use desk_agents::testing::{concluding_registry, ScriptedAgent};
    use desk_agents::AgentRole;

    fn orchestrator(registry: AgentRegistry, config: OrchestratorConfig) -> CoreResult<Orchestrator> {
        Orchestrator::new(
            registry,
            Arc::new(MockMessagingService::new()),
            Arc::new(MockAiTextGenerationService::new()),
            config,
        )
    }

    #[test]
    fn test_incomplete_registry_is_rejected() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(ScriptedAgent::concluding(AgentRole::Coordinator, 50)));
        let err = orchestrator(registry, OrchestratorConfig::default())
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = OrchestratorConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(orchestrator(concluding_registry(50), config).is_err());
    }

    #[tokio::test]
    async fn test_process_ticket_records_completion() {
        let orchestrator = orchestrator(concluding_registry(75), OrchestratorConfig::default()).unwrap();

        let response = orchestrator
            .process_ticket(Ticket::new("T-1", "Need help"))
            .await;
        assert!(response.is_success());
        assert_eq!(response.combined_confidence, 75);

        let metrics = orchestrator.get_workflow_metrics();
        assert_eq!(metrics.total_workflows, 1);
        assert_eq!(metrics.successful_workflows, 1);

        orchestrator.reset_metrics();
        assert_eq!(orchestrator.get_workflow_metrics().total_workflows, 0);
    }

    #[tokio::test]
    async fn test_configured_bound_applies() {
        let mut registry = concluding_registry(50);
        registry.register(Arc::new(ScriptedAgent::handing_off(
            AgentRole::Coordinator,
            AgentRole::Tester,
            50,
        )));
        registry.register(Arc::new(ScriptedAgent::handing_off(
            AgentRole::Tester,
            AgentRole::Coordinator,
            50,
        )));
        let config = OrchestratorConfig {
            max_iterations: 3,
            ..Default::default()
        };
        let orchestrator = orchestrator(registry, config).unwrap();

        let response = orchestrator.process_ticket(Ticket::new("T-2", "loop")).await;
        assert!(!response.is_success());
        assert_eq!(response.workflow.iterations(), 3);
        assert_eq!(response.handoff_count, 3);
        assert_eq!(orchestrator.get_workflow_metrics().successful_workflows, 0);
    }

    #[tokio::test]
    async fn test_deadline() {
        let mut registry = concluding_registry(50);
        registry.register(Arc::new(
            ScriptedAgent::concluding(AgentRole::Coordinator, 50)
                .with_delay(Duration::from_millis(200)),
        ));
        let orchestrator = orchestrator(registry, OrchestratorConfig::default()).unwrap();

        let result = orchestrator
            .process_ticket_within(Ticket::new("T-3", "slow"), Duration::from_millis(10))
            .await;
        assert!(matches!(result, Err(CoreError::Timeout(10))));
        assert_eq!(orchestrator.get_workflow_metrics().total_workflows, 0);
    }

    #[tokio::test]
    async fn test_deadline_keeps_partial_agent_samples() {
        let mut registry = concluding_registry(50);
        registry.register(Arc::new(ScriptedAgent::handing_off(
            AgentRole::Coordinator,
            AgentRole::Tester,
            50,
        )));
        registry.register(Arc::new(
            ScriptedAgent::concluding(AgentRole::Tester, 50).with_delay(Duration::from_millis(500)),
        ));
        let orchestrator = orchestrator(registry, OrchestratorConfig::default()).unwrap();

        let result = orchestrator
            .process_ticket_within(Ticket::new("T-4", "slow tester"), Duration::from_millis(100))
            .await;
        assert!(matches!(result, Err(CoreError::Timeout(100))));

        let metrics = orchestrator.get_workflow_metrics();
        assert_eq!(metrics.total_workflows, 0);
        assert_eq!(metrics.handoff_count, 1);
        assert_eq!(metrics.total_tasks, 1);
        assert_eq!(
            metrics.agent_utilization[&AgentRole::Coordinator].tasks_handled,
            1
        );
    }

    #[tokio::test]
    async fn test_enhanced_mention_uses_configured_channel() {
        let mut messaging = MockMessagingService::new();
        messaging
            .expect_send_message()
            .times(1)
            .withf(|channel, _, _| channel == "#billing")
            .returning(|channel, _, _| {
                Ok(MessageReceipt {
                    channel: channel.to_string(),
                    message_ts: None,
                })
            });
        messaging
            .expect_send_message()
            .times(1)
            .withf(|channel, text, _| channel == "#team" && text.contains("needs attention"))
            .returning(|channel, _, _| {
                Ok(MessageReceipt {
                    channel: channel.to_string(),
                    message_ts: None,
                })
            });
        let config = OrchestratorConfig {
            notification_channel: "#team".to_string(),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(
            concluding_registry(50),
            Arc::new(messaging),
            Arc::new(MockAiTextGenerationService::new()),
            config,
        )
        .unwrap();

        let context = EnhancedWorkflowContext::new(Ticket::new("T-5", "Refund"), "#billing")
            .in_thread("1.0")
            .with_analysis(TicketAnalysis::default());
        let result = orchestrator.execute_enhanced_workflow(context).await;
        assert!(result.success);
    }
}
