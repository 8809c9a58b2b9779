//! Fixed four-step pipeline for tickets arriving through a live thread.
//!
//! Steps always run in [`PipelineStep::ALL`] order. The runner is
//! fail-soft: a failing step is recorded as a failed
//! [`WorkflowStepResult`] and the remaining steps still run. At most one
//! agent is invoked and no handoff chaining happens.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use desk_agents::{AgentContext, AgentRegistry, AgentRole, Ticket};

use crate::assignment::{select_role, AgentAssignment, RoleSelection, DEFAULT_ASSIGNMENT_CONFIDENCE};
use crate::enhance::enhance_analysis;
use crate::error::{CoreError, CoreResult};
use crate::metrics::{AgentSample, WorkflowMetricsAggregator};
use crate::policy::FailurePolicy;
use crate::ports::{AiTextGenerationService, IntegrationError, MessagingService, TicketAnalysis};

/// Shared-context key under which the assigned agent finds the analysis.
pub const ANALYSIS_CONTEXT_KEY: &str = "ticket_analysis";

/// The pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    ThreadContinuation,
    TicketAnalysis,
    AgentAssignment,
    TeamMention,
}

impl PipelineStep {
    pub const ALL: [PipelineStep; 4] = [
        PipelineStep::ThreadContinuation,
        PipelineStep::TicketAnalysis,
        PipelineStep::AgentAssignment,
        PipelineStep::TeamMention,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::ThreadContinuation => "thread_continuation",
            PipelineStep::TicketAnalysis => "ticket_analysis",
            PipelineStep::AgentAssignment => "agent_assignment",
            PipelineStep::TeamMention => "team_mention",
        }
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStepResult {
    pub success: bool,
    pub step_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowStepResult {
    pub fn succeeded(step: PipelineStep, data: Value) -> Self {
        Self {
            success: true,
            step_name: step.as_str().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(step: PipelineStep, error: impl Into<String>) -> Self {
        Self {
            success: false,
            step_name: step.as_str().to_string(),
            data: None,
            error: Some(error.into()),
        }
    }

    fn from_outcome(step: PipelineStep, outcome: CoreResult<Value>) -> Self {
        match outcome {
            Ok(data) => Self::succeeded(step, data),
            Err(e) => Self::failed(step, e.to_string()),
        }
    }
}

/// Input of one enhanced run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedWorkflowContext {
    pub ticket: Ticket,
    pub channel: String,
    /// Existing conversation thread; required by the first step
    pub thread_ts: Option<String>,
    /// Analysis computed upstream; skips the text-generation call
    pub precomputed_analysis: Option<TicketAnalysis>,
}

impl EnhancedWorkflowContext {
    pub fn new(ticket: Ticket, channel: impl Into<String>) -> Self {
        Self {
            ticket,
            channel: channel.into(),
            thread_ts: None,
            precomputed_analysis: None,
        }
    }

    pub fn in_thread(mut self, thread_ts: impl Into<String>) -> Self {
        self.thread_ts = Some(thread_ts.into());
        self
    }

    pub fn with_analysis(mut self, analysis: TicketAnalysis) -> Self {
        self.precomputed_analysis = Some(analysis);
        self
    }
}

/// Everything one pipeline run produced, in step order.
#[derive(Debug, Clone, Default)]
pub struct PipelineRun {
    pub steps: Vec<WorkflowStepResult>,
    pub analysis: Option<TicketAnalysis>,
    pub selection: Option<RoleSelection>,
    pub assignment: Option<AgentAssignment>,
}

impl PipelineRun {
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.success)
    }
}

/// Runs the enhanced pipeline against injected collaborators.
pub struct EnhancedPipelineRunner {
    registry: Arc<AgentRegistry>,
    metrics: Arc<WorkflowMetricsAggregator>,
    messaging: Arc<dyn MessagingService>,
    ai: Arc<dyn AiTextGenerationService>,
    assignment_confidence: u8,
    mentions: BTreeMap<AgentRole, String>,
    notification_channel: Option<String>,
}

impl EnhancedPipelineRunner {
    pub const POLICY: FailurePolicy = FailurePolicy::FailSoft;

    pub fn new(
        registry: Arc<AgentRegistry>,
        metrics: Arc<WorkflowMetricsAggregator>,
        messaging: Arc<dyn MessagingService>,
        ai: Arc<dyn AiTextGenerationService>,
    ) -> Self {
        Self {
            registry,
            metrics,
            messaging,
            ai,
            assignment_confidence: DEFAULT_ASSIGNMENT_CONFIDENCE,
            mentions: BTreeMap::new(),
            notification_channel: None,
        }
    }

    pub fn with_assignment_confidence(mut self, confidence: u8) -> Self {
        self.assignment_confidence = confidence;
        self
    }

    /// Mention handles per role; roles without one are mentioned as `@role`.
    pub fn with_mentions(mut self, mentions: BTreeMap<AgentRole, String>) -> Self {
        self.mentions = mentions;
        self
    }

    /// Channel for the team mention. Without one the mention goes to the
    /// ticket's own channel.
    pub fn with_notification_channel(mut self, channel: impl Into<String>) -> Self {
        self.notification_channel = Some(channel.into());
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        Self::POLICY
    }

    /// Run all steps for one ticket.
    pub async fn run(&self, context: &EnhancedWorkflowContext) -> PipelineRun {
        info!("Starting enhanced pipeline for ticket {}", context.ticket.id);
        let mut run = PipelineRun::default();

        for step in PipelineStep::ALL {
            let outcome = match step {
                PipelineStep::ThreadContinuation => self.continue_thread(context).await,
                PipelineStep::TicketAnalysis => match self.analyze(context).await {
                    Ok(analysis) => serde_json::to_value(&analysis)
                        .map_err(CoreError::from)
                        .map(|data| {
                            run.analysis = Some(analysis);
                            data
                        }),
                    Err(e) => Err(e),
                },
                PipelineStep::AgentAssignment => {
                    let selection = select_role(&context.ticket, run.analysis.as_ref());
                    run.selection = Some(selection);
                    self.assign(context, selection, run.analysis.as_ref())
                        .await
                        .map(|assignment| {
                            let data = json!({
                                "role": assignment.role,
                                "rule": assignment.rule,
                                "confidence": assignment.confidence,
                            });
                            run.assignment = Some(assignment);
                            data
                        })
                }
                PipelineStep::TeamMention => {
                    let role = run
                        .selection
                        .map(|s| s.role)
                        .unwrap_or(AgentRole::Coordinator);
                    self.mention(context, role, run.analysis.as_ref()).await
                }
            };

            let result = WorkflowStepResult::from_outcome(step, outcome);
            if let Some(error) = &result.error {
                warn!("Step {} failed for ticket {}: {}", step, context.ticket.id, error);
            } else {
                debug!("Step {} completed for ticket {}", step, context.ticket.id);
            }
            let failed = !result.success;
            run.steps.push(result);

            if failed && !Self::POLICY.continues_after_failure() {
                break;
            }
        }

        info!(
            "Enhanced pipeline for ticket {} finished ({} of {} steps succeeded)",
            context.ticket.id,
            run.steps.iter().filter(|s| s.success).count(),
            run.steps.len()
        );
        run
    }

    async fn continue_thread(&self, context: &EnhancedWorkflowContext) -> CoreResult<Value> {
        let thread_ts = context
            .thread_ts
            .clone()
            .ok_or(IntegrationError::MissingThread)?;
        let text = format!(
            "Starting analysis of ticket {}: {}",
            context.ticket.id, context.ticket.subject
        );
        let receipt = self
            .messaging
            .send_message(&context.channel, &text, Some(thread_ts.clone()))
            .await?;
        Ok(json!({
            "channel": receipt.channel,
            "thread_ts": thread_ts,
            "message_ts": receipt.message_ts,
        }))
    }

    async fn analyze(&self, context: &EnhancedWorkflowContext) -> CoreResult<TicketAnalysis> {
        let analysis = match &context.precomputed_analysis {
            Some(analysis) => analysis.clone(),
            None => {
                let text = format!("{}\n\n{}", context.ticket.subject, context.ticket.description);
                self.ai.analyze_ticket(&text).await?
            }
        };
        Ok(enhance_analysis(&context.ticket, analysis))
    }

    async fn assign(
        &self,
        context: &EnhancedWorkflowContext,
        selection: RoleSelection,
        analysis: Option<&TicketAnalysis>,
    ) -> CoreResult<AgentAssignment> {
        let role = selection.role;
        let agent = self.registry.get(role).ok_or_else(|| {
            CoreError::Configuration(format!("No agent registered for role {}", role))
        })?;

        let mut agent_context = AgentContext::new()
            .with_handoff_reason(format!("Assigned by {} rule", selection.rule));
        if let Some(analysis) = analysis {
            agent_context.set_shared(ANALYSIS_CONTEXT_KEY, analysis);
        }

        let started = Instant::now();
        let result = agent.analyze(&context.ticket, &agent_context).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(agent_analysis) => {
                self.metrics.record_agent_utilization(
                    role,
                    AgentSample::success(agent_analysis.confidence, elapsed_ms),
                );
                info!(
                    "Ticket {} assigned to {} ({} rule)",
                    context.ticket.id, role, selection.rule
                );
                Ok(AgentAssignment {
                    role,
                    rule: selection.rule,
                    confidence: self.assignment_confidence,
                    analysis: agent_analysis,
                })
            }
            Err(e) => {
                self.metrics
                    .record_agent_utilization(role, AgentSample::failure(elapsed_ms));
                Err(e.into())
            }
        }
    }

    async fn mention(
        &self,
        context: &EnhancedWorkflowContext,
        role: AgentRole,
        analysis: Option<&TicketAnalysis>,
    ) -> CoreResult<Value> {
        let channel = self
            .notification_channel
            .as_deref()
            .unwrap_or(&context.channel);
        // The thread only exists in the ticket's channel
        let thread_ts = if channel == context.channel {
            context.thread_ts.clone()
        } else {
            None
        };

        let handle = self
            .mentions
            .get(&role)
            .cloned()
            .unwrap_or_else(|| format!("@{}", role));
        let category = analysis
            .and_then(|a| a.category.as_deref())
            .unwrap_or("uncategorized");
        let urgency = analysis
            .and_then(|a| a.urgency)
            .map(|u| u.as_str())
            .unwrap_or("unknown");

        let text = format!(
            "{} ticket {} needs attention: {} (category: {}, urgency: {})",
            handle, context.ticket.id, context.ticket.subject, category, urgency
        );
        let receipt = self
            .messaging
            .send_message(channel, &text, thread_ts)
            .await?;
        Ok(json!({
            "channel": receipt.channel,
            "mentioned": handle,
            "message_ts": receipt.message_ts,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MessageReceipt, MockAiTextGenerationService, MockMessagingService, Urgency};
    use desk_agents::testing::{concluding_registry, FailingAgent};

    fn receipt(channel: &str) -> MessageReceipt {
        MessageReceipt {
            channel: channel.to_string(),
            message_ts: Some("1700000000.000200".to_string()),
        }
    }

    fn messaging_ok(times: usize) -> MockMessagingService {
        let mut messaging = MockMessagingService::new();
        messaging
            .expect_send_message()
            .times(times)
            .returning(|channel, _, _| Ok(receipt(channel)));
        messaging
    }

    fn ai_unused() -> MockAiTextGenerationService {
        let mut ai = MockAiTextGenerationService::new();
        ai.expect_analyze_ticket().times(0);
        ai
    }

    fn runner(
        registry: AgentRegistry,
        messaging: MockMessagingService,
        ai: MockAiTextGenerationService,
    ) -> (EnhancedPipelineRunner, Arc<WorkflowMetricsAggregator>) {
        let metrics = Arc::new(WorkflowMetricsAggregator::new());
        let runner = EnhancedPipelineRunner::new(
            Arc::new(registry),
            Arc::clone(&metrics),
            Arc::new(messaging),
            Arc::new(ai),
        );
        (runner, metrics)
    }

    fn context() -> EnhancedWorkflowContext {
        EnhancedWorkflowContext::new(
            Ticket::new("T-7", "Checkout returns 500 error"),
            "#support",
        )
    }

    fn step_names(run: &PipelineRun) -> Vec<&str> {
        run.steps.iter().map(|s| s.step_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_all_steps_succeed() {
        let mut ai = MockAiTextGenerationService::new();
        ai.expect_analyze_ticket().times(1).returning(|_| {
            Ok(TicketAnalysis {
                category: Some("hosting".to_string()),
                urgency: Some(Urgency::High),
                ..Default::default()
            })
        });
        let (runner, metrics) = runner(concluding_registry(70), messaging_ok(2), ai);

        let run = runner.run(&context().in_thread("1700000000.000100")).await;
        assert!(run.succeeded());
        assert_eq!(
            step_names(&run),
            ["thread_continuation", "ticket_analysis", "agent_assignment", "team_mention"]
        );

        let analysis = run.analysis.unwrap();
        assert!(analysis.complexity.is_some());
        assert!(analysis.estimated_resolution_hours.is_some());

        let assignment = run.assignment.unwrap();
        assert_eq!(assignment.role, AgentRole::Infra);
        assert_eq!(assignment.confidence, DEFAULT_ASSIGNMENT_CONFIDENCE);
        assert_eq!(
            metrics.snapshot().agent_utilization[&AgentRole::Infra].tasks_handled,
            1
        );
    }

    #[tokio::test]
    async fn test_missing_thread_fails_closed_and_continues() {
        let mut messaging = MockMessagingService::new();
        messaging
            .expect_send_message()
            .times(1)
            .withf(|_, text, thread| text.contains("needs attention") && thread.is_none())
            .returning(|channel, _, _| Ok(receipt(channel)));
        let (runner, _) = runner(concluding_registry(70), messaging, ai_unused());

        let run = runner
            .run(&context().with_analysis(TicketAnalysis::default()))
            .await;
        assert!(!run.succeeded());
        assert_eq!(run.steps.len(), 4);
        assert!(!run.steps[0].success);
        assert!(run.steps[0]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("No conversation thread")));
        assert!(run.steps[1..].iter().all(|s| s.success));
    }

    #[tokio::test]
    async fn test_precomputed_analysis_is_enhanced() {
        let (runner, _) = runner(concluding_registry(70), messaging_ok(2), ai_unused());
        let precomputed = TicketAnalysis {
            recommended_role: Some(AgentRole::Analyst),
            ..Default::default()
        };

        let run = runner
            .run(&context().in_thread("1.0").with_analysis(precomputed))
            .await;
        assert!(run.succeeded());
        let analysis = run.analysis.unwrap();
        assert!(analysis.business_impact.is_some());
        assert_eq!(run.assignment.unwrap().role, AgentRole::Analyst);
    }

    #[tokio::test]
    async fn test_ai_failure_is_localized() {
        let mut ai = MockAiTextGenerationService::new();
        ai.expect_analyze_ticket()
            .times(1)
            .returning(|_| Err(IntegrationError::request("openai", "connection reset")));
        let (runner, _) = runner(concluding_registry(70), messaging_ok(2), ai);

        let run = runner.run(&context().in_thread("1.0")).await;
        assert!(!run.succeeded());
        assert!(!run.steps[1].success);
        assert!(run.steps[2].success);
        assert!(run.steps[3].success);
        assert!(run.analysis.is_none());
        assert_eq!(run.assignment.unwrap().rule, "infrastructure");
    }

    #[tokio::test]
    async fn test_agent_failure_is_localized() {
        let mut registry = concluding_registry(70);
        let failing = FailingAgent::new(AgentRole::Infra, "model unavailable");
        registry.register(Arc::new(failing.clone()));
        let (runner, metrics) = runner(registry, messaging_ok(2), ai_unused());

        let run = runner
            .run(&context().in_thread("1.0").with_analysis(TicketAnalysis::default()))
            .await;
        assert!(!run.steps[2].success);
        assert!(run.steps[3].success);
        assert!(run.assignment.is_none());
        assert_eq!(failing.call_count(), 1);

        let infra = &metrics.snapshot().agent_utilization[&AgentRole::Infra];
        assert_eq!(infra.tasks_handled, 1);
        assert_eq!(infra.successful_tasks, 0);
    }

    #[tokio::test]
    async fn test_messaging_failure_is_localized() {
        let mut messaging = MockMessagingService::new();
        messaging
            .expect_send_message()
            .times(2)
            .returning(|_, _, _| Err(IntegrationError::rejected("slack", "channel_not_found")));
        let (runner, _) = runner(concluding_registry(70), messaging, ai_unused());

        let run = runner
            .run(&context().in_thread("1.0").with_analysis(TicketAnalysis::default()))
            .await;
        let failed: Vec<_> = run.steps.iter().filter(|s| !s.success).collect();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].step_name, "thread_continuation");
        assert_eq!(failed[1].step_name, "team_mention");
    }

    #[tokio::test]
    async fn test_mention_uses_configured_handle() {
        let mut messaging = MockMessagingService::new();
        messaging
            .expect_send_message()
            .times(1)
            .withf(|_, text, _| text.contains("Starting analysis"))
            .returning(|channel, _, _| Ok(receipt(channel)));
        messaging
            .expect_send_message()
            .times(1)
            .withf(|_, text, _| text.starts_with("@oncall") && text.contains("urgency: critical"))
            .returning(|channel, _, _| Ok(receipt(channel)));

        let (runner, _) = runner(concluding_registry(70), messaging, ai_unused());
        let runner = runner
            .with_mentions(BTreeMap::from([(AgentRole::Infra, "@oncall".to_string())]))
            .with_assignment_confidence(60);

        let run = runner
            .run(&context().in_thread("1.0").with_analysis(TicketAnalysis {
                urgency: Some(Urgency::Critical),
                ..Default::default()
            }))
            .await;
        assert!(run.succeeded());
        assert_eq!(run.assignment.unwrap().confidence, 60);
    }

    #[tokio::test]
    async fn test_mention_goes_to_notification_channel() {
        let mut messaging = MockMessagingService::new();
        messaging
            .expect_send_message()
            .times(1)
            .withf(|channel, text, thread| {
                channel == "#billing" && text.contains("Starting analysis") && thread.is_some()
            })
            .returning(|channel, _, _| Ok(receipt(channel)));
        messaging
            .expect_send_message()
            .times(1)
            .withf(|channel, text, thread| {
                channel == "#team" && text.contains("needs attention") && thread.is_none()
            })
            .returning(|channel, _, _| Ok(receipt(channel)));

        let (runner, _) = runner(concluding_registry(70), messaging, ai_unused());
        let runner = runner.with_notification_channel("#team");

        let ctx = EnhancedWorkflowContext::new(Ticket::new("T-8", "Refund request"), "#billing")
            .in_thread("1.0")
            .with_analysis(TicketAnalysis::default());
        let run = runner.run(&ctx).await;
        assert!(run.succeeded());
        assert_eq!(run.steps[0].data.as_ref().unwrap()["channel"], "#billing");
        assert_eq!(run.steps[3].data.as_ref().unwrap()["channel"], "#team");
    }

    #[test]
    fn test_serialization_error_fails_the_step() {
        let err = serde_json::from_str::<Value>("{").unwrap_err();
        let result =
            WorkflowStepResult::from_outcome(PipelineStep::TicketAnalysis, Err(err.into()));
        assert!(!result.success);
        assert!(result.data.is_none());
        assert!(result
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Serialization error")));
    }

    #[test]
    fn test_policy_is_fail_soft() {
        assert!(EnhancedPipelineRunner::POLICY.continues_after_failure());
    }
}
