//! # desk_core
//!
//! Ticket orchestration core for DeskFlow.
//!
//! Two pipelines share one agent registry and one metrics aggregator:
//!
//! - **Triage** ([`WorkflowStateMachine`]): agents hand a ticket to each
//!   other until one concludes. Bounded and fail-fast.
//! - **Enhanced** ([`EnhancedPipelineRunner`]): four fixed steps for a
//!   ticket discussed in a live chat thread. Fail-soft, one agent call.
//!
//! [`Orchestrator`] exposes both and turns their terminal runs into
//! caller-facing results through [`ResponseAssembler`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use desk_agents::{AgentRegistry, Ticket};
//! use desk_core::{Orchestrator, OrchestratorConfig};
//!
//! let orchestrator = Orchestrator::new(
//!     AgentRegistry::standard(),
//!     messaging,
//!     ai,
//!     OrchestratorConfig::default(),
//! )?;
//!
//! let response = orchestrator
//!     .process_ticket(Ticket::new("T-1", "Checkout returns 500"))
//!     .await;
//! println!("{:?} after {} handoffs", response.workflow.status(), response.handoff_count);
//! ```

pub mod assignment;
pub mod config;
pub mod engine;
pub mod enhance;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod policy;
pub mod ports;
pub mod response;
pub mod workflow;

pub use assignment::{
    select_by_rules, select_role, AgentAssignment, AssignmentRule, RoleSelection,
    DEFAULT_ASSIGNMENT_CONFIDENCE, FALLBACK_RULES,
};
pub use config::{OrchestratorConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_NOTIFICATION_CHANNEL};
pub use engine::WorkflowStateMachine;
pub use enhance::enhance_analysis;
pub use error::{CoreError, CoreResult};
pub use metrics::{AgentSample, AgentUtilization, WorkflowMetrics, WorkflowMetricsAggregator};
pub use orchestrator::Orchestrator;
pub use pipeline::{
    EnhancedPipelineRunner, EnhancedWorkflowContext, PipelineRun, PipelineStep,
    WorkflowStepResult,
};
pub use policy::FailurePolicy;
pub use ports::{
    AiTextGenerationService, BusinessImpact, IntegrationError, IntegrationResult,
    MessageReceipt, MessagingService, TicketAnalysis, Urgency,
};
pub use response::{EnhancedWorkflowResult, MultiAgentResponse, ResponseAssembler};
pub use workflow::{FailureReason, HandoffRecord, WorkflowContext, WorkflowState, WorkflowStatus};
