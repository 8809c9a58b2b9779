//! Scripted agents for testing.
//!
//! Provides configurable [`Agent`] implementations that return predefined
//! analyses and record how they were called, so workflow tests can drive
//! exact handoff sequences.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{AgentError, AgentResult};
use crate::roles::AgentRole;
use crate::ticket::Ticket;
use crate::traits::{Agent, AgentContext, Analysis};

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub ticket_id: String,
    /// Number of insights the agent saw
    pub insight_count: usize,
}

/// Agent returning predefined analyses.
///
/// Responses are returned in order; once exhausted the last one repeats.
#[derive(Clone)]
pub struct ScriptedAgent {
    role: AgentRole,
    responses: Arc<RwLock<Vec<Analysis>>>,
    response_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    delay: Option<Duration>,
}

impl ScriptedAgent {
    /// Create an agent with no responses; it concludes with confidence 50.
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            delay: None,
        }
    }

    /// Agent that always concludes with the given confidence.
    pub fn concluding(role: AgentRole, confidence: u8) -> Self {
        Self::new(role).respond_with(
            Analysis::new(role, format!("{} concludes", role), confidence)
                .with_action(format!("{} follow-up", role)),
        )
    }

    /// Agent that always hands off to `to`.
    pub fn handing_off(role: AgentRole, to: AgentRole, confidence: u8) -> Self {
        Self::new(role).respond_with(
            Analysis::new(role, format!("{} hands off to {}", role, to), confidence)
                .with_action(format!("{} follow-up", role))
                .handoff_to(to)
                .with_reasoning(format!("{} needs {}", role, to)),
        )
    }

    /// Queue a response.
    pub fn respond_with(self, analysis: Analysis) -> Self {
        self.responses.write().push(analysis);
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times the agent was invoked.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// All captured calls.
    pub fn calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    fn next_response(&self) -> Analysis {
        let responses = self.responses.read();
        if responses.is_empty() {
            return Analysis::new(self.role, format!("{} concludes", self.role), 50);
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses[index.min(responses.len() - 1)].clone()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn role(&self) -> AgentRole {
        self.role
    }

    async fn analyze(&self, ticket: &Ticket, context: &AgentContext) -> AgentResult<Analysis> {
        self.captured_calls.write().push(CapturedCall {
            ticket_id: ticket.id.clone(),
            insight_count: context.insights.len(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.next_response())
    }
}

/// Agent whose every invocation fails.
#[derive(Clone)]
pub struct FailingAgent {
    role: AgentRole,
    message: String,
    calls: Arc<AtomicUsize>,
}

impl FailingAgent {
    pub fn new(role: AgentRole, message: impl Into<String>) -> Self {
        Self {
            role,
            message: message.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for FailingAgent {
    fn role(&self) -> AgentRole {
        self.role
    }

    async fn analyze(&self, _ticket: &Ticket, _context: &AgentContext) -> AgentResult<Analysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AgentError::invocation(self.role, self.message.clone()))
    }
}

/// Registry where every role concludes immediately.
pub fn concluding_registry(confidence: u8) -> crate::roles::AgentRegistry {
    let mut registry = crate::roles::AgentRegistry::new();
    for role in AgentRole::ALL {
        registry.register(Arc::new(ScriptedAgent::concluding(role, confidence)));
    }
    registry
}
