//! Process-wide workflow metrics.
//!
//! One [`WorkflowMetricsAggregator`] is shared by both pipelines. Every
//! update takes the same mutex, so concurrent runs never lose a
//! read-modify-write. Averages are maintained incrementally with
//! `avg' = (avg * (n - 1) + sample) / n`; history is never replayed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use desk_agents::AgentRole;

/// Per-role utilization statistics.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AgentUtilization {
    pub tasks_handled: u64,
    pub successful_tasks: u64,
    /// Mean confidence over successful invocations
    pub average_confidence: f64,
    /// `successful_tasks / tasks_handled`
    pub success_rate: f64,
    pub average_processing_time_ms: f64,
    pub last_active: Option<DateTime<Utc>>,
}

/// Outcome of one agent invocation, as fed to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSample {
    pub success: bool,
    /// Confidence of the produced analysis; `None` on failure
    pub confidence: Option<u8>,
    pub processing_time_ms: u64,
}

impl AgentSample {
    pub fn success(confidence: u8, processing_time_ms: u64) -> Self {
        Self {
            success: true,
            confidence: Some(confidence),
            processing_time_ms,
        }
    }

    pub fn failure(processing_time_ms: u64) -> Self {
        Self {
            success: false,
            confidence: None,
            processing_time_ms,
        }
    }
}

/// Snapshot of the aggregated counters.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkflowMetrics {
    pub total_workflows: u64,
    pub successful_workflows: u64,
    pub average_processing_time_ms: f64,
    pub handoff_count: u64,
    /// Agent invocations across all roles
    pub total_tasks: u64,
    pub agent_utilization: BTreeMap<AgentRole, AgentUtilization>,
    pub last_updated: DateTime<Utc>,
}

impl WorkflowMetrics {
    /// Zeroed metrics with an entry for every role.
    pub fn seeded() -> Self {
        Self {
            total_workflows: 0,
            successful_workflows: 0,
            average_processing_time_ms: 0.0,
            handoff_count: 0,
            total_tasks: 0,
            agent_utilization: AgentRole::ALL
                .into_iter()
                .map(|role| (role, AgentUtilization::default()))
                .collect(),
            last_updated: Utc::now(),
        }
    }

    /// Fraction of workflows that succeeded, 0 when none ran.
    pub fn success_rate(&self) -> f64 {
        if self.total_workflows == 0 {
            0.0
        } else {
            self.successful_workflows as f64 / self.total_workflows as f64
        }
    }
}

impl Default for WorkflowMetrics {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Incremental mean after adding the `n`-th sample.
pub fn online_mean(average: f64, n: u64, sample: f64) -> f64 {
    if n == 0 {
        return average;
    }
    (average * (n - 1) as f64 + sample) / n as f64
}

/// Shared, mutex-guarded metrics.
#[derive(Debug, Default)]
pub struct WorkflowMetricsAggregator {
    inner: Mutex<WorkflowMetrics>,
}

impl WorkflowMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished run.
    pub fn record_completion(&self, processing_time_ms: u64, success: bool) {
        let mut metrics = self.inner.lock();
        metrics.total_workflows += 1;
        if success {
            metrics.successful_workflows += 1;
        }
        let n = metrics.total_workflows;
        metrics.average_processing_time_ms =
            online_mean(metrics.average_processing_time_ms, n, processing_time_ms as f64);
        metrics.last_updated = Utc::now();
        debug!(
            "Recorded workflow completion (success={}, {} ms, total={})",
            success, processing_time_ms, n
        );
    }

    /// Record one agent invocation.
    pub fn record_agent_utilization(&self, role: AgentRole, sample: AgentSample) {
        let now = Utc::now();
        let mut metrics = self.inner.lock();
        metrics.total_tasks += 1;
        metrics.last_updated = now;

        let entry = metrics.agent_utilization.entry(role).or_default();
        entry.tasks_handled += 1;
        if sample.success {
            entry.successful_tasks += 1;
            if let Some(confidence) = sample.confidence {
                entry.average_confidence = online_mean(
                    entry.average_confidence,
                    entry.successful_tasks,
                    confidence as f64,
                );
            }
        }
        entry.success_rate = entry.successful_tasks as f64 / entry.tasks_handled as f64;
        entry.average_processing_time_ms = online_mean(
            entry.average_processing_time_ms,
            entry.tasks_handled,
            sample.processing_time_ms as f64,
        );
        entry.last_active = Some(now);
    }

    /// Count one handoff.
    pub fn record_handoff(&self) {
        let mut metrics = self.inner.lock();
        metrics.handoff_count += 1;
        metrics.last_updated = Utc::now();
    }

    /// Deep copy of the current metrics.
    pub fn snapshot(&self) -> WorkflowMetrics {
        self.inner.lock().clone()
    }

    /// Zero every counter and reseed every role.
    pub fn reset(&self) {
        *self.inner.lock() = WorkflowMetrics::seeded();
        debug!("Workflow metrics reset");
    }
}
