//! Failure policies for the two workflow pipelines.
//!
//! The triage loop stops at the first failed stage, so a broken agent can
//! never feed a routing decision. The enhanced pipeline keeps going after a
//! failed step because each later step still delivers progress to a live
//! conversation.

use serde::Serialize;

/// What a pipeline does after a stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Halt the run at the first failure
    FailFast,
    /// Record the failure and run the remaining stages
    FailSoft,
}

impl FailurePolicy {
    /// Whether stages after a failed one still run.
    pub fn continues_after_failure(&self) -> bool {
        matches!(self, FailurePolicy::FailSoft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_semantics() {
        assert!(!FailurePolicy::FailFast.continues_after_failure());
        assert!(FailurePolicy::FailSoft.continues_after_failure());
    }
}
