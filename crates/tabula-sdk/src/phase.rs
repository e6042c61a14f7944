//! Execution phase tracking
//!
//! Every decision execution moves through
//! `Resolving -> Evaluating -> Auditing -> Completed`. A failure in any
//! non-terminal phase ends in `Failed`. Terminal phases have no way out.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::error::SdkError;

/// Lifecycle phase of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    Resolving,
    Evaluating,
    Auditing,
    Completed,
    Failed,
}

impl ExecutionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionPhase::Completed | ExecutionPhase::Failed)
    }

    pub fn can_transition_to(self, next: ExecutionPhase) -> bool {
        use ExecutionPhase::*;
        match (self, next) {
            (Resolving, Evaluating) | (Evaluating, Auditing) | (Auditing, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionPhase::Resolving => "resolving",
            ExecutionPhase::Evaluating => "evaluating",
            ExecutionPhase::Auditing => "auditing",
            ExecutionPhase::Completed => "completed",
            ExecutionPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid phase transition: {from} -> {to}")]
pub struct PhaseTransitionError {
    pub from: ExecutionPhase,
    pub to: ExecutionPhase,
}

/// Phase history of one execution
#[derive(Debug)]
pub struct ExecutionTracker {
    execution_id: String,
    decision_key: String,
    history: Vec<ExecutionPhase>,
    failed_in: Option<ExecutionPhase>,
}

impl ExecutionTracker {
    /// Start tracking in `Resolving`
    pub fn new(execution_id: impl Into<String>, decision_key: impl Into<String>) -> Self {
        let tracker = Self {
            execution_id: execution_id.into(),
            decision_key: decision_key.into(),
            history: vec![ExecutionPhase::Resolving],
            failed_in: None,
        };
        tracing::debug!(
            "[{}] Decision '{}' entering phase {}",
            tracker.execution_id,
            tracker.decision_key,
            ExecutionPhase::Resolving
        );
        tracker
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn phase(&self) -> ExecutionPhase {
        // history is never empty
        self.history
            .last()
            .copied()
            .unwrap_or(ExecutionPhase::Resolving)
    }

    pub fn history(&self) -> &[ExecutionPhase] {
        &self.history
    }

    /// Phase the execution was in when it failed
    pub fn failed_in(&self) -> Option<ExecutionPhase> {
        self.failed_in
    }

    pub fn advance(&mut self, next: ExecutionPhase) -> Result<(), PhaseTransitionError> {
        let current = self.phase();
        if !current.can_transition_to(next) {
            return Err(PhaseTransitionError {
                from: current,
                to: next,
            });
        }
        tracing::debug!(
            "[{}] Decision '{}' phase {} -> {}",
            self.execution_id,
            self.decision_key,
            current,
            next
        );
        self.history.push(next);
        Ok(())
    }

    /// Move to `Failed`, logging the phase the error occurred in
    pub fn fail(&mut self, error: &SdkError) {
        let current = self.phase();
        if current.is_terminal() {
            tracing::warn!(
                "[{}] Error after execution reached {}: {}",
                self.execution_id,
                current,
                error
            );
            return;
        }
        tracing::warn!(
            "[{}] Decision '{}' failed during {}: {}",
            self.execution_id,
            self.decision_key,
            current,
            error
        );
        self.failed_in = Some(current);
        self.history.push(ExecutionPhase::Failed);
    }
}
