//! Execution record definitions
//!
//! An Execution is the persisted trail of one plan run: created once in the
//! `Running` state, then updated exactly once when it reaches a terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::Plan;

/// Type alias for Execution ID
pub type ExecutionId = String;

/// Execution lifecycle: pending -> running -> {completed | failed}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    /// Check if the execution can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Status only moves forward and never leaves a terminal state.
    pub fn can_transition_to(&self, next: ExecutionStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Rejected status change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid execution status transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: ExecutionStatus,
    pub to: ExecutionStatus,
}

/// Provider bookkeeping attached to results of integration actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationInfo {
    pub action_type: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_id: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub execution_time_ms: u64,
    pub success: bool,
    /// Steps are never retried, so this always reads 0.
    pub retry_count: u32,
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: u32,
    pub action: String,
    pub description: String,
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<IntegrationInfo>,
    pub metrics: StepMetrics,
}

/// Request text and caller options recorded with an execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionInput {
    pub prompt: String,
    #[serde(default)]
    pub options: Value,
}

/// Persisted trail of one plan run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    pub status: ExecutionStatus,
    pub input: ExecutionInput,
    pub plan: Plan,
    #[serde(default)]
    pub results: Vec<StepResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub execution_time_ms: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Execution {
    /// Create a running execution for a plan
    pub fn start(plan: Plan, input: ExecutionInput) -> Self {
        let now = Utc::now();
        Self {
            id: format!("exec_{}", Uuid::new_v4().simple()),
            plan_id: None,
            status: ExecutionStatus::Running,
            input,
            plan,
            results: Vec::new(),
            output: None,
            error: None,
            execution_time_ms: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_plan_id(mut self, plan_id: Option<String>) -> Self {
        self.plan_id = plan_id;
        self
    }

    /// Apply a partial update, enforcing status monotonicity.
    pub fn apply(&mut self, update: ExecutionUpdate) -> Result<(), InvalidTransition> {
        if let Some(next) = update.status {
            if !self.status.can_transition_to(next) {
                return Err(InvalidTransition {
                    from: self.status,
                    to: next,
                });
            }
            self.status = next;
        }
        if let Some(results) = update.results {
            self.results = results;
        }
        if update.output.is_some() {
            self.output = update.output;
        }
        if update.error.is_some() {
            self.error = update.error;
        }
        if let Some(ms) = update.execution_time_ms {
            self.execution_time_ms = ms;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Partial update applied to a stored execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionUpdate {
    pub status: Option<ExecutionStatus>,
    pub results: Option<Vec<StepResult>>,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub execution_time_ms: Option<u64>,
}

impl ExecutionUpdate {
    pub fn completed(results: Vec<StepResult>, output: Value, execution_time_ms: u64) -> Self {
        Self {
            status: Some(ExecutionStatus::Completed),
            results: Some(results),
            output: Some(output),
            error: None,
            execution_time_ms: Some(execution_time_ms),
        }
    }

    pub fn failed(
        results: Vec<StepResult>,
        output: Value,
        error: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            status: Some(ExecutionStatus::Failed),
            results: Some(results),
            output: Some(output),
            error: Some(error.into()),
            execution_time_ms: Some(execution_time_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Step;
    use serde_json::json;

    fn sample() -> Execution {
        Execution::start(
            Plan::new(vec![Step::new(1, "analyze_input", "Analyze")]),
            ExecutionInput {
                prompt: "summarize my notes".to_string(),
                options: Value::Null,
            },
        )
    }

    #[test]
    fn test_status_only_moves_forward() {
        use ExecutionStatus::*;
        assert!(Pending.can_transition_to(Running));
        assert!(Pending.can_transition_to(Failed));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Failed));
        assert!(!Running.can_transition_to(Pending));
        assert!(!Running.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
    }

    #[test]
    fn test_apply_terminal_update() {
        let mut execution = sample();
        assert_eq!(execution.status, ExecutionStatus::Running);
        assert!(execution.id.starts_with("exec_"));

        execution
            .apply(ExecutionUpdate::completed(Vec::new(), json!({"ok": true}), 12))
            .expect("running -> completed");
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.execution_time_ms, 12);
        assert_eq!(execution.output, Some(json!({"ok": true})));
    }

    #[test]
    fn test_apply_rejects_leaving_terminal_state() {
        let mut execution = sample();
        execution
            .apply(ExecutionUpdate::failed(Vec::new(), Value::Null, "boom", 3))
            .expect("running -> failed");

        let err = execution
            .apply(ExecutionUpdate::completed(Vec::new(), Value::Null, 4))
            .unwrap_err();
        assert_eq!(err.from, ExecutionStatus::Failed);
        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert_eq!(execution.error.as_deref(), Some("boom"));
    }
}
