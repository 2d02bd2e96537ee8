//! StepContext type definition
//!
//! Each step receives its own snapshot: results recorded after the snapshot
//! was taken are invisible to it, and nothing a handler does can alter the
//! context seen by later steps.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::{Category, ExecutionId, StepResult};

const ANONYMOUS_USER: &str = "anonymous";

/// Where the current step sits within the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPosition {
    pub current_step: u32,
    /// 0-based index within the plan
    pub index: usize,
    pub total_steps: usize,
}

/// Immutable context handed to a handler
#[derive(Debug, Clone)]
pub struct StepContext {
    pub execution_id: ExecutionId,
    /// Original request text
    pub input: String,
    pub category: Category,
    pub user_id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied scratch data
    pub shared: Arc<Map<String, Value>>,
    /// Results of all earlier steps, in order
    pub previous_results: Arc<[StepResult]>,
    pub position: StepPosition,
}

impl StepContext {
    pub fn last_result(&self) -> Option<&StepResult> {
        self.previous_results.last()
    }

    /// Data of the most recent step, if any
    pub fn last_data(&self) -> Option<&Value> {
        self.last_result().map(|r| &r.data).filter(|d| !d.is_null())
    }

    /// First earlier result produced by `action`
    pub fn result_of(&self, action: &str) -> Option<&StepResult> {
        self.previous_results.iter().find(|r| r.action == action)
    }

    pub fn is_last_step(&self) -> bool {
        self.position.index + 1 == self.position.total_steps
    }
}

/// Run-scoped template for per-step snapshots
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    execution_id: ExecutionId,
    input: String,
    category: Category,
    user_id: String,
    session_id: String,
    shared: Arc<Map<String, Value>>,
}

impl ContextBuilder {
    pub fn new(execution_id: impl Into<ExecutionId>, input: impl Into<String>) -> Self {
        let input = input.into();
        Self {
            execution_id: execution_id.into(),
            category: Category::detect(&input),
            input,
            user_id: ANONYMOUS_USER.to_string(),
            session_id: format!("session_{}", Uuid::new_v4().simple()),
            shared: Arc::new(Map::new()),
        }
    }

    /// Use the caller's user id when present
    pub fn user_id(mut self, user_id: Option<&str>) -> Self {
        if let Some(id) = user_id.filter(|id| !id.trim().is_empty()) {
            self.user_id = id.to_string();
        }
        self
    }

    /// Use the caller's session id when present
    pub fn session_id(mut self, session_id: Option<&str>) -> Self {
        if let Some(id) = session_id.filter(|id| !id.trim().is_empty()) {
            self.session_id = id.to_string();
        }
        self
    }

    pub fn shared(mut self, shared: Map<String, Value>) -> Self {
        self.shared = Arc::new(shared);
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Snapshot for the step at `index`, seeing `prior` as earlier results
    pub fn snapshot(
        &self,
        current_step: u32,
        index: usize,
        total_steps: usize,
        prior: &[StepResult],
    ) -> StepContext {
        StepContext {
            execution_id: self.execution_id.clone(),
            input: self.input.clone(),
            category: self.category,
            user_id: self.user_id.clone(),
            session_id: self.session_id.clone(),
            timestamp: Utc::now(),
            shared: Arc::clone(&self.shared),
            previous_results: Arc::from(prior.to_vec()),
            position: StepPosition {
                current_step,
                index,
                total_steps,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepMetrics;
    use serde_json::json;

    fn result(step: u32, action: &str, data: Value) -> StepResult {
        StepResult {
            step,
            action: action.to_string(),
            description: String::new(),
            success: true,
            data,
            error: None,
            metadata: Value::Null,
            duration_ms: 1,
            completed_at: Utc::now(),
            integration: None,
            metrics: StepMetrics {
                execution_time_ms: 1,
                success: true,
                retry_count: 0,
            },
        }
    }

    #[test]
    fn test_synthetic_ids_when_absent() {
        let builder = ContextBuilder::new("exec_1", "Post to twitter")
            .user_id(None)
            .session_id(Some("  "));
        let ctx = builder.snapshot(1, 0, 2, &[]);
        assert_eq!(ctx.user_id, "anonymous");
        assert!(ctx.session_id.starts_with("session_"));
        assert_eq!(ctx.category, Category::SocialMedia);
        assert!(ctx.last_result().is_none());
        assert!(!ctx.is_last_step());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_results() {
        let builder = ContextBuilder::new("exec_1", "summarize")
            .user_id(Some("u-7"))
            .shared(json!({"locale": "en"}).as_object().cloned().unwrap_or_default());

        let mut results = vec![result(1, "analyze_input", json!({"words": 1}))];
        let ctx = builder.snapshot(2, 1, 2, &results);
        results.push(result(2, "send_output", json!({"sent": true})));

        assert_eq!(ctx.previous_results.len(), 1);
        assert_eq!(ctx.last_data(), Some(&json!({"words": 1})));
        assert!(ctx.result_of("analyze_input").is_some());
        assert_eq!(ctx.shared.get("locale"), Some(&json!("en")));
        assert_eq!(ctx.user_id, "u-7");
        assert!(ctx.is_last_step());
        assert_eq!(ctx.position.current_step, 2);
    }
}
