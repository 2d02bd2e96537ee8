//! Helpers shared by the built-in handlers.

use serde_json::{json, Map, Value};
use stepwise_core::action::StepContext;

/// Data of the previous step, or an empty object for the first step
pub(crate) fn previous_data(ctx: &StepContext) -> Value {
    ctx.last_data()
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// `data.content` when present, the whole value otherwise
pub(crate) fn content_of(data: &Value) -> Value {
    match data.get("content") {
        Some(content) if !content.is_null() => content.clone(),
        _ => data.clone(),
    }
}

pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Sum of the reported durations of earlier steps
pub(crate) fn total_duration_ms(ctx: &StepContext) -> u64 {
    ctx.previous_results.iter().map(|r| r.duration_ms).sum()
}

pub(crate) fn timestamp(ctx: &StepContext) -> String {
    ctx.timestamp.to_rfc3339()
}

/// Stable reference for something a step "created", e.g. `gmail_exec_ab12_s3`
pub(crate) fn reference_id(prefix: &str, ctx: &StepContext) -> String {
    format!(
        "{}_{}_s{}",
        prefix, ctx.execution_id, ctx.position.current_step
    )
}

/// Object params, or an empty object
pub(crate) fn object_or_empty(value: Option<&Map<String, Value>>) -> Value {
    value
        .cloned()
        .map(Value::Object)
        .unwrap_or_else(|| json!({}))
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use serde_json::{Map, Value};
    use stepwise_core::action::{ActionInput, ContextBuilder, StepContext};
    use stepwise_core::types::{StepMetrics, StepResult};

    pub fn input(params: Value) -> ActionInput {
        match params {
            Value::Object(map) => ActionInput::new(map),
            _ => ActionInput::new(Map::new()),
        }
    }

    pub fn prior(step: u32, action: &str, data: Value) -> StepResult {
        StepResult {
            step,
            action: action.to_string(),
            description: format!("{action} step"),
            success: true,
            data,
            error: None,
            metadata: Value::Null,
            duration_ms: 10,
            completed_at: Utc::now(),
            integration: None,
            metrics: StepMetrics {
                execution_time_ms: 10,
                success: true,
                retry_count: 0,
            },
        }
    }

    pub fn context(request: &str, prior: &[StepResult]) -> StepContext {
        let step = prior.len() as u32 + 1;
        ContextBuilder::new("exec_test", request).snapshot(step, prior.len(), prior.len() + 1, prior)
    }
}
