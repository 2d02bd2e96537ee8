//! Action abstraction module
//!
//! This module defines the Action trait and related types:
//! - Action: The core trait for capability handlers
//! - ActionInput: Step params handed to a handler
//! - StepContext: Immutable per-step snapshot of the run
//! - ActionResult: Handler outcome
//! - ActionRegistry: Closed, immutable name -> handler table

mod context;
mod input;
mod registry;
mod result;

use async_trait::async_trait;

pub use context::{ContextBuilder, StepContext, StepPosition};
pub use input::ActionInput;
pub use registry::{ActionRegistry, ActionRegistryBuilder, RegistryError};
pub use result::ActionResult;

/// Action trait - one named capability a plan step can invoke
///
/// Handlers report business failures through `ActionResult::failure`.
/// A panic is treated by the executor as a fatal failure of the step.
#[async_trait]
pub trait Action: Send + Sync {
    /// Get the action name (must be unique within a registry)
    fn name(&self) -> &str;

    /// Get the action description (for LLM planning)
    fn description(&self) -> &str;

    /// Get action metadata (param schema hints for planning)
    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description())
    }

    /// Execute the action
    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult;
}

/// Action metadata for planner
#[derive(Debug, Clone)]
pub struct ActionMeta {
    pub name: String,
    pub description: String,
    /// JSON schema of the params object.
    pub input_schema: serde_json::Value,
    /// JSON schema of the result data.
    pub output_schema: serde_json::Value,
}

impl ActionMeta {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::Value::Null,
            output_schema: serde_json::Value::Null,
        }
    }

    pub fn with_input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn with_output_schema(mut self, schema: serde_json::Value) -> Self {
        self.output_schema = schema;
        self
    }
}
