//! Core type definitions

mod category;
mod execution;
mod plan;
mod workflow;

pub use category::Category;
pub use execution::{
    Execution, ExecutionId, ExecutionInput, ExecutionStatus, ExecutionUpdate, IntegrationInfo,
    InvalidTransition, StepMetrics, StepResult,
};
pub use plan::{Complexity, Plan, Step, MAX_PLAN_STEPS};
pub use workflow::WorkflowRecord;
