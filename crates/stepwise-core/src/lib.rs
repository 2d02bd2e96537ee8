//! # Stepwise Core
//!
//! Core abstractions for turning a natural-language request into a bounded
//! plan and running it step by step.
//!
//! ## Architecture
//!
//! ```text
//! Request -> Planner -> Plan -> PlanNormalizer -> Executor -> ExecutionStore
//!                                                    |
//!                                              ActionRegistry
//! ```
//!
//! ## Modules
//!
//! - `types`: Plan, Step, Execution, StepResult, Category
//! - `action`: Action trait, immutable registry, per-step context snapshots
//! - `normalizer`: wire schema and structural plan validation
//! - `planner`: Planner trait and request validation
//! - `executor`: sequential step executor with per-step timeout
//! - `store`: persistence traits

pub mod action;
pub mod executor;
pub mod normalizer;
pub mod planner;
pub mod store;
pub mod types;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::action::{
        Action, ActionInput, ActionMeta, ActionRegistry, ActionResult, RegistryError, StepContext,
    };
    pub use crate::executor::{ExecuteError, ExecuteOptions, ExecutionReport, Executor, StepError};
    pub use crate::normalizer::{PlanNormalizer, SchemaError, StructuralError};
    pub use crate::planner::{GenerateOptions, GenerationError, PlanError, Planner, ValidationError};
    pub use crate::store::{CacheStore, ExecutionStore, StoreError, WorkflowStore};
    pub use crate::types::{
        Category, Complexity, Execution, ExecutionStatus, ExecutionUpdate, Plan, Step, StepResult,
        WorkflowRecord,
    };
}
