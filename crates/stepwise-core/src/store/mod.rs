//! Store module
//!
//! Persistence abstractions used by the generator and the executor:
//! - ExecutionStore: execution lifecycle records
//! - WorkflowStore: generated plans
//! - CacheStore: TTL key/value storage for the plan cache
//!
//! Note: Implementations are in the stepwise-stores crate

mod cache_store;
mod execution_store;
mod workflow_store;

pub use cache_store::{CacheEntry, CacheStore};
pub use execution_store::ExecutionStore;
pub use workflow_store::WorkflowStore;

use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
