//! # Stepwise Stores
//!
//! In-memory store implementations for the Stepwise runtime.
//!
//! This crate provides:
//! - InMemory ExecutionStore
//! - InMemory WorkflowStore
//! - InMemory CacheStore

mod cache_store;
mod execution_store;
mod workflow_store;

pub use cache_store::InMemoryCacheStore;
pub use execution_store::InMemoryExecutionStore;
pub use workflow_store::InMemoryWorkflowStore;

// Re-export core traits for convenience
pub use stepwise_core::store::{CacheEntry, CacheStore, ExecutionStore, StoreError, WorkflowStore};
