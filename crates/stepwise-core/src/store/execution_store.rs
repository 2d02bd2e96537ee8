use async_trait::async_trait;

use super::StoreError;
use crate::types::{Execution, ExecutionUpdate};

/// Execution lifecycle persistence
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Persist a new execution, returning the stored record
    async fn create_execution(&self, execution: Execution) -> Result<Execution, StoreError>;

    /// Apply a partial update. Returns `None` when the id is unknown.
    async fn update_execution(
        &self,
        id: &str,
        update: ExecutionUpdate,
    ) -> Result<Option<Execution>, StoreError>;

    async fn get_execution(&self, id: &str) -> Result<Option<Execution>, StoreError>;

    /// Most recent executions first
    async fn list_executions(&self, limit: usize) -> Result<Vec<Execution>, StoreError>;
}
