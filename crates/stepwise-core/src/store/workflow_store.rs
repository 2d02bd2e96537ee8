use async_trait::async_trait;

use super::StoreError;
use crate::types::WorkflowRecord;

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn create_workflow(&self, workflow: WorkflowRecord) -> Result<WorkflowRecord, StoreError>;

    async fn get_workflow(&self, id: &str) -> Result<Option<WorkflowRecord>, StoreError>;
}
