//! WorkflowStore implementations

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use stepwise_core::store::{StoreError, WorkflowStore};
use stepwise_core::types::WorkflowRecord;

/// In-memory implementation for development and testing
pub struct InMemoryWorkflowStore {
    workflows: RwLock<HashMap<String, WorkflowRecord>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryWorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn create_workflow(&self, workflow: WorkflowRecord) -> Result<WorkflowRecord, StoreError> {
        let mut workflows = self
            .workflows
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if workflows.contains_key(&workflow.id) {
            return Err(StoreError::InvalidState(format!(
                "workflow already exists: {}",
                workflow.id
            )));
        }
        workflows.insert(workflow.id.clone(), workflow.clone());
        Ok(workflow)
    }

    async fn get_workflow(&self, id: &str) -> Result<Option<WorkflowRecord>, StoreError> {
        let workflows = self
            .workflows
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(workflows.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_core::types::{Plan, Step};

    #[test]
    fn test_create_and_get() {
        tokio_test::block_on(async {
            let store = InMemoryWorkflowStore::new();
            let record = WorkflowRecord::new(
                "summarize this",
                Plan::new(vec![Step::new(1, "summarize_content", "Summarize")]),
            );
            let created = store.create_workflow(record).await.expect("create");
            assert!(created.id.starts_with("wf_"));

            let loaded = store
                .get_workflow(&created.id)
                .await
                .expect("get")
                .expect("present");
            assert_eq!(loaded, created);
            assert!(store.get_workflow("wf_missing").await.expect("get").is_none());

            let err = store.create_workflow(created).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidState(_)));
        });
    }
}
