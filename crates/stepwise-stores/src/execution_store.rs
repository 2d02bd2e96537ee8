//! ExecutionStore implementations

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use stepwise_core::store::{ExecutionStore, StoreError};
use stepwise_core::types::{Execution, ExecutionUpdate};

#[derive(Default)]
struct Inner {
    executions: HashMap<String, Execution>,
    /// Insertion order, oldest first
    order: Vec<String>,
}

/// In-memory implementation for development and testing
pub struct InMemoryExecutionStore {
    inner: RwLock<Inner>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for InMemoryExecutionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn create_execution(&self, execution: Execution) -> Result<Execution, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if inner.executions.contains_key(&execution.id) {
            return Err(StoreError::InvalidState(format!(
                "execution already exists: {}",
                execution.id
            )));
        }
        inner.order.push(execution.id.clone());
        inner
            .executions
            .insert(execution.id.clone(), execution.clone());
        Ok(execution)
    }

    async fn update_execution(
        &self,
        id: &str,
        update: ExecutionUpdate,
    ) -> Result<Option<Execution>, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let Some(execution) = inner.executions.get_mut(id) else {
            return Ok(None);
        };
        execution
            .apply(update)
            .map_err(|e| StoreError::InvalidState(e.to_string()))?;
        Ok(Some(execution.clone()))
    }

    async fn get_execution(&self, id: &str) -> Result<Option<Execution>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(inner.executions.get(id).cloned())
    }

    async fn list_executions(&self, limit: usize) -> Result<Vec<Execution>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.executions.get(id))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use stepwise_core::types::{ExecutionInput, ExecutionStatus, Plan, Step};

    fn execution(prompt: &str) -> Execution {
        Execution::start(
            Plan::new(vec![Step::new(1, "analyze_input", "Analyze")]),
            ExecutionInput {
                prompt: prompt.to_string(),
                options: Value::Null,
            },
        )
    }

    #[test]
    fn test_create_get_and_update() {
        tokio_test::block_on(async {
            let store = InMemoryExecutionStore::new();
            let created = store
                .create_execution(execution("first"))
                .await
                .expect("create");

            let loaded = store
                .get_execution(&created.id)
                .await
                .expect("get")
                .expect("present");
            assert_eq!(loaded.status, ExecutionStatus::Running);

            let updated = store
                .update_execution(
                    &created.id,
                    ExecutionUpdate::completed(Vec::new(), json!({"success": true}), 9),
                )
                .await
                .expect("update")
                .expect("present");
            assert_eq!(updated.status, ExecutionStatus::Completed);
            assert_eq!(updated.execution_time_ms, 9);
        });
    }

    #[test]
    fn test_terminal_state_is_final() {
        tokio_test::block_on(async {
            let store = InMemoryExecutionStore::new();
            let created = store
                .create_execution(execution("first"))
                .await
                .expect("create");
            store
                .update_execution(
                    &created.id,
                    ExecutionUpdate::failed(Vec::new(), Value::Null, "boom", 1),
                )
                .await
                .expect("update");

            let err = store
                .update_execution(
                    &created.id,
                    ExecutionUpdate::completed(Vec::new(), Value::Null, 2),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::InvalidState(_)));

            let loaded = store.get_execution(&created.id).await.expect("get");
            assert_eq!(loaded.map(|e| e.status), Some(ExecutionStatus::Failed));
        });
    }

    #[test]
    fn test_unknown_id_and_duplicates() {
        tokio_test::block_on(async {
            let store = InMemoryExecutionStore::new();
            let missing = store
                .update_execution("exec_missing", ExecutionUpdate::default())
                .await
                .expect("update");
            assert!(missing.is_none());

            let created = store
                .create_execution(execution("first"))
                .await
                .expect("create");
            let err = store.create_execution(created).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidState(_)));
        });
    }

    #[test]
    fn test_list_newest_first_with_limit() {
        tokio_test::block_on(async {
            let store = InMemoryExecutionStore::new();
            for prompt in ["one", "two", "three"] {
                store
                    .create_execution(execution(prompt))
                    .await
                    .expect("create");
            }
            let listed = store.list_executions(2).await.expect("list");
            let prompts: Vec<_> = listed.iter().map(|e| e.input.prompt.as_str()).collect();
            assert_eq!(prompts, vec!["three", "two"]);
        });
    }
}
