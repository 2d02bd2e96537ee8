//! Closed action registry
//!
//! The registry is assembled once through [`ActionRegistryBuilder`] and has no
//! mutation API afterwards, so the vocabulary a plan is validated against is
//! the vocabulary it is executed against.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use super::{Action, ActionMeta};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate action: {0}")]
    Duplicate(String),
    #[error("action name must not be empty")]
    EmptyName,
}

/// Immutable mapping from action name to handler
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::default()
    }

    /// Get an action by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    /// Membership test used by plan validation
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// All action names, sorted
    pub fn names(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }

    /// Metadata of every registered action, sorted by name
    pub fn metadata(&self) -> Vec<ActionMeta> {
        self.actions.values().map(|a| a.metadata()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

#[derive(Default)]
pub struct ActionRegistryBuilder {
    actions: Vec<Arc<dyn Action>>,
}

impl ActionRegistryBuilder {
    /// Add an action
    pub fn register(mut self, action: Arc<dyn Action>) -> Self {
        self.actions.push(action);
        self
    }

    /// Add several actions
    pub fn register_all(mut self, actions: impl IntoIterator<Item = Arc<dyn Action>>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Freeze the registry. Duplicate or empty names are rejected.
    pub fn build(self) -> Result<ActionRegistry, RegistryError> {
        let mut actions = BTreeMap::new();
        for action in self.actions {
            let name = action.name().trim().to_string();
            if name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if actions.contains_key(&name) {
                return Err(RegistryError::Duplicate(name));
            }
            actions.insert(name, action);
        }
        Ok(ActionRegistry { actions })
    }
}
