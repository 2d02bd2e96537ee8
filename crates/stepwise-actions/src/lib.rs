//! # Stepwise Actions
//!
//! The built-in action vocabulary. Every handler is a deterministic
//! simulation: no network access, no randomness. Integration handlers
//! describe or pretend the provider call and report what would happen.

mod content;
mod data;
mod execute;
mod integration;
mod support;

use std::sync::Arc;

use stepwise_core::action::{Action, ActionRegistry, RegistryError};

pub use content::{AnalyzeInputAction, FormatOutputAction, GenerateContentAction, SendOutputAction};
pub use data::{ExtractDataAction, SummarizeContentAction, TransformDataAction, ValidateDataAction};
pub use execute::ExecuteActionAction;
pub use integration::{CollectCredentialsAction, ManageIntegrationsAction, SetupIntegrationAction};

/// All built-in handlers
pub fn builtin_actions() -> Vec<Arc<dyn Action>> {
    vec![
        Arc::new(AnalyzeInputAction),
        Arc::new(GenerateContentAction),
        Arc::new(FormatOutputAction),
        Arc::new(SendOutputAction),
        Arc::new(ExtractDataAction),
        Arc::new(SummarizeContentAction),
        Arc::new(ValidateDataAction),
        Arc::new(TransformDataAction),
        Arc::new(SetupIntegrationAction),
        Arc::new(ExecuteActionAction),
        Arc::new(CollectCredentialsAction),
        Arc::new(ManageIntegrationsAction),
    ]
}

/// Registry holding exactly the built-in handlers
pub fn default_registry() -> Result<ActionRegistry, RegistryError> {
    ActionRegistry::builder()
        .register_all(builtin_actions())
        .build()
}
