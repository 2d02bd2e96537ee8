//! Runtime app: one owner for the generator, executor and stores.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use stepwise_actions::default_registry;
use stepwise_config::{load_config, ConfigError, StepwiseConfig};
use stepwise_core::action::{ActionMeta, ActionRegistry, RegistryError};
use stepwise_core::executor::{ExecuteError, ExecuteOptions, ExecutionReport, Executor};
use stepwise_core::planner::{GenerateOptions, PlanError};
use stepwise_core::store::{CacheStore, ExecutionStore, StoreError, WorkflowStore};
use stepwise_core::types::{Execution, Plan, WorkflowRecord};
use stepwise_planners::{
    build_client_from_backend, resolve_api_key, GeneratorStatus, LlmBuildError, LlmClient,
    PlanGenerator, PlanGeneratorConfig,
};
use stepwise_stores::{InMemoryCacheStore, InMemoryExecutionStore, InMemoryWorkflowStore};

use crate::bootstrap::init_tracing_if_needed;

/// Runtime errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("action registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("llm client error: {0}")]
    LlmBuild(#[from] LlmBuildError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Execute(#[from] ExecuteError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Per-run options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the configured cache switch when set
    pub use_cache: Option<bool>,
    pub execute: ExecuteOptions,
}

/// Outcome of a plan-and-execute run
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Stored plan id; absent when the plan could not be persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    pub report: ExecutionReport,
}

/// Running app bundle created from config.
pub struct RuntimeApp {
    generator: PlanGenerator<Arc<dyn LlmClient>>,
    executor: Executor,
    workflow_store: Arc<dyn WorkflowStore>,
    cache_store: Arc<dyn CacheStore>,
    config: StepwiseConfig,
}

impl RuntimeApp {
    /// Create a runnable app from a single `stepwise.yaml`.
    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let config = load_config(path.as_ref())?;
        init_tracing_if_needed(&config.observability);
        Self::from_config(config)
    }

    /// Build the backend client from config and wire the built-in actions.
    pub fn from_config(config: StepwiseConfig) -> Result<Self, RuntimeError> {
        let backend = &config.providers.backend;
        let api_key = resolve_api_key(backend);
        if api_key.is_none() {
            tracing::warn!(
                env = %backend.api_key_env(),
                "backend API key is not set; plan generation will fail unless the backend is unavailable"
            );
        }
        let credentials_configured = api_key.is_some();
        let client = build_client_from_backend(backend, api_key)?;
        Self::with_components(config, client, default_registry()?, credentials_configured)
    }

    /// Wire an app around an explicit client and registry.
    pub fn with_components(
        config: StepwiseConfig,
        client: Arc<dyn LlmClient>,
        registry: ActionRegistry,
        credentials_configured: bool,
    ) -> Result<Self, RuntimeError> {
        let cache_store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let execution_store: Arc<dyn ExecutionStore> = Arc::new(InMemoryExecutionStore::new());
        let workflow_store: Arc<dyn WorkflowStore> = Arc::new(InMemoryWorkflowStore::new());

        let generator = PlanGenerator::new(
            client,
            PlanGeneratorConfig {
                model: config.planner.model.clone(),
                temperature: config.planner.temperature,
                provider: config.providers.backend.kind.clone(),
                credentials_configured,
            },
            &registry,
        )
        .with_cache(cache_store.clone());
        let executor = Executor::new(Arc::new(registry), execution_store)
            .with_step_timeout(Duration::from_millis(config.executor.step_timeout_ms));

        tracing::info!(
            app = %config.app.name,
            model = %config.planner.model,
            provider = %config.providers.backend.kind,
            actions = executor.registry().len(),
            step_timeout_ms = config.executor.step_timeout_ms,
            "runtime ready"
        );
        Ok(Self {
            generator,
            executor,
            workflow_store,
            cache_store,
            config,
        })
    }

    pub fn config(&self) -> &StepwiseConfig {
        &self.config
    }

    /// Generation options from config, with an optional cache override
    pub fn generate_options(&self, use_cache: Option<bool>) -> GenerateOptions {
        GenerateOptions {
            use_cache: use_cache.unwrap_or(self.config.planner.use_cache),
            cache_ttl_secs: Some(self.config.planner.cache_ttl_secs),
        }
    }

    /// Turn a request into a validated plan.
    pub async fn generate(&self, request: &str, use_cache: Option<bool>) -> Result<Plan, RuntimeError> {
        let options = self.generate_options(use_cache);
        Ok(self.generator.generate(request, &options).await?)
    }

    /// Generate a plan, store it, and execute it.
    ///
    /// Failing to store the plan is logged; the run continues without a plan id.
    pub async fn run(&self, request: &str, options: RunOptions) -> Result<RunOutcome, RuntimeError> {
        let plan = self.generate(request, options.use_cache).await?;

        let workflow_id = match self
            .workflow_store
            .create_workflow(WorkflowRecord::new(request, plan.clone()))
            .await
        {
            Ok(record) => Some(record.id),
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist workflow");
                None
            }
        };

        let mut execute = options.execute;
        execute.plan_id = workflow_id.clone();
        let report = self.executor.execute(&plan, request, execute).await?;
        Ok(RunOutcome {
            workflow_id,
            report,
        })
    }

    /// Execute an already generated plan.
    pub async fn execute(
        &self,
        plan: &Plan,
        request: &str,
        options: ExecuteOptions,
    ) -> Result<ExecutionReport, RuntimeError> {
        Ok(self.executor.execute(plan, request, options).await?)
    }

    pub async fn status(&self, execution_id: &str) -> Result<Option<Execution>, RuntimeError> {
        Ok(self.executor.status(execution_id).await?)
    }

    /// Most recent executions first
    pub async fn history(&self, limit: usize) -> Result<Vec<Execution>, RuntimeError> {
        Ok(self.executor.history(limit).await?)
    }

    pub async fn workflow(&self, id: &str) -> Result<Option<WorkflowRecord>, RuntimeError> {
        Ok(self.workflow_store.get_workflow(id).await?)
    }

    /// Drop expired plan cache entries; returns how many were removed.
    pub async fn sweep_cache(&self) -> Result<usize, RuntimeError> {
        let removed = self.cache_store.clear_expired().await?;
        if removed > 0 {
            tracing::debug!(removed, "expired plan cache entries removed");
        }
        Ok(removed)
    }

    pub fn generator_status(&self) -> GeneratorStatus {
        self.generator.status()
    }

    pub fn actions(&self) -> Vec<ActionMeta> {
        self.executor.registry().metadata()
    }
}
