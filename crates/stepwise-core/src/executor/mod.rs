//! Executor module
//!
//! The Executor is responsible for:
//! - Structural validation before any side effect
//! - Strictly sequential step execution with a per-step timeout
//! - Immutable context snapshots threaded from step to step
//! - Abort on the first failing step
//! - Recording the execution lifecycle in an [`ExecutionStore`]

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::task::JoinError;

use crate::action::{ActionInput, ActionRegistry, ActionResult, ContextBuilder, StepContext};
use crate::normalizer::{PlanNormalizer, StructuralError};
use crate::store::{ExecutionStore, StoreError};
use crate::types::{
    Execution, ExecutionId, ExecutionInput, ExecutionStatus, ExecutionUpdate, IntegrationInfo,
    Plan, Step, StepMetrics, StepResult,
};

/// Default per-step timeout
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_millis(30_000);

const MAX_LOG_TEXT_CHARS: usize = 2_000;

/// Actions whose results carry provider bookkeeping
const INTEGRATION_ACTIONS: &[&str] = &[
    "execute_action",
    "collect_credentials",
    "manage_integrations",
    "setup_integration",
];

fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Why a single step failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StepError {
    #[error("step timed out after {0}ms")]
    Timeout(u64),

    #[error("{0}")]
    Failed(String),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Executor errors
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("invalid plan structure: {0}")]
    Structural(#[from] StructuralError),

    #[error("failed to record execution: {0}")]
    Persistence(#[from] StoreError),

    #[error("workflow failed at step {step}: {source}")]
    StepFailed {
        step: u32,
        /// 0-based index of the failing step
        index: usize,
        #[source]
        source: StepError,
        execution: Box<Execution>,
    },
}

impl ExecuteError {
    /// The failed execution record, when one was created
    pub fn execution(&self) -> Option<&Execution> {
        match self {
            Self::StepFailed { execution, .. } => Some(execution),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::StepFailed {
                source: StepError::Timeout(_),
                ..
            }
        )
    }
}

/// Caller-supplied options for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    /// Scratch data visible to every step
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub shared: Map<String, Value>,
}

/// Result bundle of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub execution_id: ExecutionId,
    pub status: ExecutionStatus,
    pub plan: Plan,
    pub results: Vec<StepResult>,
    pub execution_time_ms: u64,
    pub completed_at: DateTime<Utc>,
    pub success: bool,
}

/// Sequential step executor
pub struct Executor {
    registry: Arc<ActionRegistry>,
    normalizer: PlanNormalizer,
    store: Arc<dyn ExecutionStore>,
    step_timeout: Duration,
}

impl Executor {
    pub fn new(registry: Arc<ActionRegistry>, store: Arc<dyn ExecutionStore>) -> Self {
        let normalizer = PlanNormalizer::from_registry(&registry);
        Self {
            registry,
            normalizer,
            store,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn step_timeout(&self) -> Duration {
        self.step_timeout
    }

    /// Run `plan` for the request `input`.
    pub async fn execute(
        &self,
        plan: &Plan,
        input: &str,
        options: ExecuteOptions,
    ) -> Result<ExecutionReport, ExecuteError> {
        self.normalizer.validate(plan)?;

        let started = Instant::now();
        let record = Execution::start(
            plan.clone(),
            ExecutionInput {
                prompt: input.to_string(),
                options: serde_json::to_value(&options).unwrap_or_default(),
            },
        )
        .with_plan_id(options.plan_id.clone());
        let mut record = self.store.create_execution(record).await?;
        let execution_id = record.id.clone();

        let contexts = ContextBuilder::new(execution_id.clone(), input)
            .user_id(options.user_id.as_deref())
            .session_id(options.session_id.as_deref())
            .shared(options.shared);
        tracing::info!(
            execution_id = %execution_id,
            steps = plan.len(),
            category = %contexts.category(),
            "execution started"
        );

        let total = plan.steps.len();
        let mut results: Vec<StepResult> = Vec::with_capacity(total);
        for (index, step) in plan.steps.iter().enumerate() {
            let ctx = contexts.snapshot(step.step, index, total, &results);
            let (result, failure) = self.run_step(step, ctx).await;
            results.push(result);

            if let Some(source) = failure {
                let message = format!("workflow failed at step {}: {}", step.step, source);
                tracing::error!(
                    execution_id = %execution_id,
                    step = step.step,
                    action = %step.action,
                    error = %truncate_for_log(&message, MAX_LOG_TEXT_CHARS),
                    "execution failed"
                );
                let output = json!({
                    "execution_id": execution_id,
                    "status": ExecutionStatus::Failed,
                    "error": message,
                    "completed_at": Utc::now(),
                    "success": false,
                });
                let update = ExecutionUpdate::failed(results, output, message, elapsed_ms(started));
                self.finish(&mut record, update).await;
                return Err(ExecuteError::StepFailed {
                    step: step.step,
                    index,
                    source,
                    execution: Box::new(record),
                });
            }
        }

        let report = ExecutionReport {
            execution_id: execution_id.clone(),
            status: ExecutionStatus::Completed,
            plan: plan.clone(),
            results,
            execution_time_ms: elapsed_ms(started),
            completed_at: Utc::now(),
            success: true,
        };
        let update = ExecutionUpdate::completed(
            report.results.clone(),
            serde_json::to_value(&report).unwrap_or_default(),
            report.execution_time_ms,
        );
        self.finish(&mut record, update).await;
        tracing::info!(
            execution_id = %execution_id,
            steps = report.results.len(),
            execution_time_ms = report.execution_time_ms,
            "execution completed"
        );
        Ok(report)
    }

    /// Look up one execution
    pub async fn status(&self, execution_id: &str) -> Result<Option<Execution>, StoreError> {
        self.store.get_execution(execution_id).await
    }

    /// Most recent executions first
    pub async fn history(&self, limit: usize) -> Result<Vec<Execution>, StoreError> {
        self.store.list_executions(limit).await
    }

    /// Apply the terminal update locally and persist it. Persistence failures
    /// are logged and never change the run outcome.
    async fn finish(&self, record: &mut Execution, update: ExecutionUpdate) {
        if let Err(err) = record.apply(update.clone()) {
            tracing::warn!(execution_id = %record.id, error = %err, "execution record not updated");
            return;
        }
        match self.store.update_execution(&record.id, update).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(execution_id = %record.id, "execution record missing on final update")
            }
            Err(err) => {
                tracing::warn!(
                    execution_id = %record.id,
                    error = %err,
                    "failed to persist execution result"
                )
            }
        }
    }

    async fn run_step(&self, step: &Step, ctx: StepContext) -> (StepResult, Option<StepError>) {
        let execution_id = ctx.execution_id.clone();
        let started = Instant::now();
        tracing::info!(
            execution_id = %execution_id,
            step = step.step,
            action = %step.action,
            "step execution started"
        );

        let outcome = match self.registry.get(&step.action) {
            Some(action) => {
                let input = ActionInput::new(step.params.clone());
                let handle = tokio::spawn(async move { action.run(input, ctx).await });
                // On timeout the handle is dropped; the handler task keeps running detached.
                match tokio::time::timeout(self.step_timeout, handle).await {
                    Err(_) => Err(StepError::Timeout(
                        u64::try_from(self.step_timeout.as_millis()).unwrap_or(u64::MAX),
                    )),
                    Ok(Err(join_error)) => Err(StepError::Panicked(panic_message(join_error))),
                    Ok(Ok(result)) => Ok(result),
                }
            }
            None => Err(StepError::Failed(format!("unknown action: {}", step.action))),
        };
        let duration_ms = elapsed_ms(started);

        let (result, failure) = match outcome {
            Ok(result) if result.success => (result, None),
            Ok(result) => {
                let reason = result
                    .error
                    .clone()
                    .unwrap_or_else(|| "handler reported failure".to_string());
                (result, Some(StepError::Failed(reason)))
            }
            Err(err) => (ActionResult::failure(err.to_string()), Some(err)),
        };

        match &failure {
            None => tracing::info!(
                execution_id = %execution_id,
                step = step.step,
                action = %step.action,
                duration_ms,
                "step execution completed"
            ),
            Some(err) => tracing::error!(
                execution_id = %execution_id,
                step = step.step,
                action = %step.action,
                duration_ms,
                error = %truncate_for_log(&err.to_string(), MAX_LOG_TEXT_CHARS),
                "step execution failed"
            ),
        }

        let success = failure.is_none();
        let error = failure.as_ref().map(|err| err.to_string());
        let integration = integration_info(&step.action, &result);
        let step_result = StepResult {
            step: step.step,
            action: step.action.clone(),
            description: step.description.clone(),
            success,
            data: result.data,
            error,
            metadata: result.metadata,
            duration_ms,
            completed_at: Utc::now(),
            integration,
            metrics: StepMetrics {
                execution_time_ms: duration_ms,
                success,
                retry_count: 0,
            },
        };
        (step_result, failure)
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn integration_info(action: &str, result: &ActionResult) -> Option<IntegrationInfo> {
    if !INTEGRATION_ACTIONS.contains(&action) {
        return None;
    }
    let data = &result.data;
    let provider = data
        .get("service_provider")
        .or_else(|| data.get("provider"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let status = data
        .get("status")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .unwrap_or_else(|| if result.success { "success" } else { "failed" }.to_string());
    Some(IntegrationInfo {
        action_type: action.to_string(),
        provider: provider.to_string(),
        integration_id: data
            .get("integration_id")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::action::{Action, ActionInput, StepContext};

    #[derive(Default)]
    struct MemoryStore {
        executions: Mutex<Vec<Execution>>,
        fail_create: bool,
        fail_update: bool,
    }

    impl MemoryStore {
        fn snapshot(&self) -> Vec<Execution> {
            self.executions.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl ExecutionStore for MemoryStore {
        async fn create_execution(&self, execution: Execution) -> Result<Execution, StoreError> {
            if self.fail_create {
                return Err(StoreError::Connection("store offline".to_string()));
            }
            self.executions.lock().expect("lock").push(execution.clone());
            Ok(execution)
        }

        async fn update_execution(
            &self,
            id: &str,
            update: ExecutionUpdate,
        ) -> Result<Option<Execution>, StoreError> {
            if self.fail_update {
                return Err(StoreError::Connection("store offline".to_string()));
            }
            let mut executions = self.executions.lock().expect("lock");
            let Some(execution) = executions.iter_mut().find(|e| e.id == id) else {
                return Ok(None);
            };
            execution
                .apply(update)
                .map_err(|e| StoreError::InvalidState(e.to_string()))?;
            Ok(Some(execution.clone()))
        }

        async fn get_execution(&self, id: &str) -> Result<Option<Execution>, StoreError> {
            Ok(self.snapshot().into_iter().find(|e| e.id == id))
        }

        async fn list_executions(&self, limit: usize) -> Result<Vec<Execution>, StoreError> {
            Ok(self.snapshot().into_iter().rev().take(limit).collect())
        }
    }

    /// Counts invocations and echoes how many earlier results it saw.
    struct CountingAction {
        name: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Action for CountingAction {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "counting action"
        }

        async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ActionResult::success(json!({
                "seen": ctx.previous_results.len(),
                "step": ctx.position.current_step,
                "params": Value::Object(input.params),
            }))
        }
    }

    struct FailingAction;

    #[async_trait]
    impl Action for FailingAction {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "always reports failure"
        }

        async fn run(&self, _input: ActionInput, _ctx: StepContext) -> ActionResult {
            ActionResult::failure("provider rejected request").with_data(json!({"attempted": true}))
        }
    }

    struct PanickingAction;

    #[async_trait]
    impl Action for PanickingAction {
        fn name(&self) -> &str {
            "panicking"
        }

        fn description(&self) -> &str {
            "panics"
        }

        async fn run(&self, _input: ActionInput, _ctx: StepContext) -> ActionResult {
            panic!("handler exploded");
        }
    }

    struct HangingAction;

    #[async_trait]
    impl Action for HangingAction {
        fn name(&self) -> &str {
            "hanging"
        }

        fn description(&self) -> &str {
            "never finishes in time"
        }

        async fn run(&self, _input: ActionInput, _ctx: StepContext) -> ActionResult {
            tokio::time::sleep(Duration::from_secs(30)).await;
            ActionResult::success(Value::Null)
        }
    }

    struct IntegrationAction;

    #[async_trait]
    impl Action for IntegrationAction {
        fn name(&self) -> &str {
            "execute_action"
        }

        fn description(&self) -> &str {
            "integration call"
        }

        async fn run(&self, _input: ActionInput, _ctx: StepContext) -> ActionResult {
            ActionResult::success(json!({
                "service_provider": "gmail",
                "integration_id": "int_1",
                "status": "completed"
            }))
        }
    }

    struct Fixture {
        calls: Arc<AtomicUsize>,
        store: Arc<MemoryStore>,
        executor: Executor,
    }

    fn fixture_with_store(store: MemoryStore) -> Fixture {
        let calls = Arc::new(AtomicUsize::new(0));
        let counting = |name: &str| -> Arc<dyn Action> {
            Arc::new(CountingAction {
                name: name.to_string(),
                calls: calls.clone(),
            })
        };
        let registry = ActionRegistry::builder()
            .register(counting("analyze_input"))
            .register(counting("generate_content"))
            .register(counting("send_output"))
            .register(Arc::new(FailingAction))
            .register(Arc::new(PanickingAction))
            .register(Arc::new(HangingAction))
            .register(Arc::new(IntegrationAction))
            .build()
            .expect("registry");
        let store = Arc::new(store);
        let executor = Executor::new(Arc::new(registry), store.clone())
            .with_step_timeout(Duration::from_millis(50));
        Fixture {
            calls,
            store,
            executor,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_store(MemoryStore::default())
    }

    fn plan(actions: &[&str]) -> Plan {
        Plan::new(
            actions
                .iter()
                .enumerate()
                .map(|(i, action)| Step::new(i as u32 + 1, *action, format!("run {action}")))
                .collect(),
        )
    }

    #[test]
    fn test_all_steps_succeed() {
        tokio_test::block_on(async {
            let f = fixture();
            let report = f
                .executor
                .execute(
                    &plan(&["analyze_input", "generate_content", "send_output"]),
                    "Summarize my notes",
                    ExecuteOptions::default(),
                )
                .await
                .expect("execution");

            assert!(report.success);
            assert_eq!(report.status, ExecutionStatus::Completed);
            assert_eq!(report.results.len(), 3);
            assert!(report.results.iter().all(|r| r.success));
            assert_eq!(f.calls.load(Ordering::SeqCst), 3);

            // each step saw exactly the results recorded before it
            let seen: Vec<_> = report.results.iter().map(|r| r.data["seen"].clone()).collect();
            assert_eq!(seen, vec![json!(0), json!(1), json!(2)]);
            assert!(report.results.iter().all(|r| r.metrics.retry_count == 0));

            let stored = f.store.snapshot();
            assert_eq!(stored.len(), 1);
            assert_eq!(stored[0].id, report.execution_id);
            assert_eq!(stored[0].status, ExecutionStatus::Completed);
            assert_eq!(stored[0].results.len(), 3);
            assert_eq!(stored[0].output.as_ref().map(|o| o["success"].clone()), Some(json!(true)));
        });
    }

    #[test]
    fn test_params_reach_the_handler() {
        tokio_test::block_on(async {
            let f = fixture();
            let plan = Plan::new(vec![Step::new(1, "send_output", "Send")
                .with_params(json!({"delivery_method": "direct"}))]);
            let report = f
                .executor
                .execute(&plan, "go", ExecuteOptions::default())
                .await
                .expect("execution");
            assert_eq!(
                report.results[0].data["params"]["delivery_method"],
                json!("direct")
            );
        });
    }

    #[test]
    fn test_failure_aborts_remaining_steps() {
        tokio_test::block_on(async {
            let f = fixture();
            let err = f
                .executor
                .execute(
                    &plan(&["analyze_input", "failing", "send_output"]),
                    "Send an email",
                    ExecuteOptions::default(),
                )
                .await
                .unwrap_err();

            assert_eq!(
                err.to_string(),
                "workflow failed at step 2: provider rejected request"
            );
            let ExecuteError::StepFailed {
                step,
                index,
                source,
                execution,
            } = err
            else {
                panic!("expected StepFailed");
            };
            assert_eq!((step, index), (2, 1));
            assert_eq!(source, StepError::Failed("provider rejected request".to_string()));
            assert_eq!(execution.status, ExecutionStatus::Failed);
            assert_eq!(execution.results.len(), 2);
            assert!(execution.results[0].success);
            assert!(!execution.results[1].success);
            assert_eq!(execution.results[1].data, json!({"attempted": true}));
            assert_eq!(f.calls.load(Ordering::SeqCst), 1);

            let stored = f.store.snapshot();
            assert_eq!(stored[0].status, ExecutionStatus::Failed);
            assert_eq!(
                stored[0].error.as_deref(),
                Some("workflow failed at step 2: provider rejected request")
            );
        });
    }

    #[test]
    fn test_panicking_handler_fails_step() {
        tokio_test::block_on(async {
            let f = fixture();
            let err = f
                .executor
                .execute(
                    &plan(&["panicking", "send_output"]),
                    "go",
                    ExecuteOptions::default(),
                )
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ExecuteError::StepFailed {
                    source: StepError::Panicked(ref msg),
                    ..
                } if msg == "handler exploded"
            ));
            let execution = err.execution().expect("execution record");
            assert_eq!(execution.status, ExecutionStatus::Failed);
            assert_eq!(execution.results.len(), 1);
            assert!(!execution.results[0].success);
            assert_eq!(f.calls.load(Ordering::SeqCst), 0);
        });
    }

    #[test]
    fn test_failure_at_last_step_keeps_every_result() {
        tokio_test::block_on(async {
            let f = fixture();
            let err = f
                .executor
                .execute(
                    &plan(&["analyze_input", "generate_content", "failing"]),
                    "go",
                    ExecuteOptions::default(),
                )
                .await
                .unwrap_err();

            assert!(matches!(err, ExecuteError::StepFailed { step: 3, index: 2, .. }));
            let execution = err.execution().expect("execution record");
            assert_eq!(execution.status, ExecutionStatus::Failed);
            assert_eq!(execution.results.len(), 3);
            assert!(execution.results[..2].iter().all(|r| r.success));
            assert!(!execution.results[2].success);
            assert_eq!(f.calls.load(Ordering::SeqCst), 2);
            assert_eq!(f.store.snapshot()[0].status, ExecutionStatus::Failed);
        });
    }

    #[tokio::test]
    async fn test_step_timeout_fails_execution() {
        let f = fixture();
        let err = f
            .executor
            .execute(
                &plan(&["analyze_input", "hanging", "send_output"]),
                "go",
                ExecuteOptions::default(),
            )
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "workflow failed at step 2: step timed out after 50ms");
        let execution = err.execution().expect("execution record");
        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert_eq!(execution.results.len(), 2);
        assert_eq!(f.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_structural_rejection_creates_no_record() {
        tokio_test::block_on(async {
            let f = fixture();
            let eleven: Vec<&str> = std::iter::repeat("analyze_input").take(11).collect();
            let err = f
                .executor
                .execute(&plan(&eleven), "go", ExecuteOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ExecuteError::Structural(StructuralError::TooManySteps(11))
            ));

            let err = f
                .executor
                .execute(
                    &plan(&["analyze_input", "delete_everything"]),
                    "go",
                    ExecuteOptions::default(),
                )
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ExecuteError::Structural(StructuralError::UnknownAction { index: 2, .. })
            ));

            assert_eq!(f.calls.load(Ordering::SeqCst), 0);
            assert!(f.store.snapshot().is_empty());
        });
    }

    #[test]
    fn test_create_failure_is_fatal() {
        tokio_test::block_on(async {
            let f = fixture_with_store(MemoryStore {
                fail_create: true,
                ..MemoryStore::default()
            });
            let err = f
                .executor
                .execute(&plan(&["analyze_input"]), "go", ExecuteOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ExecuteError::Persistence(_)));
            assert_eq!(f.calls.load(Ordering::SeqCst), 0);
        });
    }

    #[test]
    fn test_final_update_failure_still_returns_report() {
        tokio_test::block_on(async {
            let f = fixture_with_store(MemoryStore {
                fail_update: true,
                ..MemoryStore::default()
            });
            let report = f
                .executor
                .execute(&plan(&["analyze_input"]), "go", ExecuteOptions::default())
                .await
                .expect("execution");
            assert!(report.success);
            assert_eq!(f.store.snapshot()[0].status, ExecutionStatus::Running);
        });
    }

    #[test]
    fn test_integration_results_are_tagged() {
        tokio_test::block_on(async {
            let f = fixture();
            let report = f
                .executor
                .execute(
                    &plan(&["analyze_input", "execute_action"]),
                    "Send an email",
                    ExecuteOptions::default(),
                )
                .await
                .expect("execution");
            assert!(report.results[0].integration.is_none());
            let integration = report.results[1].integration.clone().expect("integration");
            assert_eq!(integration.action_type, "execute_action");
            assert_eq!(integration.provider, "gmail");
            assert_eq!(integration.integration_id.as_deref(), Some("int_1"));
            assert_eq!(integration.status, "completed");
        });
    }

    #[test]
    fn test_options_recorded_and_history_newest_first() {
        tokio_test::block_on(async {
            let f = fixture();
            let options = ExecuteOptions {
                user_id: Some("u-1".to_string()),
                plan_id: Some("wf_1".to_string()),
                ..ExecuteOptions::default()
            };
            let first = f
                .executor
                .execute(&plan(&["analyze_input"]), "first", options)
                .await
                .expect("first");
            let second = f
                .executor
                .execute(&plan(&["analyze_input"]), "second", ExecuteOptions::default())
                .await
                .expect("second");

            let stored = f
                .executor
                .status(&first.execution_id)
                .await
                .expect("status")
                .expect("record");
            assert_eq!(stored.plan_id.as_deref(), Some("wf_1"));
            assert_eq!(stored.input.prompt, "first");
            assert_eq!(stored.input.options["user_id"], json!("u-1"));

            let history = f.executor.history(10).await.expect("history");
            let ids: Vec<_> = history.iter().map(|e| e.id.clone()).collect();
            assert_eq!(ids, vec![second.execution_id, first.execution_id]);
            assert!(f.executor.status("exec_missing").await.expect("status").is_none());
        });
    }
}
