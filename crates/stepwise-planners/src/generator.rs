use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use stepwise_core::action::ActionRegistry;
use stepwise_core::normalizer::PlanNormalizer;
use stepwise_core::planner::{
    validate_request, GenerateOptions, GenerationError, PlanError, Planner,
};
use stepwise_core::store::CacheStore;
use stepwise_core::types::Plan;

use crate::cache::{fingerprint, FingerprintCache};
use crate::extract::{first_json_object, strip_code_fences};
use crate::fallback::fallback_plan;
use crate::llm::{LlmClient, LlmError, LlmRequest};
use crate::prompt::build_system_prompt;

const MAX_LOG_TEXT_CHARS: usize = 500;

/// Generator config
#[derive(Debug, Clone)]
pub struct PlanGeneratorConfig {
    pub model: String,
    pub temperature: f32,
    /// Provider label, reported by `status()`
    pub provider: String,
    pub credentials_configured: bool,
}

impl Default for PlanGeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gemini-3-flash-preview".to_string(),
            temperature: 0.2,
            provider: "gemini".to_string(),
            credentials_configured: false,
        }
    }
}

/// Snapshot reported by [`PlanGenerator::status`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorStatus {
    pub model: String,
    pub provider: String,
    pub api_key_configured: bool,
}

/// LLM-backed plan generator with fingerprint cache and local fallback
pub struct PlanGenerator<C: LlmClient> {
    client: C,
    config: PlanGeneratorConfig,
    normalizer: PlanNormalizer,
    system_prompt: String,
    cache: Option<FingerprintCache>,
}

impl<C: LlmClient> PlanGenerator<C> {
    /// The action catalog and the accepted vocabulary both come from `registry`.
    pub fn new(client: C, config: PlanGeneratorConfig, registry: &ActionRegistry) -> Self {
        Self {
            client,
            config,
            normalizer: PlanNormalizer::from_registry(registry),
            system_prompt: build_system_prompt(&registry.metadata()),
            cache: None,
        }
    }

    pub fn with_cache(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(FingerprintCache::new(store));
        self
    }

    pub fn config(&self) -> &PlanGeneratorConfig {
        &self.config
    }

    pub fn status(&self) -> GeneratorStatus {
        GeneratorStatus {
            model: self.config.model.clone(),
            provider: self.config.provider.clone(),
            api_key_configured: self.config.credentials_configured,
        }
    }

    pub async fn generate(
        &self,
        request: &str,
        options: &GenerateOptions,
    ) -> Result<Plan, PlanError> {
        validate_request(request)?;

        let cache_key = match (&self.cache, options.use_cache) {
            (Some(cache), true) => match fingerprint(request, &self.config.model, options) {
                Ok(fp) => Some((cache, fp)),
                Err(err) => {
                    tracing::warn!(error = %err, "plan fingerprint failed; cache skipped");
                    None
                }
            },
            _ => None,
        };

        if let Some((cache, fp)) = &cache_key {
            if let Some(plan) = cache.get(fp).await {
                match self.normalizer.validate(&plan) {
                    Ok(()) => {
                        tracing::info!(fingerprint = %fp, steps = plan.len(), "plan cache hit");
                        return Ok(plan);
                    }
                    Err(err) => {
                        tracing::warn!(
                            fingerprint = %fp,
                            error = %err,
                            "cached plan no longer valid; regenerating"
                        );
                    }
                }
            }
        }

        let llm_request = LlmRequest {
            system: self.system_prompt.clone(),
            user: request.to_string(),
            model: self.config.model.clone(),
            temperature: self.config.temperature,
        };
        tracing::debug!(
            model = %llm_request.model,
            request = %truncate_for_log(request, MAX_LOG_TEXT_CHARS),
            "plan generation started"
        );

        let output = match self.client.complete(llm_request).await {
            Ok(output) => output,
            Err(err) if err.is_transient() => {
                tracing::warn!(error = %err, "backend unavailable; using fallback plan");
                return Ok(fallback_plan(request));
            }
            Err(err) => {
                tracing::error!(error = %err, "plan generation failed");
                return Err(classify(err).into());
            }
        };

        let plan = self.parse_plan(&output).map_err(|err| {
            tracing::error!(
                error = %err,
                output = %truncate_for_log(&output, MAX_LOG_TEXT_CHARS),
                "backend returned an unusable plan"
            );
            err
        })?;
        tracing::info!(
            steps = plan.len(),
            complexity = %plan.complexity,
            "plan generated"
        );

        if let Some((cache, fp)) = &cache_key {
            cache
                .put(fp, &plan, Duration::from_secs(options.cache_ttl_secs()))
                .await;
        }
        Ok(plan)
    }

    fn parse_plan(&self, output: &str) -> Result<Plan, GenerationError> {
        let cleaned = strip_code_fences(output);
        let json = first_json_object(&cleaned).ok_or_else(|| {
            GenerationError::MalformedResponse("no JSON object in response".to_string())
        })?;
        let value: Value = serde_json::from_str(json)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
        self.normalizer
            .normalize(&value)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl<C: LlmClient> Planner for PlanGenerator<C> {
    async fn plan(&self, request: &str, options: &GenerateOptions) -> Result<Plan, PlanError> {
        self.generate(request, options).await
    }
}

/// Map a non-transient backend failure to its user-facing class
fn classify(err: LlmError) -> GenerationError {
    match err {
        LlmError::Auth(_) => GenerationError::InvalidCredentials,
        LlmError::Quota(_) => GenerationError::QuotaExceeded,
        LlmError::Serialization(msg) => GenerationError::MalformedResponse(msg),
        other => GenerationError::Backend(other.to_string()),
    }
}

fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stepwise_core::action::{Action, ActionInput, ActionResult, StepContext};
    use stepwise_core::planner::ValidationError;
    use stepwise_core::types::{Complexity, Step};
    use stepwise_stores::InMemoryCacheStore;

    use crate::llm::MockLlmClient;

    struct Noop(&'static str);

    #[async_trait]
    impl Action for Noop {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "noop"
        }

        async fn run(&self, _input: ActionInput, _ctx: StepContext) -> ActionResult {
            ActionResult::success(Value::Null)
        }
    }

    fn registry() -> ActionRegistry {
        ActionRegistry::builder()
            .register_all(
                [
                    "analyze_input",
                    "generate_content",
                    "send_output",
                    "collect_credentials",
                    "execute_action",
                ]
                .into_iter()
                .map(|name| Arc::new(Noop(name)) as Arc<dyn Action>),
            )
            .build()
            .expect("registry")
    }

    const VALID_PLAN: &str = r#"{"workflow":[
        {"step":1,"action":"analyze_input","params":{"input_type":"text"},"description":"Analyze"},
        {"step":2,"action":"send_output","params":{},"description":"Deliver"}
    ],"estimated_time":12,"complexity":"Simple"}"#;

    fn generator(client: Arc<MockLlmClient>) -> PlanGenerator<Arc<MockLlmClient>> {
        PlanGenerator::new(client, PlanGeneratorConfig::default(), &registry())
    }

    #[test]
    fn test_valid_response_is_normalized() {
        tokio_test::block_on(async {
            let client = Arc::new(MockLlmClient::new(VALID_PLAN));
            let plan = generator(client.clone())
                .generate("summarize my notes", &GenerateOptions::default())
                .await
                .expect("plan");
            assert_eq!(plan.actions(), vec!["analyze_input", "send_output"]);
            assert_eq!(plan.complexity, Complexity::Low);
            assert_eq!(plan.estimated_time, Some(12.0));
            assert_eq!(client.calls(), 1);
        });
    }

    #[test]
    fn test_fenced_response_with_prose() {
        tokio_test::block_on(async {
            let response = format!("Here is your plan:\n```json\n{}\n```\nEnjoy!", VALID_PLAN);
            let client = Arc::new(MockLlmClient::new(response));
            let plan = generator(client)
                .generate("summarize my notes", &GenerateOptions::default())
                .await
                .expect("plan");
            assert_eq!(plan.len(), 2);
        });
    }

    #[test]
    fn test_cache_hit_skips_backend() {
        tokio_test::block_on(async {
            let client = Arc::new(MockLlmClient::new(VALID_PLAN));
            let generator =
                generator(client.clone()).with_cache(Arc::new(InMemoryCacheStore::new()));
            let options = GenerateOptions::default();

            let first = generator
                .generate("Summarize my notes", &options)
                .await
                .expect("first");
            let second = generator
                .generate("  summarize MY notes ", &options)
                .await
                .expect("second");
            assert_eq!(first, second);
            assert_eq!(client.calls(), 1);
        });
    }

    #[test]
    fn test_cache_disabled_calls_backend_each_time() {
        tokio_test::block_on(async {
            let client = Arc::new(MockLlmClient::new(VALID_PLAN));
            let generator =
                generator(client.clone()).with_cache(Arc::new(InMemoryCacheStore::new()));
            let options = GenerateOptions::no_cache();
            generator.generate("notes", &options).await.expect("first");
            generator.generate("notes", &options).await.expect("second");
            assert_eq!(client.calls(), 2);
        });
    }

    #[test]
    fn test_stale_cached_plan_is_a_miss() {
        tokio_test::block_on(async {
            let store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
            let options = GenerateOptions::default();
            let fp = fingerprint("notes", "gemini-3-flash-preview", &options).expect("fp");
            let stale = Plan::new(vec![Step::new(1, "retired_action", "Old step")]);
            FingerprintCache::new(store.clone())
                .put(&fp, &stale, Duration::from_secs(60))
                .await;

            let client = Arc::new(MockLlmClient::new(VALID_PLAN));
            let plan = generator(client.clone())
                .with_cache(store)
                .generate("notes", &options)
                .await
                .expect("plan");
            assert_eq!(plan.actions(), vec!["analyze_input", "send_output"]);
            assert_eq!(client.calls(), 1);
        });
    }

    #[test]
    fn test_request_boundaries_make_no_backend_call() {
        tokio_test::block_on(async {
            let client = Arc::new(MockLlmClient::new(VALID_PLAN));
            let generator = generator(client.clone());
            let options = GenerateOptions::no_cache();

            let err = generator.generate("   ", &options).await.unwrap_err();
            assert_eq!(err, PlanError::Validation(ValidationError::EmptyRequest));

            let err = generator
                .generate(&"a".repeat(2_001), &options)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                PlanError::Validation(ValidationError::TooLong { len: 2_001, .. })
            ));
            assert_eq!(client.calls(), 0);

            generator
                .generate(&"a".repeat(2_000), &options)
                .await
                .expect("2000 chars accepted");
            assert_eq!(client.calls(), 1);
        });
    }

    #[test]
    fn test_unavailable_backend_uses_fallback() {
        tokio_test::block_on(async {
            let client = Arc::new(MockLlmClient::failing(LlmError::from_status(
                503,
                "The model is overloaded. Please try again later.",
            )));
            let generator =
                generator(client.clone()).with_cache(Arc::new(InMemoryCacheStore::new()));
            let request = "Send an email to a@example.com with subject 'Hi' and message 'Hello'";

            let plan = generator
                .generate(request, &GenerateOptions::default())
                .await
                .expect("fallback plan");
            assert_eq!(
                plan.actions(),
                vec!["analyze_input", "collect_credentials", "execute_action", "send_output"]
            );
            let data = &plan.steps[2].params["action_data"];
            assert_eq!(data["to"], "a@example.com");
            assert_eq!(data["subject"], "Hi");
            assert_eq!(data["body"], "Hello");

            // fallback plans are not cached, so the backend is asked again
            let again = generator
                .generate(request, &GenerateOptions::default())
                .await
                .expect("fallback plan");
            assert_eq!(again, plan);
            assert_eq!(client.calls(), 2);
        });
    }

    #[test]
    fn test_backend_error_classification() {
        tokio_test::block_on(async {
            let cases = [
                (
                    LlmError::Auth("missing API key".into()),
                    GenerationError::InvalidCredentials,
                ),
                (
                    LlmError::from_status(429, "RESOURCE_EXHAUSTED"),
                    GenerationError::QuotaExceeded,
                ),
                (
                    LlmError::Serialization("eof".into()),
                    GenerationError::MalformedResponse("eof".into()),
                ),
            ];
            for (llm_error, expected) in cases {
                let client = Arc::new(MockLlmClient::failing(llm_error));
                let err = generator(client)
                    .generate("notes", &GenerateOptions::no_cache())
                    .await
                    .unwrap_err();
                assert_eq!(err, PlanError::Generation(expected));
            }

            let client = Arc::new(MockLlmClient::failing(LlmError::Http("reset".into())));
            let err = generator(client)
                .generate("notes", &GenerateOptions::no_cache())
                .await
                .unwrap_err();
            assert!(matches!(err, PlanError::Generation(GenerationError::Backend(_))));
        });
    }

    #[test]
    fn test_malformed_responses() {
        tokio_test::block_on(async {
            for response in [
                "I cannot help with that.",
                r#"{"workflow": [}"#,
                r#"{"workflow":[{"step":1,"action":"launch_rocket","params":{},"description":"Go"}]}"#,
            ] {
                let client = Arc::new(MockLlmClient::new(response));
                let err = generator(client)
                    .generate("notes", &GenerateOptions::no_cache())
                    .await
                    .unwrap_err();
                assert!(
                    matches!(
                        err,
                        PlanError::Generation(GenerationError::MalformedResponse(_))
                    ),
                    "response {response:?} gave {err:?}"
                );
            }
        });
    }

    #[test]
    fn test_step_without_params_object_is_malformed() {
        tokio_test::block_on(async {
            for response in [
                r#"{"workflow":[{"step":1,"action":"analyze_input","description":"Analyze"}]}"#,
                r#"{"workflow":[{"step":1,"action":"analyze_input","params":null,"description":"Analyze"}]}"#,
            ] {
                let client = Arc::new(MockLlmClient::new(response));
                let generator =
                    generator(client.clone()).with_cache(Arc::new(InMemoryCacheStore::new()));
                let err = generator
                    .generate("notes", &GenerateOptions::default())
                    .await
                    .unwrap_err();
                match err {
                    PlanError::Generation(GenerationError::MalformedResponse(message)) => {
                        assert!(message.contains("'params' must be an object"), "{message}");
                    }
                    other => panic!("response {response:?} gave {other:?}"),
                }

                // nothing was cached, so the backend is asked again
                assert!(generator
                    .generate("notes", &GenerateOptions::default())
                    .await
                    .is_err());
                assert_eq!(client.calls(), 2);
            }
        });
    }

    #[test]
    fn test_status_report() {
        let client = Arc::new(MockLlmClient::new(VALID_PLAN));
        let generator = PlanGenerator::new(
            client,
            PlanGeneratorConfig {
                credentials_configured: true,
                ..PlanGeneratorConfig::default()
            },
            &registry(),
        );
        let status = generator.status();
        assert_eq!(status.model, "gemini-3-flash-preview");
        assert_eq!(status.provider, "gemini");
        assert!(status.api_key_configured);
    }
}
