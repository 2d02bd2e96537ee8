//! Plan generation for Stepwise.
//!
//! This crate provides:
//! - `LlmClient` implementations for Google Gemini and OpenAI-compatible APIs
//! - `PlanGenerator`: validated, cached, fallback-aware plan generation
//! - Deterministic fallback plans for when the backend is unavailable
//!
//! Use `build_client_from_backend` to create clients from configuration.

mod cache;
mod extract;
mod factory;
pub mod fallback;
mod gemini;
mod generator;
mod llm;
mod prompt;

pub use cache::{fingerprint, FingerprintCache};
pub use extract::{first_json_object, strip_code_fences};
pub use factory::{build_client_from_backend, resolve_api_key, LlmBuildError};
pub use fallback::fallback_plan;
pub use gemini::{GeminiClient, GeminiClientConfig};
pub use generator::{GeneratorStatus, PlanGenerator, PlanGeneratorConfig};
pub use llm::{HttpLlmClient, HttpLlmClientConfig, LlmClient, LlmError, LlmRequest, MockLlmClient};
pub use prompt::build_system_prompt;
