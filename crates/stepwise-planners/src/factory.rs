//! LLM client factory for building clients from backend configuration.

use std::sync::Arc;

use thiserror::Error;

use stepwise_config::BackendConfig;

use crate::gemini::{GeminiClient, GeminiClientConfig};
use crate::llm::{HttpLlmClient, HttpLlmClientConfig, LlmClient, LlmError};

/// Errors that can occur when building an LLM client.
#[derive(Debug, Error)]
pub enum LlmBuildError {
    #[error("unknown backend kind: {0}")]
    UnknownKind(String),
    #[error("failed to build client: {0}")]
    Client(#[from] LlmError),
}

/// Read the backend's API key from its environment variable.
///
/// A missing key is not an error here: the client reports it as an
/// authentication failure on first use.
pub fn resolve_api_key(backend: &BackendConfig) -> Option<String> {
    std::env::var(backend.api_key_env())
        .ok()
        .filter(|key| !key.trim().is_empty())
}

/// Build an LLM client from the backend config section.
pub fn build_client_from_backend(
    backend: &BackendConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn LlmClient>, LlmBuildError> {
    match backend.kind.to_lowercase().as_str() {
        "gemini" | "google" => {
            let mut config = GeminiClientConfig {
                api_key: api_key.unwrap_or_default(),
                timeout_secs: backend.timeout_secs,
                ..GeminiClientConfig::default()
            };
            if let Some(endpoint) = &backend.endpoint {
                config.endpoint = endpoint.clone();
            }
            Ok(Arc::new(GeminiClient::new(config)?))
        }
        "openai" => {
            let mut config = HttpLlmClientConfig {
                api_key,
                timeout_secs: backend.timeout_secs,
                ..HttpLlmClientConfig::default()
            };
            if let Some(endpoint) = &backend.endpoint {
                config.endpoint = endpoint.clone();
            }
            Ok(Arc::new(HttpLlmClient::new(config)?))
        }
        other => Err(LlmBuildError::UnknownKind(other.to_string())),
    }
}
