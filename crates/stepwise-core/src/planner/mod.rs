//! Planner module
//!
//! The Planner turns a natural-language request into a bounded [`Plan`].
//!
//! The Planner does NOT handle:
//! - Executing steps
//! - Persisting executions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Plan;

/// Longest accepted request, in characters
pub const MAX_REQUEST_CHARS: usize = 2_000;

/// Default lifetime of a cached plan (24h)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Request rejected before any backend call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("request must not be empty")]
    EmptyRequest,

    #[error("request is too long ({len} characters, at most {max})")]
    TooLong { len: usize, max: usize },
}

/// Backend or parse failure during plan generation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("invalid or missing backend credentials")]
    InvalidCredentials,

    #[error("backend quota exceeded")]
    QuotaExceeded,

    #[error("malformed plan from backend: {0}")]
    MalformedResponse(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Planner errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Per-call generation options. Serialized into the cache fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
}

impl GenerateOptions {
    pub fn no_cache() -> Self {
        Self {
            use_cache: false,
            cache_ttl_secs: None,
        }
    }

    pub fn cache_ttl_secs(&self) -> u64 {
        self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS)
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            use_cache: default_use_cache(),
            cache_ttl_secs: None,
        }
    }
}

fn default_use_cache() -> bool {
    true
}

/// Planner trait - generates execution plans from a request
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, request: &str, options: &GenerateOptions) -> Result<Plan, PlanError>;
}

/// Reject empty or over-long requests. Length counts characters, not bytes.
pub fn validate_request(request: &str) -> Result<(), ValidationError> {
    if request.trim().is_empty() {
        return Err(ValidationError::EmptyRequest);
    }
    let len = request.chars().count();
    if len > MAX_REQUEST_CHARS {
        return Err(ValidationError::TooLong {
            len,
            max: MAX_REQUEST_CHARS,
        });
    }
    Ok(())
}
