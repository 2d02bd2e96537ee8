//! Fingerprint-keyed plan cache.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};
use stepwise_core::planner::GenerateOptions;
use stepwise_core::store::CacheStore;
use stepwise_core::types::Plan;

#[derive(Serialize)]
struct FingerprintInput<'a> {
    prompt: String,
    model: &'a str,
    options: &'a GenerateOptions,
}

/// sha256 hex of the normalized request, model id and options.
///
/// Requests differing only in case or surrounding whitespace share a fingerprint.
pub fn fingerprint(
    request: &str,
    model: &str,
    options: &GenerateOptions,
) -> Result<String, serde_json::Error> {
    let input = FingerprintInput {
        prompt: request.trim().to_lowercase(),
        model,
        options,
    };
    let payload = serde_json::to_vec(&input)?;
    let mut hasher = Sha256::new();
    hasher.update(&payload);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Plan cache over a [`CacheStore`]. Store failures degrade to cache misses.
#[derive(Clone)]
pub struct FingerprintCache {
    store: Arc<dyn CacheStore>,
}

impl FingerprintCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, fingerprint: &str) -> Option<Plan> {
        let value = match self.store.get_cache_value(fingerprint).await {
            Ok(value) => value?,
            Err(err) => {
                tracing::warn!(fingerprint = %fingerprint, error = %err, "plan cache read failed");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(plan) => Some(plan),
            Err(err) => {
                tracing::warn!(fingerprint = %fingerprint, error = %err, "cached plan is unreadable");
                None
            }
        }
    }

    pub async fn put(&self, fingerprint: &str, plan: &Plan, ttl: Duration) {
        let value = match serde_json::to_value(plan) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(fingerprint = %fingerprint, error = %err, "plan not cacheable");
                return;
            }
        };
        if let Err(err) = self.store.set_cache_value(fingerprint, value, ttl).await {
            tracing::warn!(fingerprint = %fingerprint, error = %err, "plan cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_normalizes_request() {
        let options = GenerateOptions::default();
        let a = fingerprint("  Send an EMAIL ", "gemini", &options).expect("fingerprint");
        let b = fingerprint("send an email", "gemini", &options).expect("fingerprint");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_depends_on_model_and_options() {
        let options = GenerateOptions::default();
        let base = fingerprint("send an email", "gemini-a", &options).expect("fingerprint");
        let other_model = fingerprint("send an email", "gemini-b", &options).expect("fingerprint");
        let other_options = fingerprint(
            "send an email",
            "gemini-a",
            &GenerateOptions {
                cache_ttl_secs: Some(60),
                ..GenerateOptions::default()
            },
        )
        .expect("fingerprint");
        assert_ne!(base, other_model);
        assert_ne!(base, other_options);
    }
}
