//! # Stepwise Config
//!
//! Single-file configuration for Stepwise. One `stepwise.yaml` configures the
//! planner, executor, LLM backend, stores and observability. Every field has a
//! default, so an empty file is a valid config.

mod loader;

pub use loader::{load_config, parse_config, ConfigError};

use serde::Deserialize;

/// Provider kinds the runtime knows how to build
pub const SUPPORTED_BACKEND_KINDS: &[&str] = &["gemini", "openai"];

/// Store backends the runtime knows how to build
pub const SUPPORTED_STORE_BACKENDS: &[&str] = &["in_memory"];

/// Top-level configuration schema for Stepwise.
#[derive(Debug, Clone, Deserialize)]
pub struct StepwiseConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub stores: StoresConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for StepwiseConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            planner: PlannerConfig::default(),
            executor: ExecutorConfig::default(),
            providers: ProvidersConfig::default(),
            stores: StoresConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_env(),
        }
    }
}

fn default_app_name() -> String {
    "stepwise".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

/// Plan generation settings
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Consult and fill the plan cache unless a call opts out.
    #[serde(default = "default_true")]
    pub use_cache: bool,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            use_cache: true,
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    86_400
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_step_timeout_ms")]
    pub step_timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: default_step_timeout_ms(),
        }
    }
}

fn default_step_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Reasoning backend connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_kind")]
    pub kind: String,
    /// Overrides the provider's public endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            endpoint: None,
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Configured key variable, or the provider's conventional one.
    pub fn api_key_env(&self) -> String {
        if let Some(name) = self.api_key_env.as_ref().filter(|n| !n.trim().is_empty()) {
            return name.clone();
        }
        match self.kind.to_lowercase().as_str() {
            "openai" => "OPENAI_API_KEY".to_string(),
            _ => "GEMINI_API_KEY".to_string(),
        }
    }
}

fn default_backend_kind() -> String {
    "gemini".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoresConfig {
    #[serde(default = "default_store_backend")]
    pub backend: String,
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
        }
    }
}

fn default_store_backend() -> String {
    "in_memory".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
