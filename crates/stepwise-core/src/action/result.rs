//! ActionResult type definition

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome reported by a handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

impl ActionResult {
    /// Convenience: create a success result carrying data
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
            metadata: Value::Null,
        }
    }

    /// Convenience: create a business failure
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(message.into()),
            metadata: Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}
