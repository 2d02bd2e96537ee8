//! Plan and Step definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Hard upper bound on the number of steps in a plan.
pub const MAX_PLAN_STEPS: usize = 10;

/// Coarse difficulty label attached to a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl Complexity {
    /// Normalize a free-form label by substring matching.
    ///
    /// `low|simple|easy` map to `Low`, `high|complex|difficult` to `High`,
    /// anything else to `Medium`.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if ["low", "simple", "easy"].iter().any(|k| lower.contains(k)) {
            Self::Low
        } else if ["high", "complex", "difficult"]
            .iter()
            .any(|k| lower.contains(k))
        {
            Self::High
        } else {
            Self::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single unit of work in a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based ordinal, strictly increasing within a plan
    pub step: u32,
    /// Action name, must be present in the registry
    pub action: String,
    /// Action parameters
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Human-readable description
    pub description: String,
}

impl Step {
    /// Create a step with empty params
    pub fn new(step: u32, action: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            step,
            action: action.into(),
            params: Map::new(),
            description: description.into(),
        }
    }

    /// Replace params with the fields of a JSON object. Non-object values are ignored.
    pub fn with_params(mut self, params: Value) -> Self {
        if let Value::Object(map) = params {
            self.params = map;
        }
        self
    }

    /// Set a single param
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Ordered, bounded sequence of steps produced by a planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "workflow")]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<f64>,
    #[serde(default)]
    pub complexity: Complexity,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            estimated_time: None,
            complexity: Complexity::default(),
        }
    }

    pub fn with_estimated_time(mut self, seconds: f64) -> Self {
        self.estimated_time = Some(seconds);
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Find a step by its ordinal
    pub fn get_step(&self, step: u32) -> Option<&Step> {
        self.steps.iter().find(|s| s.step == step)
    }

    /// Action names in execution order
    pub fn actions(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.action.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complexity_label_normalization() {
        assert_eq!(Complexity::from_label("Low"), Complexity::Low);
        assert_eq!(Complexity::from_label("fairly simple"), Complexity::Low);
        assert_eq!(Complexity::from_label("EASY"), Complexity::Low);
        assert_eq!(Complexity::from_label("very complex"), Complexity::High);
        assert_eq!(Complexity::from_label("difficult"), Complexity::High);
        assert_eq!(Complexity::from_label("moderate"), Complexity::Medium);
        assert_eq!(Complexity::from_label(""), Complexity::Medium);
    }

    #[test]
    fn test_plan_uses_workflow_wire_name() {
        let plan = Plan::new(vec![Step::new(1, "analyze_input", "Analyze")
            .with_params(json!({"input_type": "text"}))])
        .with_estimated_time(15.0)
        .with_complexity(Complexity::Low);

        let value = serde_json::to_value(&plan).expect("serialize");
        assert_eq!(value["workflow"][0]["action"], "analyze_input");
        assert_eq!(value["workflow"][0]["params"]["input_type"], "text");
        assert_eq!(value["complexity"], "low");

        let back: Plan = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, plan);
    }

    #[test]
    fn test_plan_lookup_helpers() {
        let plan = Plan::new(vec![
            Step::new(1, "analyze_input", "Analyze"),
            Step::new(2, "send_output", "Send").with_param("format", "text"),
        ]);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.actions(), vec!["analyze_input", "send_output"]);
        assert_eq!(
            plan.get_step(2).and_then(|s| s.params.get("format")),
            Some(&json!("text"))
        );
        assert!(plan.get_step(3).is_none());
    }
}
