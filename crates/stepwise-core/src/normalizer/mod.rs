//! Plan Normalizer module
//!
//! The normalizer is the single gate between planner output and the executor:
//! - Parse untrusted wire JSON into a typed [`Plan`]
//! - Normalize the complexity label
//! - Enforce structural invariants against the known action vocabulary
//!
//! Step indices in error messages are 1-based.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use crate::action::ActionRegistry;
use crate::types::{Complexity, Plan, Step, MAX_PLAN_STEPS};

/// Structural violations of an already typed plan
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructuralError {
    #[error("plan has no steps")]
    EmptyPlan,

    #[error("plan has {0} steps, at most {MAX_PLAN_STEPS} allowed")]
    TooManySteps(usize),

    #[error("step {index}: step number must be positive")]
    InvalidStepNumber { index: usize },

    #[error("step {index}: step number {step} does not follow {previous}")]
    NonIncreasingStep { index: usize, step: u32, previous: u32 },

    #[error("step {index}: unknown action '{action}'")]
    UnknownAction { index: usize, action: String },

    #[error("step {index}: description must not be empty")]
    MissingDescription { index: usize },
}

/// Violations of the plan wire schema
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("plan must be a JSON object")]
    NotAnObject,

    #[error("plan must contain a 'workflow' array")]
    MissingWorkflow,

    #[error("step {index}: must be an object")]
    InvalidStep { index: usize },

    #[error("step {index}: 'step' must be a positive integer")]
    InvalidStepField { index: usize },

    #[error("step {index}: 'action' must be a string")]
    InvalidAction { index: usize },

    #[error("step {index}: 'params' must be an object")]
    InvalidParams { index: usize },

    #[error("step {index}: 'description' must be a string")]
    InvalidDescription { index: usize },

    #[error("'estimated_time' must be a positive number")]
    InvalidEstimatedTime,

    #[error("'complexity' must be a string")]
    InvalidComplexity,

    #[error(transparent)]
    Structural(#[from] StructuralError),
}

/// Plan normalizer bound to a fixed action vocabulary
#[derive(Debug, Clone, Default)]
pub struct PlanNormalizer {
    known_actions: HashSet<String>,
}

impl PlanNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizer accepting exactly the actions of `registry`
    pub fn from_registry(registry: &ActionRegistry) -> Self {
        let mut normalizer = Self::new();
        for name in registry.names() {
            normalizer.register_action(name);
        }
        normalizer
    }

    /// Register a known action
    pub fn register_action(&mut self, name: impl Into<String>) {
        self.known_actions.insert(name.into());
    }

    pub fn knows(&self, action: &str) -> bool {
        self.known_actions.contains(action)
    }

    /// Parse and validate a wire plan
    pub fn normalize(&self, wire: &Value) -> Result<Plan, SchemaError> {
        let root = wire.as_object().ok_or(SchemaError::NotAnObject)?;
        let entries = root
            .get("workflow")
            .and_then(Value::as_array)
            .ok_or(SchemaError::MissingWorkflow)?;
        if entries.is_empty() {
            return Err(StructuralError::EmptyPlan.into());
        }
        if entries.len() > MAX_PLAN_STEPS {
            return Err(StructuralError::TooManySteps(entries.len()).into());
        }

        let steps = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| parse_step(i + 1, entry))
            .collect::<Result<Vec<_>, _>>()?;

        let estimated_time = match root.get("estimated_time") {
            None | Some(Value::Null) => None,
            Some(value) => match value.as_f64() {
                Some(seconds) if seconds > 0.0 => Some(seconds),
                _ => return Err(SchemaError::InvalidEstimatedTime),
            },
        };

        let complexity = match root.get("complexity") {
            None | Some(Value::Null) => Complexity::default(),
            Some(Value::String(label)) => Complexity::from_label(label),
            Some(_) => return Err(SchemaError::InvalidComplexity),
        };

        let plan = Plan {
            steps,
            estimated_time,
            complexity,
        };
        self.validate(&plan)?;
        Ok(plan)
    }

    /// Structural validation, run before any side effect
    pub fn validate(&self, plan: &Plan) -> Result<(), StructuralError> {
        if plan.steps.is_empty() {
            return Err(StructuralError::EmptyPlan);
        }
        if plan.steps.len() > MAX_PLAN_STEPS {
            return Err(StructuralError::TooManySteps(plan.steps.len()));
        }

        let mut previous = 0u32;
        for (i, step) in plan.steps.iter().enumerate() {
            let index = i + 1;
            if step.step == 0 {
                return Err(StructuralError::InvalidStepNumber { index });
            }
            if step.step <= previous {
                return Err(StructuralError::NonIncreasingStep {
                    index,
                    step: step.step,
                    previous,
                });
            }
            previous = step.step;

            if !self.knows(&step.action) {
                return Err(StructuralError::UnknownAction {
                    index,
                    action: step.action.clone(),
                });
            }
            if step.description.trim().is_empty() {
                return Err(StructuralError::MissingDescription { index });
            }
        }
        Ok(())
    }
}

fn parse_step(index: usize, entry: &Value) -> Result<Step, SchemaError> {
    let obj = entry
        .as_object()
        .ok_or(SchemaError::InvalidStep { index })?;

    let step = obj
        .get("step")
        .and_then(Value::as_u64)
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(SchemaError::InvalidStepField { index })?;

    let action = obj
        .get("action")
        .and_then(Value::as_str)
        .ok_or(SchemaError::InvalidAction { index })?;

    let params = obj
        .get("params")
        .and_then(Value::as_object)
        .cloned()
        .ok_or(SchemaError::InvalidParams { index })?;

    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .ok_or(SchemaError::InvalidDescription { index })?;

    Ok(Step {
        step,
        action: action.to_string(),
        params,
        description: description.to_string(),
    })
}
