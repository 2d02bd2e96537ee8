//! Instruction preamble sent with every plan request.

use std::collections::HashSet;
use std::fmt::Write;

use serde_json::Value;
use stepwise_core::action::ActionMeta;
use stepwise_core::types::MAX_PLAN_STEPS;

/// Steps the backend is asked to stay within; the hard cap is `MAX_PLAN_STEPS`.
const TARGET_PLAN_STEPS: usize = 7;

const INTEGRATION_PATTERNS: &str = "\
Integration Patterns:
- email: analyze_input -> collect_credentials (service_type email) -> execute_action (send_email) -> send_output
- social: analyze_input -> collect_credentials (service_type social) -> execute_action (post_social) -> send_output
- storage: analyze_input -> collect_credentials (service_type storage) -> execute_action (upload_file) -> send_output
";

const OUTPUT_FORMAT: &str = r#"Output Format (JSON only):
{"workflow":[{"step":1,"action":"analyze_input","params":{"input_type":"text","analysis_depth":"basic"},"description":"Analyze the user's request"}],"estimated_time":15,"complexity":"medium"}
"#;

/// Build the fixed preamble: planning rules, action catalog, output format.
pub fn build_system_prompt(actions: &[ActionMeta]) -> String {
    let mut system = String::new();
    system.push_str(
        "You are a workflow planner. Convert the user's request into a short, ordered workflow \
         of actions that performs the task.\n",
    );
    system.push_str("\nPlanning Rules:\n");
    system.push_str("1) Return ONLY one valid JSON object, no explanations or markdown.\n");
    let _ = writeln!(
        system,
        "2) Use at most {} steps (never more than {}).",
        TARGET_PLAN_STEPS, MAX_PLAN_STEPS
    );
    system.push_str("3) Number steps from 1, strictly increasing.\n");
    system.push_str("4) Every step needs step, action, params (object) and description.\n");
    system.push_str("5) Do not invent action names not listed in Action Catalog.\n");
    system.push_str("6) For third-party services use collect_credentials before execute_action.\n");
    system.push_str("7) complexity is one of low, medium, high; estimated_time is in seconds.\n");

    system.push_str("\nAction Catalog:\n");
    for action in actions {
        append_action_catalog_entry(&mut system, action);
    }
    system.push('\n');
    system.push_str(INTEGRATION_PATTERNS);
    system.push('\n');
    system.push_str(OUTPUT_FORMAT);
    system
}

fn append_action_catalog_entry(buf: &mut String, action: &ActionMeta) {
    let _ = writeln!(buf, "- name: {}", action.name);
    let _ = writeln!(buf, "  description: {}", action.description);
    append_schema_fields(buf, "params", &action.input_schema);
}

fn append_schema_fields(buf: &mut String, label: &str, schema: &Value) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        let _ = writeln!(buf, "  {}: []", label);
        return;
    };

    let required = schema_required_fields(schema);
    let mut keys: Vec<&str> = properties.keys().map(String::as_str).collect();
    keys.sort_unstable();

    let _ = writeln!(buf, "  {}:", label);
    for key in keys {
        let Some(field_schema) = properties.get(key) else {
            continue;
        };
        let type_hint = field_schema
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("any");
        let required_label = if required.contains(key) {
            "required"
        } else {
            "optional"
        };
        let mut extras = Vec::new();
        if let Some(desc) = field_schema.get("description").and_then(Value::as_str) {
            extras.push(format!("desc={}", desc));
        }
        if let Some(values) = field_schema.get("enum").and_then(Value::as_array) {
            let values: Vec<&str> = values.iter().filter_map(Value::as_str).collect();
            extras.push(format!("one of {}", values.join("|")));
        }
        if let Some(default) = field_schema.get("default") {
            extras.push(format!("default={}", default));
        }

        if extras.is_empty() {
            let _ = writeln!(buf, "    - {} ({}, {})", key, type_hint, required_label);
        } else {
            let _ = writeln!(
                buf,
                "    - {} ({}, {}): {}",
                key,
                type_hint,
                required_label,
                extras.join("; ")
            );
        }
    }
}

fn schema_required_fields(schema: &Value) -> HashSet<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect::<HashSet<_>>()
        })
        .unwrap_or_default()
}
