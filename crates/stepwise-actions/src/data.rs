//! Extraction, summarization, validation and transformation handlers.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};
use stepwise_core::action::{Action, ActionInput, ActionMeta, ActionResult, StepContext};

use crate::support::{previous_data, timestamp, word_count};

const TECH_KEYWORDS: &[&str] = &[
    "api",
    "database",
    "server",
    "client",
    "framework",
    "library",
    "code",
];

const LANGUAGES: &[&str] = &["rust", "python", "javascript", "typescript", "java", "go"];

const SENSITIVE_MARKERS: &[&str] = &["password", "secret", "api_key", "token"];

fn contact_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .expect("static email pattern"),
            Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("static phone pattern"),
            Regex::new(r"https?://\S+").expect("static url pattern"),
        ]
    })
}

fn sentence_splitter() -> &'static Regex {
    static SPLITTER: OnceLock<Regex> = OnceLock::new();
    SPLITTER.get_or_init(|| Regex::new(r"[.!?]+").expect("static sentence pattern"))
}

fn all_matches(re: &Regex, text: &str) -> Vec<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Text a handler should work on: the request, else the previous step's data
fn source_text(ctx: &StepContext) -> String {
    if !ctx.input.trim().is_empty() {
        return ctx.input.clone();
    }
    match ctx.last_data() {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// extract_data: pull key points, technical terms or contact details out of text
pub struct ExtractDataAction;

#[async_trait]
impl Action for ExtractDataAction {
    fn name(&self) -> &str {
        "extract_data"
    }

    fn description(&self) -> &str {
        "Pull information from sources"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description()).with_input_schema(json!({
            "type": "object",
            "properties": {
                "extraction_type": {"type": "string", "enum": ["key_points", "technical_details", "contact_info", "raw"], "default": "key_points"},
                "categorize": {"type": "boolean", "default": false},
                "include_technical_details": {"type": "boolean", "default": false}
            }
        }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let extraction_type = input.str_or("extraction_type", "key_points");
        let source = source_text(&ctx);
        let lower = source.to_lowercase();

        let mut extracted = match extraction_type {
            "key_points" => {
                let sentences: Vec<&str> = sentence_splitter()
                    .split(&source)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                let points: Vec<Value> = sentences
                    .iter()
                    .take(5)
                    .enumerate()
                    .map(|(i, s)| json!({"id": i + 1, "content": s, "importance": 10 - i}))
                    .collect();
                json!({"key_points": points, "total_points_found": sentences.len()})
            }
            "technical_details" => {
                let elements: Vec<&str> = TECH_KEYWORDS
                    .iter()
                    .copied()
                    .filter(|k| lower.contains(k))
                    .collect();
                let complexity = match elements.len() {
                    0..=1 => "low",
                    2..=3 => "medium",
                    _ => "high",
                };
                json!({"technical_elements": elements, "complexity_level": complexity})
            }
            "contact_info" => {
                let [emails, phones, urls] = contact_patterns();
                json!({
                    "emails": all_matches(emails, &source),
                    "phones": all_matches(phones, &source),
                    "urls": all_matches(urls, &source),
                })
            }
            _ => {
                let words: Vec<&str> = source.split_whitespace().collect();
                json!({
                    "raw_content": source,
                    "content_length": source.chars().count(),
                    "word_count": words.len(),
                    "extracted_elements": words.iter().take(10).collect::<Vec<_>>(),
                })
            }
        };

        if input.get_bool("categorize").unwrap_or(false) {
            let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
            extracted["categories"] = json!({
                "business": has(&["business", "company"]),
                "technical": has(&["code", "api"]),
                "personal": has(&["resume", "profile"]),
                "creative": has(&["design", "creative"]),
            });
        }
        if input.get_bool("include_technical_details").unwrap_or(false) {
            let languages: Vec<&str> = LANGUAGES
                .iter()
                .copied()
                .filter(|l| lower.split(|c: char| !c.is_alphanumeric()).any(|w| w == *l))
                .collect();
            extracted["technical_analysis"] = json!({"programming_languages": languages});
        }

        ActionResult::success(extracted).with_metadata(json!({
            "extracted_at": timestamp(&ctx),
            "extraction_method": extraction_type,
            "source_length": source.chars().count(),
        }))
    }
}

/// summarize_content: condensed view of the previous step's content
pub struct SummarizeContentAction;

#[async_trait]
impl Action for SummarizeContentAction {
    fn name(&self) -> &str {
        "summarize_content"
    }

    fn description(&self) -> &str {
        "Create summaries and key points"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description()).with_input_schema(json!({
            "type": "object",
            "properties": {
                "summary_type": {"type": "string", "enum": ["basic", "executive", "technical"], "default": "basic"},
                "length": {"type": "string", "enum": ["short", "medium", "long"], "default": "medium"},
                "include_insights": {"type": "boolean", "default": false}
            }
        }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let summary_type = input.str_or("summary_type", "basic");
        let previous = previous_data(&ctx);
        let text = previous
            .get("content")
            .or_else(|| previous.get("raw_content"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .unwrap_or_else(|| ctx.input.clone());
        let words: Vec<&str> = text.split_whitespace().collect();

        let mut summary = match summary_type {
            "executive" => json!({
                "summary": "This analysis covers the key aspects of the provided content and highlights actionable insights.",
                "key_findings": [
                    "Primary objectives are clearly defined",
                    "Implementation strategy shows promise",
                ],
                "recommendations": [
                    "Continue with current approach",
                    "Monitor progress regularly",
                ],
            }),
            "technical" => json!({
                "summary": "Technical analysis completed",
                "technical_recommendations": [
                    "Implement monitoring",
                    "Add automated tests",
                ],
            }),
            _ => {
                let limit = match input.str_or("length", "medium") {
                    "short" => 50,
                    "long" => 200,
                    _ => 100,
                };
                let excerpt = words.iter().take(limit).copied().collect::<Vec<_>>().join(" ");
                json!({
                    "summary": excerpt,
                    "main_summary": format!(
                        "This content focuses on {} and related topics.",
                        words.iter().take(3).copied().collect::<Vec<_>>().join(" ")
                    ),
                    "word_count": words.len(),
                    "reading_time": words.len().div_ceil(200),
                    "main_topics": words.iter().take(5).collect::<Vec<_>>(),
                })
            }
        };

        if input.get_bool("include_insights").unwrap_or(false) {
            summary["insights"] = json!({
                "complexity_level": if words.len() > 200 { "high" } else { "medium" },
                "key_insights": ["Practical applications are well-defined"],
            });
        }

        ActionResult::success(summary).with_metadata(json!({
            "summarized_at": timestamp(&ctx),
            "summary_type": summary_type,
            "original_length": text.chars().count(),
        }))
    }
}

/// validate_data: completeness and hygiene checks over the previous step's data
pub struct ValidateDataAction;

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

#[async_trait]
impl Action for ValidateDataAction {
    fn name(&self) -> &str {
        "validate_data"
    }

    fn description(&self) -> &str {
        "Check data quality and accuracy"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description()).with_input_schema(json!({
            "type": "object",
            "properties": {
                "validation_type": {"type": "string", "enum": ["basic", "completeness"], "default": "basic"},
                "required_fields": {"type": "array", "items": {"type": "string"}},
                "check_formatting": {"type": "boolean", "default": false},
                "check_security": {"type": "boolean", "default": false}
            }
        }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let validation_type = input.str_or("validation_type", "basic");
        let data = previous_data(&ctx);

        let mut report = match validation_type {
            "completeness" => {
                let mut required = input.get_str_list("required_fields");
                if required.is_empty() {
                    required = vec!["content".into(), "format".into(), "structure".into()];
                }
                let missing: Vec<&String> = required
                    .iter()
                    .filter(|field| !is_present(data.get(field.as_str())))
                    .collect();
                let score = (required.len() - missing.len()) * 100 / required.len();
                json!({
                    "validation_passed": missing.is_empty(),
                    "completeness_score": score,
                    "missing_elements": missing,
                })
            }
            _ => {
                let present = is_present(Some(&data));
                json!({
                    "validation_passed": present,
                    "validation_score": if present { 100 } else { 0 },
                    "issues_found": if present {
                        Vec::<&str>::new()
                    } else {
                        vec!["previous step produced no data"]
                    },
                })
            }
        };

        if input.get_bool("check_formatting").unwrap_or(false) {
            report["formatting_check"] = json!({"structure_valid": data.is_object()});
        }
        if input.get_bool("check_security").unwrap_or(false) {
            let serialized = data.to_string().to_lowercase();
            let found: Vec<&str> = SENSITIVE_MARKERS
                .iter()
                .copied()
                .filter(|m| serialized.contains(m))
                .collect();
            report["security_check"] = json!({
                "no_sensitive_data": found.is_empty(),
                "markers_found": found,
            });
        }

        ActionResult::success(report).with_metadata(json!({
            "validated_at": timestamp(&ctx),
            "validation_method": validation_type,
        }))
    }
}

/// transform_data: convert the previous step's data between formats
pub struct TransformDataAction;

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn csv_cell(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw
    }
}

/// One header line of keys and one row per object
fn to_csv(value: &Value) -> (String, usize) {
    let rows: Vec<&Map<String, Value>> = match value {
        Value::Object(map) => vec![map],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    };
    let mut columns: Vec<&str> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }
    let mut lines = vec![columns.join(",")];
    for row in &rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| row.get(*c).map(csv_cell).unwrap_or_default())
            .collect();
        lines.push(cells.join(","));
    }
    (lines.join("\n"), rows.len())
}

#[async_trait]
impl Action for TransformDataAction {
    fn name(&self) -> &str {
        "transform_data"
    }

    fn description(&self) -> &str {
        "Convert data between formats"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description()).with_input_schema(json!({
            "type": "object",
            "properties": {
                "transform_type": {"type": "string", "enum": ["format_conversion", "structure_reorganization"], "default": "format_conversion"},
                "target_format": {"type": "string", "enum": ["json", "csv", "text"], "default": "json"},
                "preserve_structure": {"type": "boolean", "default": true}
            }
        }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let transform_type = input.str_or("transform_type", "format_conversion");
        let target = input.str_or("target_format", "json");
        let preserve = input.get_bool("preserve_structure").unwrap_or(true);
        let source = previous_data(&ctx);

        let mut transformed = match (transform_type, target) {
            ("format_conversion", "json") => {
                let formatted = match serde_json::to_string_pretty(&source) {
                    Ok(text) => text,
                    Err(err) => return ActionResult::failure(format!("json conversion failed: {err}")),
                };
                json!({"formatted_data": formatted, "format": "json", "structure_preserved": preserve})
            }
            ("format_conversion", "csv") => {
                let (csv, rows) = to_csv(&source);
                json!({"formatted_data": csv, "format": "csv", "rows_converted": rows})
            }
            ("format_conversion", other) => json!({
                "formatted_data": source,
                "format": other,
                "conversion_applied": true,
            }),
            ("structure_reorganization", _) => json!({
                "reorganized_content": {
                    "header": source.get("title").cloned().unwrap_or(json!("Reorganized Content")),
                    "body": source.get("content").cloned().unwrap_or_else(|| source.clone()),
                    "footer": source.get("metadata").cloned().unwrap_or(json!({})),
                },
                "original_structure_preserved": preserve,
            }),
            (other, _) => json!({
                "transformed_content": source,
                "transformation_applied": other,
                "format": target,
            }),
        };
        transformed["transformation_summary"] = json!({
            "source_format": json_type_name(&source),
            "target_format": target,
            "data_integrity_maintained": preserve,
        });

        ActionResult::success(transformed).with_metadata(json!({
            "transformed_at": timestamp(&ctx),
            "transformation_type": transform_type,
            "target_format": target,
            "word_count": source.as_str().map(word_count),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::test_support::{context, input, prior};

    #[test]
    fn test_extract_key_points_and_contacts() {
        tokio_test::block_on(async {
            let result = ExtractDataAction
                .run(input(json!({})), context("First point. Second point! Third?", &[]))
                .await;
            assert_eq!(result.data["total_points_found"], 3);
            assert_eq!(result.data["key_points"][1]["content"], "Second point");

            let result = ExtractDataAction
                .run(
                    input(json!({"extraction_type": "contact_info", "categorize": true})),
                    context(
                        "Reach the company at ops@example.com or 555-123-4567, see https://example.com/docs",
                        &[],
                    ),
                )
                .await;
            assert_eq!(result.data["emails"], json!(["ops@example.com"]));
            assert_eq!(result.data["phones"], json!(["555-123-4567"]));
            assert_eq!(result.data["urls"], json!(["https://example.com/docs"]));
            assert_eq!(result.data["categories"]["business"], true);
            assert_eq!(result.data["categories"]["creative"], false);
        });
    }

    #[test]
    fn test_summarize_previous_content() {
        tokio_test::block_on(async {
            let history = [prior(1, "generate_content", json!({"content": "alpha beta gamma delta"}))];
            let result = SummarizeContentAction
                .run(input(json!({"length": "short"})), context("summarize", &history))
                .await;
            assert_eq!(result.data["word_count"], 4);
            assert_eq!(result.data["reading_time"], 1);
            assert_eq!(result.data["summary"], "alpha beta gamma delta");
            assert_eq!(
                result.data["main_summary"],
                "This content focuses on alpha beta gamma and related topics."
            );
        });
    }

    #[test]
    fn test_validate_completeness_and_security() {
        tokio_test::block_on(async {
            let history = [prior(1, "format_output", json!({"content": "x", "format": "", "password": "hunter2"}))];
            let result = ValidateDataAction
                .run(
                    input(json!({"validation_type": "completeness", "check_security": true})),
                    context("check it", &history),
                )
                .await;
            assert!(result.success);
            assert_eq!(result.data["validation_passed"], false);
            assert_eq!(result.data["missing_elements"], json!(["format", "structure"]));
            assert_eq!(result.data["completeness_score"], 33);
            assert_eq!(result.data["security_check"]["no_sensitive_data"], false);

            let result = ValidateDataAction.run(input(json!({})), context("check it", &[])).await;
            assert_eq!(result.data["validation_passed"], false);
        });
    }

    #[test]
    fn test_transform_to_csv() {
        tokio_test::block_on(async {
            let history = [prior(1, "extract_data", json!({"name": "Ada, L.", "age": 36}))];
            let result = TransformDataAction
                .run(input(json!({"target_format": "csv"})), context("to csv", &history))
                .await;
            assert_eq!(result.data["formatted_data"], "age,name\n36,\"Ada, L.\"");
            assert_eq!(result.data["rows_converted"], 1);
            assert_eq!(result.data["transformation_summary"]["source_format"], "object");
        });
    }
}
