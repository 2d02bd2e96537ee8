//! Request analysis, content generation and delivery handlers.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use stepwise_core::action::{Action, ActionInput, ActionMeta, ActionResult, StepContext};

use crate::support::{content_of, previous_data, timestamp, total_duration_ms, word_count};

/// Ordered keyword rules: (keywords, key element, requirement key, requirement value).
/// Later rules overwrite earlier requirement values for the same key.
fn analysis_rules() -> [(&'static [&'static str], &'static str, &'static str, Value); 5] {
    [
        (&["social media", "post"], "social_content", "platform", json!("social")),
        (&["email", "message"], "communication", "format", json!("email")),
        (&["document", "report"], "document_processing", "format", json!("document")),
        (&["code", "programming"], "code_analysis", "technical", json!(true)),
        (&["resume", "cv"], "professional_document", "format", json!("resume")),
    ]
}

/// analyze_input: keyword analysis of the original request
pub struct AnalyzeInputAction;

#[async_trait]
impl Action for AnalyzeInputAction {
    fn name(&self) -> &str {
        "analyze_input"
    }

    fn description(&self) -> &str {
        "Analyze and understand user input"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description()).with_input_schema(json!({
            "type": "object",
            "properties": {
                "input_type": {"type": "string", "description": "Kind of request, e.g. text or email_request", "default": "text"},
                "analysis_depth": {"type": "string", "enum": ["basic", "detailed"], "default": "basic"},
                "focus": {"type": "string", "default": "general"}
            }
        }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let lower = ctx.input.to_lowercase();
        let mut key_elements = Vec::new();
        let mut requirements = Map::new();
        for (keywords, element, key, value) in analysis_rules() {
            if keywords.iter().any(|k| lower.contains(k)) {
                key_elements.push(element);
                requirements.insert(key.to_string(), value);
            }
        }

        ActionResult::success(json!({
            "input_type": input.str_or("input_type", "text"),
            "content_length": ctx.input.chars().count(),
            "complexity": input.str_or("analysis_depth", "basic"),
            "focus_area": input.str_or("focus", "general"),
            "category": ctx.category.as_str(),
            "key_elements": key_elements,
            "requirements": requirements,
        }))
        .with_metadata(json!({"processed_at": timestamp(&ctx)}))
    }
}

const AI_AUTOMATION_POSTS: &[&str] = &[
    "Embrace the future of work with AI automation! Transform your daily tasks into seamless workflows that save time and boost productivity.",
    "AI automation is not just about efficiency. It frees up human creativity for what matters most.",
    "The magic happens when AI handles the routine and people focus on the creative work.",
];

const STARTUP_POSTS: &[&str] = &[
    "Building the future, one line of code at a time. Our startup journey is powered by innovation and determination.",
    "From idea to execution, that's the startup way! Every bug is a lesson, every feature is progress.",
    "Startups: where problems become opportunities and solutions change the world.",
];

const HASHTAGS: &[&str] = &["#AI", "#Automation", "#Innovation"];

const PROFESSIONAL_EMAIL: &str = "Subject: Re: Your Inquiry\n\nDear [Client Name],\n\n\
Thank you for reaching out regarding [topic]. I appreciate your interest and would be happy to assist you.\n\n\
I'm available to discuss this further at your convenience.\n\nBest regards,\n[Your Name]";

const INQUIRY_EMAIL: &str = "Subject: Response to Your Request\n\nHello,\n\n\
Thank you for your message. I've reviewed your inquiry and here's what I can help you with:\n\n\
[Main response content]\n\nFeel free to reach out if you have any questions.\n\nBest,\n[Your Name]";

const CODE_FEEDBACK: &str = "Code Review Summary:\n\nStrengths:\n- Clean code structure\n- Good variable naming\n\n\
Areas for improvement:\n- Add input validation\n- Add unit tests for better coverage\n\n\
Overall: good foundation with room for enhancement.";

const ACTION_ITEMS: &[&str] = &[
    "Review current processes and identify automation opportunities",
    "Implement the recommended solution within 2 weeks",
    "Schedule follow-up meeting to assess progress",
    "Document lessons learned for future reference",
    "Share results with stakeholder team",
];

const TODO_LIST: &str = "# To-Do List\n\n1. Plan and organize tasks\n2. Set priorities and deadlines\n\
3. Execute tasks systematically\n4. Review and adjust as needed\n5. Complete all objectives";

fn email_template(tone: &str) -> &'static str {
    match tone {
        "inquiry_response" => INQUIRY_EMAIL,
        _ => PROFESSIONAL_EMAIL,
    }
}

/// generate_content: template-driven text for posts, emails, lists and replies
pub struct GenerateContentAction;

impl GenerateContentAction {
    fn generate_one(&self, input: &ActionInput, ctx: &StepContext, index: usize) -> Value {
        let content_type = input.str_or("content_type", "response");
        let tone = input.str_or("tone", "neutral");
        let lower = ctx.input.to_lowercase();
        match content_type {
            "social_posts" => {
                let posts = if lower.contains("startup") || lower.contains("tech") {
                    STARTUP_POSTS
                } else {
                    AI_AUTOMATION_POSTS
                };
                let mut post = posts[index % posts.len()].to_string();
                if input.get_bool("include_hashtags").unwrap_or(false) {
                    post.push_str("\n\n");
                    post.push_str(&HASHTAGS.join(" "));
                }
                json!(post)
            }
            "email" => json!(email_template(tone)),
            "code_feedback" => json!(CODE_FEEDBACK),
            "action_items" => {
                let take = match input.str_or("length", "medium") {
                    "short" => 3,
                    "long" => ACTION_ITEMS.len(),
                    _ => 4,
                };
                json!(ACTION_ITEMS[..take])
            }
            "list" | "todo" | "checklist" => json!(TODO_LIST),
            _ if lower.contains("email") || lower.contains("message") => {
                json!(email_template(tone))
            }
            _ if ctx.input.trim().is_empty() => json!(format!(
                "Generated {content_type} content with {tone} tone."
            )),
            _ => json!(format!(
                "Generated {content_type} content based on: \"{}\"\n\n\
                 This content addresses your specific request.",
                ctx.input.trim()
            )),
        }
    }
}

#[async_trait]
impl Action for GenerateContentAction {
    fn name(&self) -> &str {
        "generate_content"
    }

    fn description(&self) -> &str {
        "Create text, posts, documents, code"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description())
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "content_type": {"type": "string", "enum": ["response", "social_posts", "email", "code_feedback", "action_items", "list", "todo", "checklist"], "default": "response"},
                    "tone": {"type": "string", "default": "neutral"},
                    "length": {"type": "string", "enum": ["short", "medium", "long"], "default": "medium"},
                    "platform": {"type": "string", "default": "general"},
                    "count": {"type": "integer", "description": "Number of pieces to generate", "default": 1},
                    "include_hashtags": {"type": "boolean", "default": false}
                }
            }))
            .with_output_schema(json!({
                "type": "object",
                "properties": {
                    "content": {"description": "Text, or a list when count > 1"},
                    "word_count": {"type": "integer"}
                }
            }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let count = input.get_u64("count").unwrap_or(1).clamp(1, 10) as usize;
        let generated: Vec<Value> = (0..count)
            .map(|index| self.generate_one(&input, &ctx, index))
            .collect();
        let words = generated
            .first()
            .and_then(Value::as_str)
            .map(word_count)
            .unwrap_or(0);
        let content = if count == 1 {
            generated.into_iter().next().unwrap_or(Value::Null)
        } else {
            Value::Array(generated)
        };

        ActionResult::success(json!({
            "content": content,
            "content_type": input.str_or("content_type", "response"),
            "parameters_used": {
                "tone": input.str_or("tone", "neutral"),
                "length": input.str_or("length", "medium"),
                "platform": input.str_or("platform", "general"),
                "count": count,
                "include_hashtags": input.get_bool("include_hashtags").unwrap_or(false),
            },
            "word_count": words,
        }))
        .with_metadata(json!({"generated_at": timestamp(&ctx)}))
    }
}

/// format_output: reshape the previous step's data for presentation
pub struct FormatOutputAction;

#[async_trait]
impl Action for FormatOutputAction {
    fn name(&self) -> &str {
        "format_output"
    }

    fn description(&self) -> &str {
        "Structure and format results"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description()).with_input_schema(json!({
            "type": "object",
            "properties": {
                "format": {"type": "string", "enum": ["structured", "email_template", "social_media", "report", "calendar", "review_report"], "default": "structured"},
                "sections": {"type": "array", "items": {"type": "string"}},
                "include_metadata": {"type": "boolean", "default": false},
                "professional": {"type": "boolean", "default": true},
                "platform_specific": {"type": "boolean", "default": false}
            }
        }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let format = input.str_or("format", "structured");
        let sections = input.get_str_list("sections");
        let include_metadata = input.get_bool("include_metadata").unwrap_or(false);
        let previous = previous_data(&ctx);
        let content = content_of(&previous);
        let content_text = previous
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut formatted = match format {
            "structured" => {
                let mut out = json!({
                    "title": format!("{} Output", ctx.category.as_str()),
                    "content": content,
                    "timestamp": timestamp(&ctx),
                });
                if include_metadata {
                    out["metadata"] = previous.get("metadata").cloned().unwrap_or(json!({}));
                }
                out
            }
            "email_template" => {
                let professional = input.get_bool("professional").unwrap_or(true);
                json!({
                    "subject": previous.get("subject").cloned().unwrap_or(json!("Professional Communication")),
                    "body": content,
                    "format": "html",
                    "signature": if professional { "\n\nBest regards,\n[Your Name]" } else { "" },
                })
            }
            "social_media" => match previous.get("content").and_then(Value::as_array) {
                Some(posts) => {
                    let platform = if input.get_bool("platform_specific").unwrap_or(false) {
                        "multi"
                    } else {
                        "general"
                    };
                    let posts: Vec<Value> = posts
                        .iter()
                        .enumerate()
                        .map(|(i, post)| {
                            let text = post.as_str().unwrap_or_default();
                            json!({
                                "id": i + 1,
                                "content": post,
                                "platform": platform,
                                "character_count": text.chars().count(),
                            })
                        })
                        .collect();
                    json!({"posts": posts})
                }
                None => json!({
                    "content": content,
                    "character_count": content_text.chars().count(),
                    "hashtags_included": content_text.contains('#'),
                    "platform_ready": true,
                }),
            },
            "report" => json!({
                "executive_summary": previous.get("summary").cloned()
                    .unwrap_or(json!("Summary of findings and recommendations")),
                "main_content": content,
                "sections": if sections.is_empty() {
                    json!(["overview", "analysis", "recommendations"])
                } else {
                    json!(sections)
                },
                "appendix": if include_metadata { previous.get("metadata").cloned() } else { None },
            }),
            "calendar" => json!({
                "calendar_type": "content_planning",
                "duration": "7_days",
                "entries": previous.get("content").cloned().unwrap_or(json!([])),
                "format_type": "structured",
            }),
            "review_report" => json!({
                "summary": "Comprehensive review completed",
                "findings": content,
                "priority_items": previous.get("priority_items").cloned().unwrap_or(json!([])),
                "recommendations": previous.get("recommendations").cloned().unwrap_or(json!([])),
                "next_steps": ["Review findings", "Implement changes", "Follow up"],
            }),
            other => json!({
                "formatted_content": content,
                "format_applied": other,
                "processing_complete": true,
            }),
        };
        if !sections.is_empty() {
            formatted["sections_included"] = json!(sections);
        }

        ActionResult::success(formatted).with_metadata(json!({
            "formatted_at": timestamp(&ctx),
            "format_type": format,
        }))
    }
}

/// send_output: package the final result with a summary of the run
pub struct SendOutputAction;

#[async_trait]
impl Action for SendOutputAction {
    fn name(&self) -> &str {
        "send_output"
    }

    fn description(&self) -> &str {
        "Deliver final results to user"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description()).with_input_schema(json!({
            "type": "object",
            "properties": {
                "delivery_method": {"type": "string", "enum": ["direct", "structured_response", "email_template", "comprehensive_report", "calendar_format"], "default": "direct"},
                "format": {"type": "string", "description": "Presentation hint, e.g. confirmation"},
                "include_tips": {"type": "boolean", "default": false},
                "include_appendix": {"type": "boolean", "default": false}
            }
        }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let method = input.str_or("delivery_method", "direct");
        let final_data = previous_data(&ctx);
        let total_ms = total_duration_ms(&ctx);
        let include_tips = input.get_bool("include_tips").unwrap_or(false);

        let mut result = match method {
            "structured_response" => json!({
                "content": final_data,
                "workflow_steps": ctx.previous_results.len(),
                "processing_time": total_ms,
            }),
            "email_template" => json!({
                "email": final_data,
                "ready_to_send": true,
                "customization_needed": ["recipient_name", "specific_details"],
            }),
            "comprehensive_report" => {
                let mut report = json!({
                    "report": final_data,
                    "executive_summary": "Comprehensive analysis completed successfully",
                });
                if input.get_bool("include_appendix").unwrap_or(false) {
                    let steps: Vec<Value> = ctx
                        .previous_results
                        .iter()
                        .map(|r| json!({"step": r.step, "action": r.action, "duration": r.duration_ms}))
                        .collect();
                    report["appendix"] = json!({
                        "processing_steps": steps,
                        "total_processing_time": total_ms,
                    });
                }
                report
            }
            "calendar_format" => json!({
                "calendar": final_data,
                "format": "weekly_view",
                "editable": true,
            }),
            _ => json!({
                "content": final_data,
                "format": input.str_or("format", "standard"),
            }),
        };
        if include_tips {
            result["tips"] = json!([
                "Save this content for future reference",
                "Review and edit before final use",
            ]);
        }

        let successful = ctx.previous_results.iter().filter(|r| r.success).count();
        ActionResult::success(json!({
            "status": "completed",
            "delivery_method": method,
            "timestamp": timestamp(&ctx),
            "result": result,
            "workflow_summary": {
                "total_steps": ctx.previous_results.len(),
                "successful_steps": successful,
                "total_time_ms": total_ms,
                "workflow_type": ctx.category.as_str(),
            },
        }))
        .with_metadata(json!({
            "delivered_at": timestamp(&ctx),
            "delivery_method": method,
            "final_step": ctx.is_last_step(),
        }))
    }
}
