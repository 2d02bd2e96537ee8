//! execute_action: simulated side effects on integrated services.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use stepwise_core::action::{Action, ActionInput, ActionMeta, ActionResult, StepContext};

use crate::support::{reference_id, timestamp};

type Outcome = Result<Value, String>;

fn text<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

fn send_email(provider: &str, data: &Map<String, Value>, ctx: &StepContext) -> Outcome {
    let label = match provider {
        "gmail" => "Gmail API",
        "smtp" => "SMTP",
        "sendgrid" => "SendGrid",
        other => return Err(format!("Unsupported email provider: {other}")),
    };
    Ok(json!({
        "provider": label,
        "status": "sent",
        "message_id": reference_id(provider, ctx),
        "to": text(data, "to"),
        "subject": text(data, "subject"),
        "from": text(data, "from"),
        "sent_at": timestamp(ctx),
    }))
}

fn post_social(provider: &str, data: &Map<String, Value>, ctx: &StepContext) -> Outcome {
    let (label, prefix) = match provider {
        "twitter" => ("Twitter API v2", "tweet"),
        "facebook" => ("Facebook Graph API", "fb"),
        "linkedin" => ("LinkedIn API", "li"),
        other => return Err(format!("Unsupported social media provider: {other}")),
    };
    Ok(json!({
        "provider": label,
        "status": "posted",
        "post_id": reference_id(prefix, ctx),
        "content": text(data, "content"),
        "hashtags": data.get("hashtags").cloned().unwrap_or(json!([])),
        "posted_at": timestamp(ctx),
    }))
}

fn store_data(provider: &str, data: &Map<String, Value>, ctx: &StepContext) -> Outcome {
    match provider {
        "mysql" | "postgresql" => Ok(json!({
            "provider": provider.to_uppercase(),
            "status": "stored",
            "table": text(data, "table"),
            "key": text(data, "key"),
            "rows_affected": 1,
            "stored_at": timestamp(ctx),
        })),
        "mongodb" => Ok(json!({
            "provider": "MongoDB",
            "status": "stored",
            "collection": text(data, "collection"),
            "document_id": reference_id("doc", ctx),
            "stored_at": timestamp(ctx),
        })),
        "redis" => Ok(json!({
            "provider": "Redis",
            "status": "cached",
            "key": text(data, "key"),
            "ttl": 3600,
            "stored_at": timestamp(ctx),
        })),
        other => Err(format!("Unsupported storage provider: {other}")),
    }
}

fn upload_file(provider: &str, data: &Map<String, Value>, ctx: &StepContext) -> Outcome {
    let filename = text(data, "filename").unwrap_or("document.txt");
    let folder = text(data, "folder").unwrap_or_default();
    let key = if folder.is_empty() {
        filename.to_string()
    } else {
        format!("{folder}/{filename}")
    };
    match provider {
        "aws_s3" => {
            let bucket = text(data, "bucket").unwrap_or("default-bucket");
            Ok(json!({
                "provider": "AWS S3",
                "status": "uploaded",
                "bucket": bucket,
                "key": key,
                "url": format!("https://{bucket}.s3.amazonaws.com/{key}"),
                "uploaded_at": timestamp(ctx),
            }))
        }
        "google_drive" => Ok(json!({
            "provider": "Google Drive",
            "status": "uploaded",
            "file_id": reference_id("drive", ctx),
            "filename": filename,
            "folder": folder,
            "uploaded_at": timestamp(ctx),
        })),
        other => Err(format!("Unsupported storage provider: {other}")),
    }
}

fn send_sms(provider: &str, data: &Map<String, Value>, ctx: &StepContext) -> Outcome {
    match provider {
        "twilio" => Ok(json!({
            "provider": "Twilio",
            "status": "sent",
            "message_id": reference_id("sms", ctx),
            "to": text(data, "to"),
            "from": text(data, "from"),
            "sent_at": timestamp(ctx),
        })),
        other => Err(format!("Unsupported SMS provider: {other}")),
    }
}

fn make_api_call(provider: &str, data: &Map<String, Value>, ctx: &StepContext) -> Outcome {
    Ok(json!({
        "provider": provider,
        "status": "completed",
        "method": text(data, "method").unwrap_or("GET"),
        "endpoint": text(data, "endpoint"),
        "response_status": 200,
        "called_at": timestamp(ctx),
    }))
}

/// execute_action: dispatch on `action_type` to a provider-specific simulation
pub struct ExecuteActionAction;

impl ExecuteActionAction {
    fn dispatch(
        action_type: &str,
        provider: &str,
        data: &Map<String, Value>,
        ctx: &StepContext,
    ) -> Outcome {
        match action_type {
            "send_email" => send_email(provider, data, ctx),
            "post_social" => post_social(provider, data, ctx),
            "store_data" => store_data(provider, data, ctx),
            "upload_file" => upload_file(provider, data, ctx),
            "send_sms" => send_sms(provider, data, ctx),
            "make_api_call" => make_api_call(provider, data, ctx),
            custom => Ok(json!({
                "action_type": custom,
                "provider": provider,
                "status": "completed",
                "data": data,
                "executed_at": timestamp(ctx),
            })),
        }
    }
}

#[async_trait]
impl Action for ExecuteActionAction {
    fn name(&self) -> &str {
        "execute_action"
    }

    fn description(&self) -> &str {
        "Execute real actions on integrated services"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description())
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "action_type": {"type": "string", "enum": ["send_email", "post_social", "store_data", "upload_file", "send_sms", "make_api_call"], "default": "send_email"},
                    "service_provider": {"type": "string", "description": "gmail|smtp|sendgrid, twitter|facebook|linkedin, mysql|postgresql|mongodb|redis, aws_s3|google_drive, twilio", "default": "gmail"},
                    "integration_id": {"type": "string"},
                    "action_data": {"type": "object", "description": "Action payload, e.g. to/subject/body for send_email"}
                },
                "required": ["action_type", "action_data"]
            }))
            .with_output_schema(json!({
                "type": "object",
                "properties": {
                    "status": {"type": "string"},
                    "result": {"type": "object"}
                }
            }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let action_type = input.str_or("action_type", "send_email");
        let provider = input.str_or("service_provider", "gmail");
        let empty = Map::new();
        let data = input.get_object("action_data").unwrap_or(&empty);
        let integration_id = input.get_str("integration_id");

        match Self::dispatch(action_type, provider, data, &ctx) {
            Ok(result) => {
                tracing::debug!(
                    execution_id = %ctx.execution_id,
                    action_type = %action_type,
                    provider = %provider,
                    "integration action simulated"
                );
                ActionResult::success(json!({
                    "action_type": action_type,
                    "service_provider": provider,
                    "integration_id": integration_id,
                    "status": "completed",
                    "result": result,
                    "executed_at": timestamp(&ctx),
                }))
                .with_metadata(json!({"action_type": action_type, "service_provider": provider}))
            }
            Err(message) => ActionResult::failure(message.clone()).with_data(json!({
                "action_type": action_type,
                "service_provider": provider,
                "status": "failed",
                "error_details": message,
            })),
        }
    }
}
