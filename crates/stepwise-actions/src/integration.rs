//! Integration bookkeeping handlers: credential collection, setup and management.
//!
//! Nothing here talks to a provider; the handlers describe what a provider
//! needs and report a simulated outcome.

use async_trait::async_trait;
use serde_json::{json, Value};
use stepwise_core::action::{Action, ActionInput, ActionMeta, ActionResult, StepContext};

use crate::support::{object_or_empty, reference_id, timestamp};

fn field(name: &str, kind: &str, label: &str) -> Value {
    json!({"name": name, "type": kind, "label": label, "required": true})
}

/// Form fields and auth flow for a (service, provider, credential type) triple
fn credential_config(service: &str, provider: &str, credential_type: &str) -> Value {
    match (service, provider, credential_type) {
        ("email", "gmail", "oauth") => json!({
            "fields": [
                field("client_id", "text", "Google Client ID"),
                field("client_secret", "password", "Google Client Secret"),
                field("redirect_uri", "text", "Redirect URI"),
            ],
            "auth_flow": "oauth2",
            "scopes": ["https://www.googleapis.com/auth/gmail.send"],
            "complexity": "medium",
            "estimated_time": "5-10 minutes",
        }),
        ("email", "gmail", "smtp") | ("email", "smtp", _) => json!({
            "fields": [
                field("smtp_host", "text", "SMTP Host"),
                field("smtp_port", "number", "SMTP Port"),
                field("username", "text", "Username"),
                field("password", "password", "Password"),
            ],
            "auth_flow": "basic",
            "complexity": "low",
            "estimated_time": "2-5 minutes",
        }),
        ("email", "sendgrid", _) => json!({
            "fields": [
                field("api_key", "password", "SendGrid API Key"),
                field("from_email", "email", "From Email"),
            ],
            "auth_flow": "api_key",
            "complexity": "low",
            "estimated_time": "1-2 minutes",
        }),
        ("social", "twitter", _) => json!({
            "fields": [
                field("api_key", "text", "Twitter API Key"),
                field("api_secret", "password", "Twitter API Secret"),
                field("access_token", "password", "Access Token"),
                field("access_token_secret", "password", "Access Token Secret"),
            ],
            "auth_flow": "oauth1",
            "complexity": "high",
            "estimated_time": "10-15 minutes",
        }),
        ("social", "facebook", _) => json!({
            "fields": [
                field("app_id", "text", "Facebook App ID"),
                field("app_secret", "password", "Facebook App Secret"),
                field("page_access_token", "password", "Page Access Token"),
            ],
            "auth_flow": "oauth2",
            "complexity": "high",
            "estimated_time": "10-20 minutes",
        }),
        ("storage", "aws_s3", _) => json!({
            "fields": [
                field("access_key_id", "text", "AWS Access Key ID"),
                field("secret_access_key", "password", "AWS Secret Access Key"),
                field("region", "select", "AWS Region"),
                field("bucket_name", "text", "S3 Bucket Name"),
            ],
            "auth_flow": "api_key",
            "complexity": "medium",
            "estimated_time": "5-10 minutes",
        }),
        ("database", "mysql", _) => json!({
            "fields": [
                field("host", "text", "Database Host"),
                field("port", "number", "Port"),
                field("username", "text", "Username"),
                field("password", "password", "Password"),
                field("database", "text", "Database Name"),
            ],
            "auth_flow": "basic",
            "complexity": "low",
            "estimated_time": "2-5 minutes",
        }),
        ("sms", "twilio", _) => json!({
            "fields": [
                field("account_sid", "text", "Twilio Account SID"),
                field("auth_token", "password", "Twilio Auth Token"),
                field("phone_number", "tel", "Twilio Phone Number"),
            ],
            "auth_flow": "api_key",
            "complexity": "low",
            "estimated_time": "2-5 minutes",
        }),
        _ => json!({
            "fields": [],
            "auth_flow": "unknown",
            "complexity": "unknown",
            "estimated_time": "unknown",
        }),
    }
}

fn setup_instructions(service: &str, provider: &str) -> Vec<&'static str> {
    match (service, provider) {
        ("email", "gmail") => vec![
            "Create or select a Google Cloud project",
            "Enable the Gmail API",
            "Create an OAuth 2.0 client ID",
            "Copy the client ID and client secret",
        ],
        ("email", "sendgrid") => vec![
            "Create a SendGrid API key with Mail Send permission",
            "Verify the sender address",
        ],
        ("social", "twitter") => vec![
            "Apply for a Twitter developer account",
            "Create an app and generate access tokens",
            "Grant the app read/write permission",
        ],
        _ => vec![
            "Visit the provider's developer documentation",
            "Generate the required API credentials",
            "Configure authentication settings",
        ],
    }
}

/// collect_credentials: describe the credentials a provider needs
pub struct CollectCredentialsAction;

#[async_trait]
impl Action for CollectCredentialsAction {
    fn name(&self) -> &str {
        "collect_credentials"
    }

    fn description(&self) -> &str {
        "Collect and manage credentials for service integrations"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description()).with_input_schema(json!({
            "type": "object",
            "properties": {
                "service_type": {"type": "string", "enum": ["email", "social", "storage", "database", "sms"], "default": "email"},
                "provider": {"type": "string", "description": "e.g. gmail, twitter, aws_s3, mysql", "default": "gmail"},
                "credential_type": {"type": "string", "enum": ["oauth", "smtp", "api_key", "access_key", "connection"], "default": "oauth"}
            }
        }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let service = input.str_or("service_type", "email");
        let provider = input.str_or("provider", "gmail");
        let credential_type = input.str_or("credential_type", "oauth");
        let config = credential_config(service, provider, credential_type);
        let metadata = json!({
            "requires_user_input": true,
            "setup_complexity": config["complexity"],
            "estimated_time": config["estimated_time"],
            "collected_at": timestamp(&ctx),
        });

        ActionResult::success(json!({
            "service_type": service,
            "provider": provider,
            "credential_type": credential_type,
            "config": config,
            "setup_instructions": setup_instructions(service, provider),
            "next_steps": [
                "Enter your credentials",
                "Test the connection",
                "Save the integration for future use",
            ],
        }))
        .with_metadata(metadata)
    }
}

fn setup_result(service: &str, provider: &str) -> Value {
    match (service, provider) {
        ("email", "gmail") => json!({
            "type": "OAuth2",
            "setup_url": "https://console.cloud.google.com/apis/credentials",
            "required_scopes": ["https://www.googleapis.com/auth/gmail.send"],
            "status": "ready_for_oauth",
        }),
        ("email", "smtp") => json!({
            "type": "SMTP",
            "required_fields": ["host", "port", "username", "password"],
            "status": "ready_for_credentials",
        }),
        ("email", "sendgrid") => json!({
            "type": "API",
            "required_fields": ["api_key"],
            "status": "ready_for_api_key",
        }),
        ("social_media" | "social", "twitter") => json!({
            "type": "OAuth 1.0a",
            "required_fields": ["api_key", "api_secret", "access_token", "access_token_secret"],
        }),
        ("social_media" | "social", "facebook" | "linkedin") => json!({
            "type": "OAuth 2.0",
            "required_fields": ["app_id", "app_secret", "access_token"],
        }),
        ("database", "mysql") => json!({
            "type": "SQL",
            "required_fields": ["host", "port", "username", "password", "database"],
            "default_port": 3306,
        }),
        ("database", "postgresql") => json!({
            "type": "SQL",
            "required_fields": ["host", "port", "username", "password", "database"],
            "default_port": 5432,
        }),
        ("database", "mongodb") => json!({
            "type": "NoSQL",
            "required_fields": ["connection_string"],
        }),
        ("storage", "aws_s3") => json!({
            "type": "Object Storage",
            "required_fields": ["access_key_id", "secret_access_key", "region", "bucket_name"],
        }),
        ("storage", "google_drive") => json!({
            "type": "Cloud Storage",
            "required_fields": ["client_id", "client_secret", "refresh_token"],
        }),
        ("api", "openai" | "stripe" | "twilio") => json!({
            "type": "REST API",
            "required_fields": ["api_key"],
        }),
        ("email" | "social_media" | "social" | "database" | "storage" | "api", _) => {
            json!({"status": "unsupported_provider"})
        }
        (other, _) => json!({
            "type": "generic",
            "service_type": other,
            "provider": provider,
            "status": "custom_integration",
        }),
    }
}

/// setup_integration: prepare a provider integration and hand out its id
pub struct SetupIntegrationAction;

#[async_trait]
impl Action for SetupIntegrationAction {
    fn name(&self) -> &str {
        "setup_integration"
    }

    fn description(&self) -> &str {
        "Setup and configure third-party service integrations"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description()).with_input_schema(json!({
            "type": "object",
            "properties": {
                "service_type": {"type": "string", "enum": ["email", "social_media", "database", "api", "storage"], "default": "email"},
                "provider": {"type": "string", "default": "gmail"},
                "config": {"type": "object"}
            }
        }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let service = input.str_or("service_type", "email");
        let provider = input.str_or("provider", "gmail");

        ActionResult::success(json!({
            "service_type": service,
            "provider": provider,
            "status": "configured",
            "integration_id": reference_id("int", &ctx),
            "setup_result": setup_result(service, provider),
            "config": object_or_empty(input.get_object("config")),
        }))
        .with_metadata(json!({"configured_at": timestamp(&ctx)}))
    }
}

fn capabilities(service: &str, provider: &str) -> Vec<&'static str> {
    match (service, provider) {
        ("email", "gmail") => vec!["send", "read", "attachments", "labels", "threads"],
        ("email", "smtp") => vec!["send", "attachments"],
        ("email", "sendgrid") => vec!["send", "templates", "tracking", "analytics"],
        ("social", "twitter") => vec!["post", "reply", "retweet", "media_upload"],
        ("social", "facebook") => vec!["post", "media_upload", "page_management"],
        ("storage", "aws_s3") => vec!["upload", "download", "delete", "list"],
        ("storage", "google_drive") => vec!["upload", "download", "share"],
        _ => vec!["basic_operations"],
    }
}

fn connection_tests(service: &str) -> Vec<&'static str> {
    match service {
        "email" => vec!["authentication", "send_capability", "rate_limits"],
        "social" => vec!["api_access", "post_permission", "user_profile"],
        "storage" => vec!["connection", "read_access", "write_access"],
        _ => vec!["basic_connection"],
    }
}

/// manage_integrations: create, test, list, update or delete an integration
pub struct ManageIntegrationsAction;

#[async_trait]
impl Action for ManageIntegrationsAction {
    fn name(&self) -> &str {
        "manage_integrations"
    }

    fn description(&self) -> &str {
        "Create, configure, and manage service integrations"
    }

    fn metadata(&self) -> ActionMeta {
        ActionMeta::new(self.name(), self.description()).with_input_schema(json!({
            "type": "object",
            "properties": {
                "action": {"type": "string", "enum": ["create", "test", "list", "update", "delete"], "default": "create"},
                "service_type": {"type": "string", "default": "email"},
                "provider": {"type": "string", "default": "gmail"},
                "integration_name": {"type": "string"},
                "integration_id": {"type": "string", "description": "Required for test, update and delete"},
                "config": {"type": "object"}
            }
        }))
    }

    async fn run(&self, input: ActionInput, ctx: StepContext) -> ActionResult {
        let action = input.str_or("action", "create");
        let service = input.str_or("service_type", "email");
        let provider = input.str_or("provider", "gmail");
        let at = timestamp(&ctx);

        let needs_id = matches!(action, "test" | "update" | "delete");
        let integration_id = match input.get_str("integration_id") {
            Some(id) => id.to_string(),
            None if needs_id => {
                return ActionResult::failure(format!("integration_id is required for {action}"))
                    .with_data(json!({
                        "action": action,
                        "provider": provider,
                        "status": "failed",
                    }));
            }
            None => reference_id(&format!("{service}_{provider}"), &ctx),
        };

        let data = match action {
            "create" => json!({
                "integration_id": integration_id,
                "provider": provider,
                "status": "active",
                "integration": {
                    "id": integration_id,
                    "name": input.get_str("integration_name")
                        .map(ToString::to_string)
                        .unwrap_or_else(|| format!("{provider} {service} integration")),
                    "service_type": service,
                    "created_at": at,
                    "config": object_or_empty(input.get_object("config")),
                    "capabilities": capabilities(service, provider),
                },
            }),
            "test" => {
                let tests: Vec<Value> = connection_tests(service)
                    .into_iter()
                    .map(|t| json!({"test": t, "status": "passed"}))
                    .collect();
                json!({
                    "integration_id": integration_id,
                    "provider": provider,
                    "status": "passed",
                    "tests_performed": tests,
                    "tested_at": at,
                })
            }
            "list" => json!({
                "provider": provider,
                "status": "listed",
                "integrations": [],
                "total_count": 0,
                "summary": format!("Found 0 integrations for {service}"),
            }),
            "update" => json!({
                "integration_id": integration_id,
                "provider": provider,
                "status": "updated",
                "updated_at": at,
                "changes_applied": input.get_object("config").map(|c| c.keys().cloned().collect::<Vec<_>>()).unwrap_or_default(),
            }),
            "delete" => json!({
                "integration_id": integration_id,
                "provider": provider,
                "status": "deleted",
                "deleted_at": at,
            }),
            other => {
                return ActionResult::failure(format!("Unknown action: {other}")).with_data(json!({
                    "action": other,
                    "service_type": service,
                    "provider": provider,
                    "status": "failed",
                }));
            }
        };

        ActionResult::success(data).with_metadata(json!({
            "action": action,
            "service_type": service,
            "timestamp": at,
        }))
    }
}
