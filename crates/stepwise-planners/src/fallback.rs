//! Deterministic fallback plans.
//!
//! Used when the reasoning backend is overloaded or unavailable. The request
//! is classified by an ordered keyword table and mapped to a fixed template;
//! a few fields are lifted out of the request text with regexes.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};
use stepwise_core::types::{Complexity, Plan, Step};

pub const DEFAULT_RECIPIENT: &str = "recipient@example.com";
pub const DEFAULT_SUBJECT: &str = "Automated message";
pub const DEFAULT_BODY: &str = "This is an automated message.";
pub const DEFAULT_SENDER: &str = "noreply@stepwise.local";
pub const DEFAULT_SOCIAL_CONTENT: &str = "Hello! This is an automated post.";
pub const DEFAULT_FILENAME: &str = "document.txt";
pub const DEFAULT_BUCKET: &str = "default-bucket";
pub const DEFAULT_TABLE: &str = "data";

/// Request category used to pick a fallback template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCategory {
    Email,
    Social,
    Storage,
    Database,
    Default,
}

/// Ordered keyword table, first match wins.
pub const CATEGORY_TABLE: &[(&[&str], FallbackCategory)] = &[
    (&["email", "send", "mail"], FallbackCategory::Email),
    (&["social", "post", "twitter", "facebook"], FallbackCategory::Social),
    (&["upload", "file", "storage", "s3"], FallbackCategory::Storage),
    (&["database", "store", "mysql", "data"], FallbackCategory::Database),
];

impl FallbackCategory {
    pub fn classify(request: &str) -> Self {
        let lower = request.to_lowercase();
        CATEGORY_TABLE
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(_, category)| *category)
            .unwrap_or(Self::Default)
    }
}

/// Build the fallback plan for `request`. Pure and deterministic.
pub fn fallback_plan(request: &str) -> Plan {
    match FallbackCategory::classify(request) {
        FallbackCategory::Email => email_plan(request),
        FallbackCategory::Social => social_plan(request),
        FallbackCategory::Storage => storage_plan(request),
        FallbackCategory::Database => database_plan(request),
        FallbackCategory::Default => default_plan(),
    }
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static fallback pattern"))
}

/// First capture of the first matching pattern
fn capture(text: &str, patterns: &[&Regex]) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn quoted_after(cell: &'static OnceLock<Regex>, keyword: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(&format!(r#"(?i){keyword}["\s]*["']([^"']+)["']"#))
            .expect("static fallback pattern")
    })
}

fn integration_plan(
    analyze: Value,
    credentials: Value,
    credentials_description: String,
    action: Value,
    action_description: String,
    output: Value,
    output_description: &str,
) -> Vec<Step> {
    vec![
        Step::new(1, "analyze_input", analyze_description(&analyze)).with_params(analyze),
        Step::new(2, "collect_credentials", credentials_description).with_params(credentials),
        Step::new(3, "execute_action", action_description).with_params(action),
        Step::new(4, "send_output", output_description).with_params(output),
    ]
}

fn analyze_description(params: &Value) -> String {
    match params.get("input_type").and_then(Value::as_str) {
        Some("email_request") => {
            "Analyze the email request and extract recipient, subject, and content".to_string()
        }
        Some("social_post") => "Analyze the social media post request".to_string(),
        Some("file_upload") => "Analyze the file upload request".to_string(),
        Some("database_operation") => "Analyze the database operation request".to_string(),
        _ => "Analyze the user's request".to_string(),
    }
}

/// Recipient, subject, body and sender of an email request
pub fn extract_email_data(request: &str) -> Map<String, Value> {
    static TO: OnceLock<Regex> = OnceLock::new();
    static SUBJECT: OnceLock<Regex> = OnceLock::new();
    static WITH_SUBJECT: OnceLock<Regex> = OnceLock::new();
    static MESSAGE: OnceLock<Regex> = OnceLock::new();
    static AND_MESSAGE: OnceLock<Regex> = OnceLock::new();

    let to = capture(
        request,
        &[regex(&TO, r"(?:to |send (?:to )?)([\w.-]+@[\w.-]+)")],
    );
    let subject = capture(
        request,
        &[
            quoted_after(&SUBJECT, "subject"),
            regex(&WITH_SUBJECT, r#"(?i)with subject\s+["']([^"']+)["']"#),
        ],
    );
    let body = capture(
        request,
        &[
            quoted_after(&MESSAGE, "message"),
            regex(&AND_MESSAGE, r#"(?i)and message\s+["']([^"']+)["']"#),
        ],
    );

    let mut data = Map::new();
    data.insert("to".into(), json!(to.unwrap_or_else(|| DEFAULT_RECIPIENT.to_string())));
    data.insert(
        "subject".into(),
        json!(subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string())),
    );
    data.insert("body".into(), json!(body.unwrap_or_else(|| DEFAULT_BODY.to_string())));
    data.insert("from".into(), json!(DEFAULT_SENDER));
    data
}

/// Post content and hashtags of a social request
pub fn extract_social_data(request: &str) -> Map<String, Value> {
    static POST: OnceLock<Regex> = OnceLock::new();
    static SAYING: OnceLock<Regex> = OnceLock::new();

    let content = capture(
        request,
        &[quoted_after(&POST, "post"), quoted_after(&SAYING, "saying")],
    );
    let mut data = Map::new();
    data.insert(
        "content".into(),
        json!(content.unwrap_or_else(|| DEFAULT_SOCIAL_CONTENT.to_string())),
    );
    data.insert("hashtags".into(), json!(["#automation", "#ai", "#stepwise"]));
    data
}

/// File name, bucket and folder of an upload request
pub fn extract_storage_data(request: &str) -> Map<String, Value> {
    static FILE: OnceLock<Regex> = OnceLock::new();
    static UPLOAD: OnceLock<Regex> = OnceLock::new();
    static BUCKET: OnceLock<Regex> = OnceLock::new();

    let filename = capture(
        request,
        &[quoted_after(&FILE, "file"), quoted_after(&UPLOAD, "upload")],
    );
    let bucket = capture(request, &[quoted_after(&BUCKET, "bucket")]);

    let mut data = Map::new();
    data.insert(
        "filename".into(),
        json!(filename.unwrap_or_else(|| DEFAULT_FILENAME.to_string())),
    );
    data.insert(
        "bucket".into(),
        json!(bucket.unwrap_or_else(|| DEFAULT_BUCKET.to_string())),
    );
    data.insert("folder".into(), json!("uploads"));
    data
}

/// Table, key and value of a database request
pub fn extract_database_data(request: &str) -> Map<String, Value> {
    static TABLE: OnceLock<Regex> = OnceLock::new();

    let table = capture(request, &[quoted_after(&TABLE, "table")]);
    let mut data = Map::new();
    data.insert(
        "table".into(),
        json!(table.unwrap_or_else(|| DEFAULT_TABLE.to_string())),
    );
    data.insert("key".into(), json!("automated_entry"));
    data.insert("value".into(), json!("Data inserted by automation"));
    data
}

fn email_plan(request: &str) -> Plan {
    let steps = integration_plan(
        json!({"input_type": "email_request", "analysis_depth": "detailed"}),
        json!({"service_type": "email", "provider": "gmail", "credential_type": "oauth"}),
        "Set up Gmail authentication and collect credentials".to_string(),
        json!({
            "action_type": "send_email",
            "service_provider": "gmail",
            "action_data": extract_email_data(request),
        }),
        "Send the email using the Gmail integration".to_string(),
        json!({"delivery_method": "direct", "format": "confirmation"}),
        "Confirm email delivery and report status",
    );
    Plan::new(steps)
        .with_estimated_time(45.0)
        .with_complexity(Complexity::Medium)
}

fn social_plan(request: &str) -> Plan {
    let lower = request.to_lowercase();
    let provider = if lower.contains("twitter") {
        "twitter"
    } else if lower.contains("facebook") {
        "facebook"
    } else {
        "twitter"
    };
    let steps = integration_plan(
        json!({"input_type": "social_post", "analysis_depth": "basic"}),
        json!({"service_type": "social", "provider": provider, "credential_type": "oauth"}),
        format!("Set up {provider} authentication"),
        json!({
            "action_type": "post_social",
            "service_provider": provider,
            "action_data": extract_social_data(request),
        }),
        format!("Post content to {provider}"),
        json!({"delivery_method": "direct"}),
        "Confirm the post was published",
    );
    Plan::new(steps)
        .with_estimated_time(30.0)
        .with_complexity(Complexity::Medium)
}

fn storage_plan(request: &str) -> Plan {
    let steps = integration_plan(
        json!({"input_type": "file_upload", "analysis_depth": "basic"}),
        json!({"service_type": "storage", "provider": "aws_s3", "credential_type": "access_key"}),
        "Set up AWS S3 authentication".to_string(),
        json!({
            "action_type": "upload_file",
            "service_provider": "aws_s3",
            "action_data": extract_storage_data(request),
        }),
        "Upload the file to the S3 bucket".to_string(),
        json!({"delivery_method": "direct"}),
        "Confirm the upload completed",
    );
    Plan::new(steps)
        .with_estimated_time(25.0)
        .with_complexity(Complexity::Low)
}

fn database_plan(request: &str) -> Plan {
    let steps = integration_plan(
        json!({"input_type": "database_operation", "analysis_depth": "detailed"}),
        json!({"service_type": "database", "provider": "mysql", "credential_type": "connection"}),
        "Set up database connection credentials".to_string(),
        json!({
            "action_type": "store_data",
            "service_provider": "mysql",
            "action_data": extract_database_data(request),
        }),
        "Store the data in MySQL".to_string(),
        json!({"delivery_method": "direct"}),
        "Confirm the data was stored",
    );
    Plan::new(steps)
        .with_estimated_time(35.0)
        .with_complexity(Complexity::Medium)
}

fn default_plan() -> Plan {
    Plan::new(vec![
        Step::new(1, "analyze_input", "Analyze the user's request")
            .with_params(json!({"input_type": "text", "analysis_depth": "basic"})),
        Step::new(2, "generate_content", "Generate helpful response content")
            .with_params(json!({"content_type": "response", "tone": "helpful"})),
        Step::new(3, "send_output", "Deliver the generated content")
            .with_params(json!({"delivery_method": "direct"})),
    ])
    .with_estimated_time(15.0)
    .with_complexity(Complexity::Low)
}
