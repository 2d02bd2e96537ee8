use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Plan;

/// A persisted plan together with the request that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub id: String,
    pub request: String,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRecord {
    pub fn new(request: impl Into<String>, plan: Plan) -> Self {
        let now = Utc::now();
        Self {
            id: format!("wf_{}", Uuid::new_v4().simple()),
            request: request.into(),
            plan,
            created_at: now,
            updated_at: now,
        }
    }
}
