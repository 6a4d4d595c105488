use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 审计动作名称
pub mod actions {
    pub const ORGANIZATION_CREATE: &str = "organization.create";
    pub const ORGANIZATION_UPDATE: &str = "organization.update";
    pub const ORGANIZATION_DELETE: &str = "organization.delete";
    pub const ORGANIZATION_IMPORT: &str = "organization.import";
    pub const CREDITS_ADJUST: &str = "credits.adjust";
    pub const CREDITS_REFUND_FAILED: &str = "credits.refund_failed";
    pub const USER_CREATE: &str = "user.create";
    pub const USER_UPDATE: &str = "user.update";
    pub const USER_DELETE: &str = "user.delete";
    pub const STUDENT_IMPORT: &str = "student.import";
    pub const SUBMISSION_GRADE: &str = "submission.grade";
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "audit.ts")]
pub struct AuditLog {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<i64>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 新审计记录（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct NewAuditLog {
    pub actor_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<i64>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
}

impl NewAuditLog {
    pub fn new(action: &str, target_type: &str, target_id: Option<i64>) -> Self {
        Self {
            action: action.to_string(),
            target_type: target_type.to_string(),
            target_id,
            ..Default::default()
        }
    }

    pub fn actor(mut self, actor_id: i64, organization_id: Option<i64>) -> Self {
        self.actor_id = Some(actor_id);
        self.organization_id = organization_id;
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn ip(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }
}
