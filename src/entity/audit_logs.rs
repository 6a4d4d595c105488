//! 审计日志实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub actor_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_audit_log(self) -> crate::models::audit_logs::entities::AuditLog {
        use crate::models::audit_logs::entities::AuditLog;

        AuditLog {
            id: self.id,
            actor_id: self.actor_id,
            organization_id: self.organization_id,
            action: self.action,
            target_type: self.target_type,
            target_id: self.target_id,
            details: self.details.and_then(|raw| serde_json::from_str(&raw).ok()),
            ip_address: self.ip_address,
            created_at: super::to_datetime(self.created_at),
        }
    }
}
