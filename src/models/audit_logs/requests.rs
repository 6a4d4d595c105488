use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "audit.ts")]
pub struct AuditLogListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub action: Option<String>,
    /// 仅超级管理员可用
    pub organization_id: Option<i64>,
}

// 审计日志查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct AuditLogListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub organization_id: Option<i64>,
    pub action: Option<String>,
}
