use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct OrganizationDashboardParams {
    /// 仅超级管理员可指定，管理员始终查看本组织
    pub organization_id: Option<i64>,
}
