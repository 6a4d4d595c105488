use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 班级查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
    pub teacher_id: Option<i64>,
}

// 创建班级请求
//
// # teacher_id 字段说明
// - **教师创建**：可选字段，不填写则自动使用当前登录教师的 ID
// - **管理员创建**：必填字段，且该用户必须是本组织的教师
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct CreateClassRequest {
    pub teacher_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
}

// 更新班级请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

// 班级列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct ClassListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub organization_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub search: Option<String>,
}
