use super::entities::{UserRole, UserStatus};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 用户查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
    /// 仅超级管理员可用
    pub organization_id: Option<i64>,
}

// 用户创建请求
//
// password 为空时自动生成随机密码，并通过欢迎邮件发送
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: Option<String>,
    pub full_name: String,
    pub role: UserRole,
    /// 管理员创建时忽略，始终使用管理员所在组织
    pub organization_id: Option<i64>,
    pub monthly_credit_limit: Option<i64>,
}

// 用户更新请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UpdateUserRequest {
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub monthly_credit_limit: Option<i64>,
}

// 用户列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
    pub organization_id: Option<i64>,
}

// 新用户（用于存储层，同时写入 users 与 profiles）
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub organization_id: Option<i64>,
    pub monthly_credit_limit: i64,
}

// 用户更新（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub monthly_credit_limit: Option<i64>,
}
