use super::entities::User;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

// 创建用户响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct CreateUserResponse {
    pub user: User,
    /// 是否已发送欢迎邮件
    pub welcome_email_sent: bool,
}

// 用户列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserListResponse {
    pub items: Vec<User>,
    pub pagination: PaginationInfo,
}
