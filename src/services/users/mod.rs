pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::{Rejection, ServiceResult, storage_from_request};
use crate::models::ErrorCode;
use crate::models::users::entities::{User, UserRole};
use crate::models::users::requests::{CreateUserRequest, UpdateUserRequest, UserListParams};
use crate::storage::Storage;

pub struct UserService {
    storage: Option<Arc<dyn Storage>>,
}

impl UserService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub async fn list_users(
        &self,
        query: UserListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_users(self, query, request).await
    }

    pub async fn create_user(
        &self,
        user_data: CreateUserRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_user(self, user_data, request).await
    }

    pub async fn get_user(&self, user_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_user(self, user_id, request).await
    }

    pub async fn update_user(
        &self,
        user_id: i64,
        update_data: UpdateUserRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_user(self, user_id, update_data, request).await
    }

    pub async fn delete_user(&self, user_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        delete::delete_user(self, user_id, request).await
    }
}

/// 操作者可以分配的角色
///
/// 组织管理员只能创建本组织的教师与管理员
pub(crate) fn can_assign_role(actor: &User, role: &UserRole) -> bool {
    actor.is_superadmin()
        || (actor.role().is_org_manager()
            && matches!(role, UserRole::Teacher | UserRole::Admin | UserRole::Director))
}

/// 读取目标用户并校验管理范围
pub(crate) async fn load_managed_user(
    storage: &Arc<dyn Storage>,
    actor: &User,
    user_id: i64,
) -> ServiceResult<User> {
    let target = storage
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| Rejection::not_found(ErrorCode::UserNotFound, "User not found"))?;

    let in_scope = actor.is_superadmin()
        || target
            .organization_id()
            .is_some_and(|org| actor.manages_organization(org));
    if !in_scope {
        // 不暴露其他组织用户是否存在
        return Err(Rejection::not_found(ErrorCode::UserNotFound, "User not found"));
    }
    Ok(target)
}
