use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::models::users::requests::{UserListParams, UserListQuery};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn list_users(
    service: &UserService,
    query: UserListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    respond(list(service, query, request).await)
}

async fn list(
    service: &UserService,
    query: UserListParams,
    request: &HttpRequest,
) -> ServiceResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let organization_id = if actor.is_superadmin() {
        query.organization_id
    } else {
        Some(actor.organization_id().ok_or_else(|| {
            Rejection::forbidden(ErrorCode::Forbidden, "You do not belong to an organization")
        })?)
    };

    let response = storage
        .list_users_with_pagination(UserListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            role: query.role,
            status: query.status,
            search: query.search,
            organization_id,
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "User list retrieved successfully",
    )))
}
