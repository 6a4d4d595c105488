use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassService;
use crate::models::classes::requests::{ClassListQuery, ClassQueryParams};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn list_classes(
    service: &ClassService,
    request: &HttpRequest,
    query: ClassQueryParams,
) -> ActixResult<HttpResponse> {
    respond(list(service, request, query).await)
}

async fn list(
    service: &ClassService,
    request: &HttpRequest,
    query: ClassQueryParams,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    // 教师只能看到自己的班级，管理员限定在本组织
    let (organization_id, teacher_id) = match user.role() {
        UserRole::Superadmin => (None, query.teacher_id),
        UserRole::Teacher => (user.organization_id(), Some(user.id)),
        UserRole::Admin | UserRole::Director => {
            let organization_id = user.organization_id().ok_or_else(|| {
                Rejection::forbidden(ErrorCode::Forbidden, "You do not belong to an organization")
            })?;
            (Some(organization_id), query.teacher_id)
        }
        UserRole::InstitutionalManager => {
            return Err(Rejection::forbidden(
                ErrorCode::Forbidden,
                "You do not have permission to list classes",
            ));
        }
    };

    let response = storage
        .list_classes_with_pagination(ClassListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            organization_id,
            teacher_id,
            search: query.search,
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Class list retrieved successfully",
    )))
}
