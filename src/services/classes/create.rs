use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ClassService;
use crate::models::classes::requests::CreateClassRequest;
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn create_class(
    service: &ClassService,
    request: &HttpRequest,
    class_data: CreateClassRequest,
) -> ActixResult<HttpResponse> {
    respond(create(service, request, class_data).await)
}

async fn create(
    service: &ClassService,
    request: &HttpRequest,
    mut class_data: CreateClassRequest,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    class_data.name = class_data.name.trim().to_string();
    if class_data.name.is_empty() {
        return Err(Rejection::bad_request(
            ErrorCode::BadRequest,
            "Class name must not be empty",
        ));
    }

    // 教师为自己建班；管理员必须指定本组织的教师
    let (organization_id, teacher_id) = if *user.role() == UserRole::Teacher {
        let organization_id = user.organization_id().ok_or_else(|| {
            Rejection::forbidden(ErrorCode::Forbidden, "You do not belong to an organization")
        })?;
        (organization_id, user.id)
    } else {
        let teacher_id = class_data.teacher_id.ok_or_else(|| {
            Rejection::bad_request(ErrorCode::BadRequest, "teacher_id is required")
        })?;
        let teacher = storage
            .get_user_by_id(teacher_id)
            .await?
            .filter(|teacher| *teacher.role() == UserRole::Teacher)
            .ok_or_else(|| Rejection::not_found(ErrorCode::UserNotFound, "Teacher not found"))?;
        let organization_id = teacher
            .organization_id()
            .filter(|org| user.is_superadmin() || user.manages_organization(*org))
            .ok_or_else(|| {
                Rejection::forbidden(
                    ErrorCode::ClassPermissionDenied,
                    "The teacher does not belong to your organization",
                )
            })?;
        (organization_id, teacher.id)
    };

    let class = storage
        .create_class(organization_id, teacher_id, class_data)
        .await?;
    info!("Class {} created for teacher {}", class.id, teacher_id);

    Ok(HttpResponse::Created().json(ApiResponse::success(class, "Class created successfully")))
}
