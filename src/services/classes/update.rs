use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassService;
use crate::models::classes::requests::UpdateClassRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::load_class;
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn update_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
    update_data: UpdateClassRequest,
) -> ActixResult<HttpResponse> {
    respond(update(service, request, class_id, update_data).await)
}

async fn update(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
    mut update_data: UpdateClassRequest,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    load_class(&storage, &user, class_id).await?;

    update_data.name = update_data.name.map(|name| name.trim().to_string());
    if update_data.name.as_deref().is_some_and(str::is_empty) {
        return Err(Rejection::bad_request(
            ErrorCode::BadRequest,
            "Class name must not be empty",
        ));
    }

    let class = storage
        .update_class(class_id, update_data)
        .await?
        .ok_or_else(|| Rejection::not_found(ErrorCode::ClassNotFound, "Class not found"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(class, "Class updated successfully")))
}
