use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ClassService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::load_class;
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn delete_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    respond(delete(service, request, class_id).await)
}

async fn delete(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    load_class(&storage, &user, class_id).await?;

    if !storage.delete_class(class_id).await? {
        return Err(Rejection::not_found(ErrorCode::ClassNotFound, "Class not found"));
    }
    info!("Class {} deleted by {}", class_id, user.id);

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Class deleted successfully")))
}
