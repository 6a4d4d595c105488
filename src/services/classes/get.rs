use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassService;
use crate::models::ApiResponse;
use crate::services::access::load_class;
use crate::services::{ServiceResult, current_user, respond};

pub async fn get_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    respond(get(service, request, class_id).await)
}

async fn get(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    let class = load_class(&storage, &user, class_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        class,
        "Class information retrieved successfully",
    )))
}
