use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{UserService, load_managed_user};
use crate::models::ApiResponse;
use crate::services::{ServiceResult, current_user, respond};

pub async fn get_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    respond(get(service, user_id, request).await)
}

async fn get(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ServiceResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;
    let user = load_managed_user(&storage, &actor, user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        user,
        "User information retrieved successfully",
    )))
}
