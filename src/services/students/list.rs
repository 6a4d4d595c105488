use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::models::ApiResponse;
use crate::models::students::requests::{StudentListParams, StudentListQuery};
use crate::services::access::load_class;
use crate::services::{ServiceResult, current_user, respond};

pub async fn list_students(
    service: &StudentService,
    request: &HttpRequest,
    class_id: i64,
    query: StudentListParams,
) -> ActixResult<HttpResponse> {
    respond(list(service, request, class_id, query).await)
}

async fn list(
    service: &StudentService,
    request: &HttpRequest,
    class_id: i64,
    query: StudentListParams,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    load_class(&storage, &user, class_id).await?;

    let response = storage
        .list_students_with_pagination(StudentListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            class_id,
            search: query.search,
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Student list retrieved successfully",
    )))
}
