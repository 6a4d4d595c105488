use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ExamService;
use crate::models::ApiResponse;
use crate::models::exams::requests::{ExamListParams, ExamListQuery};
use crate::services::access::load_class;
use crate::services::{ServiceResult, current_user, respond};

pub async fn list_exams(
    service: &ExamService,
    request: &HttpRequest,
    class_id: i64,
    query: ExamListParams,
) -> ActixResult<HttpResponse> {
    respond(list(service, request, class_id, query).await)
}

async fn list(
    service: &ExamService,
    request: &HttpRequest,
    class_id: i64,
    query: ExamListParams,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    load_class(&storage, &user, class_id).await?;

    let response = storage
        .list_exams_with_pagination(ExamListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            class_id,
            search: query.search,
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Exam list retrieved successfully",
    )))
}
