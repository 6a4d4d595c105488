use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::ApiResponse;
use crate::models::submissions::requests::{SubmissionListParams, SubmissionListQuery};
use crate::services::access::load_exam;
use crate::services::{ServiceResult, current_user, respond};

pub async fn list_submissions(
    service: &SubmissionService,
    request: &HttpRequest,
    exam_id: i64,
    query: SubmissionListParams,
) -> ActixResult<HttpResponse> {
    respond(list(service, request, exam_id, query).await)
}

async fn list(
    service: &SubmissionService,
    request: &HttpRequest,
    exam_id: i64,
    query: SubmissionListParams,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    load_exam(&storage, &user, exam_id).await?;

    let response = storage
        .list_submissions_with_pagination(SubmissionListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            exam_id,
            status: query.status,
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Submission list retrieved successfully",
    )))
}
